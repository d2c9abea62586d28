//! `filehaven-files` — file metadata domain model.

pub mod metadata;

pub use metadata::FileMetadata;
