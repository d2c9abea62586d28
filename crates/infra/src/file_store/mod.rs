//! File metadata storage.

use std::collections::HashMap;

use async_trait::async_trait;

use filehaven_core::{FileId, UserId};
use filehaven_files::FileMetadata;

use crate::error::StoreError;

mod in_memory;
mod postgres;

pub use in_memory::InMemoryFileStore;
pub use postgres::PostgresFileStore;

/// Storage contract for file metadata records.
///
/// "live" means not soft-deleted. Rows are never physically removed here;
/// deletion flips the flag and discovery queries exclude flagged rows.
#[async_trait]
pub trait FileStore: Send + Sync {
    async fn insert(&self, metadata: &FileMetadata) -> Result<(), StoreError>;

    async fn find_live(&self, file_id: FileId) -> Result<Option<FileMetadata>, StoreError>;

    /// Soft-delete. Returns false when the file is missing or already
    /// deleted.
    async fn mark_deleted(&self, file_id: FileId) -> Result<bool, StoreError>;

    /// Merge custom metadata into a live record, returning the updated
    /// record. `None` when the file is missing or deleted.
    async fn update_custom_metadata(
        &self,
        file_id: FileId,
        entries: HashMap<String, String>,
    ) -> Result<Option<FileMetadata>, StoreError>;

    /// Case-insensitive name search over live records.
    async fn search(&self, term: &str) -> Result<Vec<FileMetadata>, StoreError>;

    /// Ids of live files owned by the user.
    async fn owned_live_ids(&self, owner_id: UserId) -> Result<Vec<FileId>, StoreError>;
}
