//! Opaque content storage: put/get/delete bytes by file id.
//!
//! The byte store is an external collaborator as far as the authorization
//! core is concerned; nothing here consults permissions.

use async_trait::async_trait;

use filehaven_core::FileId;

use crate::error::StoreError;

mod fs;
mod in_memory;

pub use fs::FsContentStore;
pub use in_memory::InMemoryContentStore;

#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn put(&self, file_id: FileId, bytes: &[u8]) -> Result<(), StoreError>;

    async fn get(&self, file_id: FileId) -> Result<Option<Vec<u8>>, StoreError>;

    /// Removing absent content is not an error.
    async fn delete(&self, file_id: FileId) -> Result<(), StoreError>;
}
