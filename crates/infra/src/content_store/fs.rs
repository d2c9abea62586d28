//! Filesystem content store. Blobs are stored flat, named by file id.

use std::path::PathBuf;

use async_trait::async_trait;

use filehaven_core::FileId;

use super::ContentStore;
use crate::error::StoreError;

pub struct FsContentStore {
    base: PathBuf,
}

impl FsContentStore {
    /// Creates the base directory if needed.
    pub async fn new(base: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let base = base.into();
        tokio::fs::create_dir_all(&base).await?;
        Ok(Self { base })
    }

    fn path_for(&self, file_id: FileId) -> PathBuf {
        self.base.join(file_id.to_string())
    }
}

#[async_trait]
impl ContentStore for FsContentStore {
    async fn put(&self, file_id: FileId, bytes: &[u8]) -> Result<(), StoreError> {
        tokio::fs::write(self.path_for(file_id), bytes).await?;
        Ok(())
    }

    async fn get(&self, file_id: FileId) -> Result<Option<Vec<u8>>, StoreError> {
        match tokio::fs::read(self.path_for(file_id)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, file_id: FileId) -> Result<(), StoreError> {
        match tokio::fs::remove_file(self.path_for(file_id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
