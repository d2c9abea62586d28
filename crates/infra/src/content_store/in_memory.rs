//! In-memory content store.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use filehaven_core::FileId;

use super::ContentStore;
use crate::error::StoreError;

#[derive(Default)]
pub struct InMemoryContentStore {
    blobs: Mutex<HashMap<FileId, Vec<u8>>>,
}

impl InMemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ContentStore for InMemoryContentStore {
    async fn put(&self, file_id: FileId, bytes: &[u8]) -> Result<(), StoreError> {
        self.blobs.lock().unwrap().insert(file_id, bytes.to_vec());
        Ok(())
    }

    async fn get(&self, file_id: FileId) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.blobs.lock().unwrap().get(&file_id).cloned())
    }

    async fn delete(&self, file_id: FileId) -> Result<(), StoreError> {
        self.blobs.lock().unwrap().remove(&file_id);
        Ok(())
    }
}
