//! In-memory file store.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use filehaven_auth::{FileIndex, LedgerError};
use filehaven_core::{FileId, UserId};
use filehaven_files::FileMetadata;

use super::FileStore;
use crate::error::StoreError;

#[derive(Default, Clone)]
pub struct InMemoryFileStore {
    files: Arc<Mutex<HashMap<FileId, FileMetadata>>>,
}

impl InMemoryFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn is_live(&self, file_id: FileId) -> bool {
        self.files
            .lock()
            .unwrap()
            .get(&file_id)
            .is_some_and(|f| !f.deleted)
    }

    pub(crate) fn owned_ids(&self, owner_id: UserId) -> Vec<FileId> {
        self.files
            .lock()
            .unwrap()
            .values()
            .filter(|f| f.owner_id == owner_id && !f.deleted)
            .map(|f| f.id)
            .collect()
    }
}

#[async_trait]
impl FileStore for InMemoryFileStore {
    async fn insert(&self, metadata: &FileMetadata) -> Result<(), StoreError> {
        self.files
            .lock()
            .unwrap()
            .insert(metadata.id, metadata.clone());
        Ok(())
    }

    async fn find_live(&self, file_id: FileId) -> Result<Option<FileMetadata>, StoreError> {
        Ok(self
            .files
            .lock()
            .unwrap()
            .get(&file_id)
            .filter(|f| !f.deleted)
            .cloned())
    }

    async fn mark_deleted(&self, file_id: FileId) -> Result<bool, StoreError> {
        let mut files = self.files.lock().unwrap();
        match files.get_mut(&file_id) {
            Some(meta) if !meta.deleted => {
                meta.deleted = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn update_custom_metadata(
        &self,
        file_id: FileId,
        entries: HashMap<String, String>,
    ) -> Result<Option<FileMetadata>, StoreError> {
        let mut files = self.files.lock().unwrap();
        match files.get_mut(&file_id) {
            Some(meta) if !meta.deleted => {
                meta.merge_metadata(entries);
                Ok(Some(meta.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn search(&self, term: &str) -> Result<Vec<FileMetadata>, StoreError> {
        Ok(self
            .files
            .lock()
            .unwrap()
            .values()
            .filter(|f| !f.deleted && f.name_matches(term))
            .cloned()
            .collect())
    }

    async fn owned_live_ids(&self, owner_id: UserId) -> Result<Vec<FileId>, StoreError> {
        Ok(self.owned_ids(owner_id))
    }
}

#[async_trait]
impl FileIndex for InMemoryFileStore {
    async fn retain_visible(&self, ids: Vec<FileId>) -> Result<Vec<FileId>, LedgerError> {
        Ok(ids.into_iter().filter(|id| self.is_live(*id)).collect())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn metadata(owner: UserId, name: &str) -> FileMetadata {
        FileMetadata::create(owner, name, "text/plain", 1, HashMap::new(), Utc::now()).unwrap()
    }

    #[tokio::test]
    async fn soft_delete_hides_the_record_without_removing_it() {
        let store = InMemoryFileStore::new();
        let meta = metadata(UserId::new(), "report.txt");
        store.insert(&meta).await.unwrap();

        assert!(store.mark_deleted(meta.id).await.unwrap());
        assert!(store.find_live(meta.id).await.unwrap().is_none());
        assert!(store.search("report").await.unwrap().is_empty());
        // Second delete reports nothing to do.
        assert!(!store.mark_deleted(meta.id).await.unwrap());
    }

    #[tokio::test]
    async fn update_custom_metadata_skips_deleted_files() {
        let store = InMemoryFileStore::new();
        let meta = metadata(UserId::new(), "report.txt");
        store.insert(&meta).await.unwrap();
        store.mark_deleted(meta.id).await.unwrap();

        let updated = store
            .update_custom_metadata(meta.id, HashMap::from([("k".into(), "v".into())]))
            .await
            .unwrap();
        assert!(updated.is_none());
    }

    #[tokio::test]
    async fn owned_ids_exclude_deleted_files() {
        let store = InMemoryFileStore::new();
        let owner = UserId::new();
        let keep = metadata(owner, "keep.txt");
        let drop = metadata(owner, "drop.txt");
        store.insert(&keep).await.unwrap();
        store.insert(&drop).await.unwrap();
        store.mark_deleted(drop.id).await.unwrap();

        assert_eq!(store.owned_live_ids(owner).await.unwrap(), vec![keep.id]);
    }
}
