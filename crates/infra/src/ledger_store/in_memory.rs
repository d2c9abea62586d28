//! In-memory permission ledger.
//!
//! A single mutex around the entry map serializes every read-modify-write,
//! which satisfies the same per-row atomicity contract the Postgres
//! implementation provides with row locks.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;

use filehaven_auth::{FileIndex, LedgerEntry, LedgerError, PermissionLedger, PermissionMask};
use filehaven_core::{FileId, UserId};

pub struct InMemoryPermissionLedger {
    entries: Mutex<HashMap<(UserId, FileId), LedgerEntry>>,
    files: Arc<dyn FileIndex>,
}

impl InMemoryPermissionLedger {
    /// `files` supplies soft-delete visibility for `accessible_files`.
    pub fn new(files: Arc<dyn FileIndex>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            files,
        }
    }

    pub(crate) fn grants_for_user(&self, user_id: UserId) -> HashMap<FileId, PermissionMask> {
        self.entries
            .lock()
            .unwrap()
            .values()
            .filter(|e| e.user_id == user_id)
            .map(|e| (e.file_id, e.mask))
            .collect()
    }
}

#[async_trait]
impl PermissionLedger for InMemoryPermissionLedger {
    async fn check(
        &self,
        user_id: UserId,
        file_id: FileId,
        required: PermissionMask,
    ) -> Result<bool, LedgerError> {
        Ok(self
            .entries
            .lock()
            .unwrap()
            .get(&(user_id, file_id))
            .is_some_and(|e| e.mask.contains(required)))
    }

    async fn grant(
        &self,
        target: UserId,
        file_id: FileId,
        mask: PermissionMask,
    ) -> Result<LedgerEntry, LedgerError> {
        let mut entries = self.entries.lock().unwrap();
        let now = Utc::now();

        let entry = match entries.get(&(target, file_id)) {
            Some(existing) => LedgerEntry {
                mask: existing.mask.union(mask),
                modified_at: Some(now),
                ..existing.clone()
            },
            None => LedgerEntry {
                user_id: target,
                file_id,
                mask,
                created_at: now,
                modified_at: None,
            },
        };
        entries.insert((target, file_id), entry.clone());
        Ok(entry)
    }

    async fn revoke(
        &self,
        target: UserId,
        file_id: FileId,
        mask: PermissionMask,
    ) -> Result<bool, LedgerError> {
        let mut entries = self.entries.lock().unwrap();
        let Some(existing) = entries.get(&(target, file_id)) else {
            return Ok(false);
        };

        let remaining = existing.mask.without(mask);
        if remaining.is_empty() {
            entries.remove(&(target, file_id));
        } else {
            let updated = LedgerEntry {
                mask: remaining,
                modified_at: Some(Utc::now()),
                ..existing.clone()
            };
            entries.insert((target, file_id), updated);
        }
        Ok(true)
    }

    async fn entries_for(
        &self,
        user_id: UserId,
        file_id: FileId,
    ) -> Result<Vec<LedgerEntry>, LedgerError> {
        Ok(self
            .entries
            .lock()
            .unwrap()
            .get(&(user_id, file_id))
            .cloned()
            .into_iter()
            .collect())
    }

    async fn accessible_files(
        &self,
        user_id: UserId,
        required: PermissionMask,
    ) -> Result<Vec<FileId>, LedgerError> {
        let candidates: Vec<FileId> = self
            .entries
            .lock()
            .unwrap()
            .values()
            .filter(|e| e.user_id == user_id && e.mask.contains(required))
            .map(|e| e.file_id)
            .collect();
        self.files.retain_visible(candidates).await
    }
}
