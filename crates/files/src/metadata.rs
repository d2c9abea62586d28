//! File metadata entity.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use filehaven_core::{DomainError, Entity, FileId, UserId};

/// Metadata record for one stored file. The bytes themselves live in the
/// content store under the file id; this record is the unit the permission
/// ledger references.
///
/// # Invariants
/// - Owner attribution is the creator's id and never changes.
/// - Deletion is a soft flag: the record stays in the store but is excluded
///   from discovery and access checks. Nothing in this crate removes rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub id: FileId,
    pub file_name: String,
    pub content_type: String,
    pub size: i64,
    pub owner_id: UserId,
    pub version: String,
    pub uploaded_at: DateTime<Utc>,
    pub deleted: bool,
    pub custom_metadata: HashMap<String, String>,
}

impl FileMetadata {
    /// Validate upload input and build the record.
    ///
    /// The stored name is the final path component of whatever the client
    /// sent, so uploads cannot smuggle directory traversal into the name.
    pub fn create(
        owner_id: UserId,
        file_name: &str,
        content_type: &str,
        size: i64,
        custom_metadata: HashMap<String, String>,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let file_name = base_name(file_name);
        if file_name.is_empty() {
            return Err(DomainError::validation("file name cannot be empty"));
        }
        if size < 0 {
            return Err(DomainError::validation("file size cannot be negative"));
        }

        let content_type = if content_type.trim().is_empty() {
            "application/octet-stream".to_string()
        } else {
            content_type.trim().to_string()
        };

        Ok(Self {
            id: FileId::new(),
            file_name: file_name.to_string(),
            content_type,
            size,
            owner_id,
            version: "1.0".to_string(),
            uploaded_at: now,
            deleted: false,
            custom_metadata,
        })
    }

    /// Flip the soft-delete flag. Deleting twice is an invariant violation;
    /// callers treat an already-deleted file as not found.
    pub fn soft_delete(&mut self) -> Result<(), DomainError> {
        if self.deleted {
            return Err(DomainError::invariant("file already deleted"));
        }
        self.deleted = true;
        Ok(())
    }

    /// Merge custom metadata entries; existing keys are overwritten.
    pub fn merge_metadata(&mut self, entries: HashMap<String, String>) {
        self.custom_metadata.extend(entries);
    }

    /// Case-insensitive name match used by search.
    pub fn name_matches(&self, term: &str) -> bool {
        self.file_name.to_lowercase().contains(&term.to_lowercase())
    }
}

impl Entity for FileMetadata {
    type Id = FileId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Final path component, tolerating both separator styles.
fn base_name(name: &str) -> &str {
    name.trim()
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim()
}
