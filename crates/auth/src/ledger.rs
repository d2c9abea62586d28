//! The permission ledger port: durable (user, file) → mask state.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use filehaven_core::{FileId, UserId};

use crate::mask::PermissionMask;

/// One persisted grant. Composite-unique on (user, file); a zero mask is
/// never stored — the entry is deleted instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerEntry {
    pub user_id: UserId,
    pub file_id: FileId,
    pub mask: PermissionMask,
    pub created_at: DateTime<Utc>,
    pub modified_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Error)]
pub enum LedgerError {
    /// The backing store failed (connection, query, IO).
    #[error("permission store failure: {0}")]
    Store(String),

    /// Concurrent updates to the same (user, file) row could not be
    /// serialized within the retry budget. Distinct from a denial.
    #[error("concurrent permission update, retries exhausted")]
    Conflict,
}

/// Storage contract for explicit per-file grants.
///
/// `grant`/`revoke` are read-modify-write on mask bits and MUST serialize
/// per (user, file) row: an implementation may take a row lock or loop on
/// compare-and-swap, but "last writer wins on the full row" loses bits and
/// is not acceptable. Transient serialization conflicts are retried
/// internally and surface as [`LedgerError::Conflict`] only when exhausted.
///
/// Precondition checks (who may grant or revoke) are not part of this port;
/// they live in [`crate::engine::AuthorizationEngine`] so both enforcement
/// adapters share one decision artifact.
#[async_trait]
pub trait PermissionLedger: Send + Sync {
    /// True iff an entry exists whose mask is a superset of every requested
    /// bit.
    async fn check(
        &self,
        user_id: UserId,
        file_id: FileId,
        required: PermissionMask,
    ) -> Result<bool, LedgerError>;

    /// OR the mask into the target's entry, creating it if absent. Returns
    /// the entry as stored.
    async fn grant(
        &self,
        target: UserId,
        file_id: FileId,
        mask: PermissionMask,
    ) -> Result<LedgerEntry, LedgerError>;

    /// AND-NOT the mask out of the target's entry; delete the entry when it
    /// reaches zero. Returns false when no entry existed.
    async fn revoke(
        &self,
        target: UserId,
        file_id: FileId,
        mask: PermissionMask,
    ) -> Result<bool, LedgerError>;

    /// All entries for (user, file). No ordering guarantee.
    async fn entries_for(
        &self,
        user_id: UserId,
        file_id: FileId,
    ) -> Result<Vec<LedgerEntry>, LedgerError>;

    /// Ids of files for which the user's entry satisfies the superset rule,
    /// excluding soft-deleted files.
    async fn accessible_files(
        &self,
        user_id: UserId,
        required: PermissionMask,
    ) -> Result<Vec<FileId>, LedgerError>;
}

/// Read-side view of file liveness, used by the engine to defensively
/// re-filter soft-deleted files out of listings.
#[async_trait]
pub trait FileIndex: Send + Sync {
    /// Retain only ids that exist and are not soft-deleted.
    async fn retain_visible(&self, ids: Vec<FileId>) -> Result<Vec<FileId>, LedgerError>;
}
