//! The authorization engine: one decision function for every enforcement
//! point.

use std::sync::Arc;

use filehaven_core::{FileId, UserId};

use crate::{
    capability::Capability,
    identity::Identity,
    ledger::{FileIndex, LedgerEntry, LedgerError, PermissionLedger},
    mask::PermissionMask,
    role::{Blanket, blanket_access},
};

/// Why a request was authorized. Emitted on the decision trace so denials
/// and grants can be audited without re-deriving the precedence.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AccessBasis {
    /// A role granted blanket access, bypassing the ledger.
    RoleBlanket,
    /// Resource-less creation: any authenticated identity may upload.
    Creation,
    /// The identity owns the file (implicit full control).
    Ownership,
    /// An explicit ledger entry covers every requested bit.
    Grant,
}

/// Composes the role authority, ownership data, and the permission ledger
/// into a single yes/no decision. Both enforcement adapters call into this
/// type, so their verdicts cannot diverge.
///
/// Decision precedence, first applicable wins:
/// 1. role blanket (abstain falls through, it is not a deny)
/// 2. resource-less requests: only the upload capability is allowed
/// 3. ownership of the file
/// 4. ledger superset check with the fixed capability→bit table
/// 5. default deny
pub struct AuthorizationEngine {
    ledger: Arc<dyn PermissionLedger>,
    files: Arc<dyn FileIndex>,
}

impl AuthorizationEngine {
    pub fn new(ledger: Arc<dyn PermissionLedger>, files: Arc<dyn FileIndex>) -> Self {
        Self { ledger, files }
    }

    /// `authorize(identity, capability, file?) -> bool`.
    pub async fn authorize(
        &self,
        identity: &Identity,
        capability: Capability,
        file_id: Option<FileId>,
    ) -> Result<bool, LedgerError> {
        let basis = self.decide(identity, capability, file_id).await?;
        match basis {
            Some(basis) => tracing::debug!(
                user_id = %identity.user_id,
                capability = %capability,
                file_id = ?file_id,
                basis = ?basis,
                "authorized"
            ),
            None => tracing::debug!(
                event = "security",
                user_id = %identity.user_id,
                capability = %capability,
                file_id = ?file_id,
                "denied"
            ),
        }
        Ok(basis.is_some())
    }

    async fn decide(
        &self,
        identity: &Identity,
        capability: Capability,
        file_id: Option<FileId>,
    ) -> Result<Option<AccessBasis>, LedgerError> {
        if blanket_access(&identity.roles, capability) == Blanket::Granted {
            return Ok(Some(AccessBasis::RoleBlanket));
        }

        let Some(file_id) = file_id else {
            // Creating a new file needs no pre-existing grant; every other
            // capability is meaningless without a resource.
            return Ok((capability == Capability::Upload).then_some(AccessBasis::Creation));
        };

        if identity.owns(file_id) {
            return Ok(Some(AccessBasis::Ownership));
        }

        let Some(required) = capability.mask() else {
            return Ok(None);
        };

        let granted = self
            .ledger
            .check(identity.user_id, file_id, required)
            .await?;
        Ok(granted.then_some(AccessBasis::Grant))
    }

    /// Which files the identity holds at least the capability's bits on.
    /// The ledger already excludes soft-deleted files; the result is run
    /// through the file index again so a lagging ledger implementation
    /// cannot resurface deleted files.
    pub async fn list_accessible(
        &self,
        identity: &Identity,
        capability: Capability,
    ) -> Result<Vec<FileId>, LedgerError> {
        let Some(required) = capability.mask() else {
            return Ok(Vec::new());
        };
        let ids = self
            .ledger
            .accessible_files(identity.user_id, required)
            .await?;
        self.files.retain_visible(ids).await
    }

    /// Effective full control over a file: role blanket, ownership, or a
    /// ledger entry holding all four bits. This is the precondition for
    /// grant/revoke.
    pub async fn has_full_control(
        &self,
        identity: &Identity,
        file_id: FileId,
    ) -> Result<bool, LedgerError> {
        if blanket_access(&identity.roles, Capability::Share) == Blanket::Granted {
            return Ok(true);
        }
        if identity.owns(file_id) {
            return Ok(true);
        }
        self.ledger
            .check(identity.user_id, file_id, PermissionMask::FULL_CONTROL)
            .await
    }

    /// Grant mask bits to `target`. Returns false (no mutation) unless the
    /// acting identity has full control over the file.
    pub async fn grant(
        &self,
        acting: &Identity,
        target: UserId,
        file_id: FileId,
        mask: PermissionMask,
    ) -> Result<bool, LedgerError> {
        if !self.has_full_control(acting, file_id).await? {
            tracing::debug!(
                event = "security",
                acting = %acting.user_id,
                target = %target,
                file_id = %file_id,
                "grant refused: acting user lacks full control"
            );
            return Ok(false);
        }

        let entry = self.ledger.grant(target, file_id, mask).await?;
        tracing::info!(
            acting = %acting.user_id,
            target = %target,
            file_id = %file_id,
            mask = %entry.mask,
            "permission granted"
        );
        Ok(true)
    }

    /// Revoke mask bits from `target`. Same precondition as `grant`;
    /// returns false when there was nothing to revoke.
    pub async fn revoke(
        &self,
        acting: &Identity,
        target: UserId,
        file_id: FileId,
        mask: PermissionMask,
    ) -> Result<bool, LedgerError> {
        if !self.has_full_control(acting, file_id).await? {
            tracing::debug!(
                event = "security",
                acting = %acting.user_id,
                target = %target,
                file_id = %file_id,
                "revoke refused: acting user lacks full control"
            );
            return Ok(false);
        }

        let revoked = self.ledger.revoke(target, file_id, mask).await?;
        if revoked {
            tracing::info!(
                acting = %acting.user_id,
                target = %target,
                file_id = %file_id,
                mask = %mask,
                "permission revoked"
            );
        }
        Ok(revoked)
    }

    /// Read-only view of a user's entries for one file.
    pub async fn entries_for(
        &self,
        user_id: UserId,
        file_id: FileId,
    ) -> Result<Vec<LedgerEntry>, LedgerError> {
        self.ledger.entries_for(user_id, file_id).await
    }
}
