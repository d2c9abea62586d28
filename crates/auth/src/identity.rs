use std::collections::{HashMap, HashSet};

use serde::Serialize;

use filehaven_core::{FileId, UserId};

use crate::{mask::PermissionMask, role::Role};

/// A fully resolved caller for authorization decisions.
///
/// This is an immutable per-request view: a read projection over the user
/// record, its owned files, and its ledger grants, rebuilt on every token
/// resolution so stale-privilege windows cannot open. It is never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub user_id: UserId,
    pub display_name: String,
    pub email: String,
    pub roles: Vec<Role>,

    /// Files this user created. Ownership is implicit full control and is
    /// checked wherever the ledger is checked.
    pub owned_files: HashSet<FileId>,

    /// Current explicit ledger grants, keyed by file.
    pub grants: HashMap<FileId, PermissionMask>,
}

impl Identity {
    pub fn owns(&self, file_id: FileId) -> bool {
        self.owned_files.contains(&file_id)
    }

    pub fn has_role(&self, role: &Role) -> bool {
        self.roles.contains(role)
    }
}
