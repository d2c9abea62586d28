use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::capability::Capability;

/// Role identifier used for RBAC.
///
/// Roles are opaque strings at this layer; the well-known ones below are the
/// only roles the blanket rules recognize.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    /// Blanket access to everything.
    pub const ADMINISTRATOR: Role = Role(Cow::Borrowed("administrator"));

    /// Blanket access to file-scoped capabilities only.
    pub const FILE_MANAGER: Role = Role(Cow::Borrowed("file-manager"));

    /// Base role every account starts with.
    pub const USER: Role = Role(Cow::Borrowed("user"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of the role-based blanket check.
///
/// `Abstain` means "no automatic grant" — the caller continues with
/// ownership and ledger checks. It is never an explicit deny.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Blanket {
    Granted,
    Abstain,
}

/// Evaluate the blanket rules in order; first match wins.
///
/// 1. `administrator` — granted, for every capability.
/// 2. `file-manager` — granted for file-scoped capability names only.
/// 3. Anything else — abstain.
pub fn blanket_access(roles: &[Role], capability: Capability) -> Blanket {
    if roles.contains(&Role::ADMINISTRATOR) {
        return Blanket::Granted;
    }
    if roles.contains(&Role::FILE_MANAGER) && capability.is_file_scoped() {
        return Blanket::Granted;
    }
    Blanket::Abstain
}
