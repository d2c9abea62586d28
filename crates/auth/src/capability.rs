use core::str::FromStr;

use serde::{Deserialize, Serialize};

use filehaven_core::DomainError;

use crate::mask::PermissionMask;

/// A named permitted operation, with a fixed mapping to ledger mask bits.
///
/// Both enforcement adapters (the per-route guard and the request
/// interceptor) translate their local context into one of these values, so
/// the name→bit table below is the single place the mapping lives.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    /// Read a file's metadata (serialized as `"file.view"`).
    #[serde(rename = "file.view")]
    View,

    /// Read a file's content (serialized as `"file.download"`).
    #[serde(rename = "file.download")]
    Download,

    /// Create a new file (serialized as `"file.upload"`). Carries no mask
    /// bits: creation requires no pre-existing grant.
    #[serde(rename = "file.upload")]
    Upload,

    /// Modify a file (serialized as `"file.update"`).
    #[serde(rename = "file.update")]
    Update,

    /// Soft-delete a file (serialized as `"file.delete"`).
    #[serde(rename = "file.delete")]
    Delete,

    /// Grant or revoke access to a file (serialized as `"file.share"`).
    #[serde(rename = "file.share")]
    Share,
}

impl Capability {
    /// Stable lowercase dotted name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Capability::View => "file.view",
            Capability::Download => "file.download",
            Capability::Upload => "file.upload",
            Capability::Update => "file.update",
            Capability::Delete => "file.delete",
            Capability::Share => "file.share",
        }
    }

    /// The capability→bit table. `Upload` is the one resource-less
    /// capability and maps to no bits.
    pub const fn mask(self) -> Option<PermissionMask> {
        match self {
            Capability::View | Capability::Download => Some(PermissionMask::READ),
            Capability::Update => Some(PermissionMask::WRITE),
            Capability::Delete => Some(PermissionMask::DELETE),
            Capability::Share => Some(PermissionMask::SHARE),
            Capability::Upload => None,
        }
    }

    /// Whether the capability name is scoped to file operations. The
    /// file-manager blanket rule keys off this prefix.
    pub fn is_file_scoped(self) -> bool {
        self.as_str().starts_with("file.")
    }
}

impl core::fmt::Display for Capability {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Capability {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "file.view" => Ok(Capability::View),
            "file.download" => Ok(Capability::Download),
            "file.upload" => Ok(Capability::Upload),
            "file.update" => Ok(Capability::Update),
            "file.delete" => Ok(Capability::Delete),
            "file.share" => Ok(Capability::Share),
            other => Err(DomainError::validation(format!(
                "unknown capability '{other}'"
            ))),
        }
    }
}
