//! Request/response DTOs and JSON mapping.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use filehaven_auth::{Identity, LedgerEntry, UserAccount};
use filehaven_files::FileMetadata;

// ─────────────────────────────────────────────────────────────────────────────
// Auth
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub full_name: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: UserDto,
}

#[derive(Debug, Serialize)]
pub struct UserDto {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
}

impl From<&UserAccount> for UserDto {
    fn from(account: &UserAccount) -> Self {
        Self {
            id: *account.id.as_uuid(),
            full_name: account.display_name.clone(),
            email: account.email.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
}

#[derive(Debug, Serialize)]
pub struct IdentityDto {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub roles: Vec<String>,
    pub owned_files: Vec<Uuid>,
    /// file id → mask bits
    pub grants: HashMap<Uuid, u8>,
}

impl From<&Identity> for IdentityDto {
    fn from(identity: &Identity) -> Self {
        Self {
            id: *identity.user_id.as_uuid(),
            full_name: identity.display_name.clone(),
            email: identity.email.clone(),
            roles: identity.roles.iter().map(|r| r.as_str().to_string()).collect(),
            owned_files: identity.owned_files.iter().map(|f| *f.as_uuid()).collect(),
            grants: identity
                .grants
                .iter()
                .map(|(file, mask)| (*file.as_uuid(), mask.bits()))
                .collect(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Files
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    pub file_name: String,
}

#[derive(Debug, Serialize)]
pub struct FileDto {
    pub id: Uuid,
    pub file_name: String,
    pub content_type: String,
    pub size: i64,
    pub owner_id: Uuid,
    pub version: String,
    pub uploaded_at: DateTime<Utc>,
    pub custom_metadata: HashMap<String, String>,
}

impl From<&FileMetadata> for FileDto {
    fn from(meta: &FileMetadata) -> Self {
        Self {
            id: *meta.id.as_uuid(),
            file_name: meta.file_name.clone(),
            content_type: meta.content_type.clone(),
            size: meta.size,
            owner_id: *meta.owner_id.as_uuid(),
            version: meta.version.clone(),
            uploaded_at: meta.uploaded_at,
            custom_metadata: meta.custom_metadata.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateMetadataRequest {
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub search: String,
}

#[derive(Debug, Deserialize)]
pub struct AccessibleQuery {
    /// Capability name, e.g. "file.view".
    pub capability: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Permissions
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct GrantPermissionRequest {
    pub target_user_id: Uuid,
    /// Mask bits: 1=read, 2=write, 4=delete, 8=share, 15=full control.
    pub permission: u8,
}

#[derive(Debug, Deserialize)]
pub struct RevokePermissionRequest {
    pub target_user_id: Uuid,
    pub permission: u8,
}

#[derive(Debug, Serialize)]
pub struct LedgerEntryDto {
    pub user_id: Uuid,
    pub file_id: Uuid,
    pub permission: u8,
    pub created_at: DateTime<Utc>,
    pub modified_at: Option<DateTime<Utc>>,
}

impl From<&LedgerEntry> for LedgerEntryDto {
    fn from(entry: &LedgerEntry) -> Self {
        Self {
            user_id: *entry.user_id.as_uuid(),
            file_id: *entry.file_id.as_uuid(),
            permission: entry.mask.bits(),
            created_at: entry.created_at,
            modified_at: entry.modified_at,
        }
    }
}
