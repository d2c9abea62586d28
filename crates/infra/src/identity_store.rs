//! Identity directory implementations.
//!
//! An [`Identity`] is a read projection over the user record plus its owned
//! files and ledger grants. It is rebuilt from the stores on every call —
//! there is deliberately no cache, so role or grant changes take effect on
//! the next request.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use filehaven_auth::{Identity, PermissionMask, Role};
use filehaven_auth::resolver::{DirectoryError, IdentityDirectory};
use filehaven_core::{FileId, UserId};

use crate::file_store::InMemoryFileStore;
use crate::ledger_store::InMemoryPermissionLedger;
use crate::user_store::InMemoryUserStore;

// ─────────────────────────────────────────────────────────────────────────────
// In-memory
// ─────────────────────────────────────────────────────────────────────────────

/// Composes the in-memory stores into one directory.
pub struct InMemoryIdentityDirectory {
    users: InMemoryUserStore,
    files: InMemoryFileStore,
    ledger: Arc<InMemoryPermissionLedger>,
}

impl InMemoryIdentityDirectory {
    pub fn new(
        users: InMemoryUserStore,
        files: InMemoryFileStore,
        ledger: Arc<InMemoryPermissionLedger>,
    ) -> Self {
        Self {
            users,
            files,
            ledger,
        }
    }
}

#[async_trait]
impl IdentityDirectory for InMemoryIdentityDirectory {
    async fn load(&self, user_id: UserId) -> Result<Option<Identity>, DirectoryError> {
        let Some(account) = self.users.get(user_id).filter(|a| a.active) else {
            return Ok(None);
        };

        Ok(Some(Identity {
            user_id: account.id,
            display_name: account.display_name,
            email: account.email,
            roles: account.roles,
            owned_files: self.files.owned_ids(user_id).into_iter().collect(),
            grants: self.ledger.grants_for_user(user_id),
        }))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Postgres
// ─────────────────────────────────────────────────────────────────────────────

/// Postgres-backed directory. Three reads per resolution (account, owned
/// files, grants); acceptable because resolution is once per request.
pub struct PostgresIdentityDirectory {
    pool: Arc<PgPool>,
}

impl PostgresIdentityDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

fn directory_error(e: sqlx::Error) -> DirectoryError {
    DirectoryError(e.to_string())
}

#[async_trait]
impl IdentityDirectory for PostgresIdentityDirectory {
    async fn load(&self, user_id: UserId) -> Result<Option<Identity>, DirectoryError> {
        let Some(user_row) = sqlx::query(
            "SELECT display_name, email, roles FROM users WHERE id = $1 AND active",
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(directory_error)?
        else {
            return Ok(None);
        };

        let roles: sqlx::types::Json<Vec<Role>> =
            user_row.try_get("roles").map_err(directory_error)?;

        let owned_rows = sqlx::query("SELECT id FROM files WHERE owner_id = $1 AND NOT deleted")
            .bind(user_id.as_uuid())
            .fetch_all(&*self.pool)
            .await
            .map_err(directory_error)?;

        let owned_files = owned_rows
            .iter()
            .map(|row| row.try_get("id").map(FileId::from_uuid))
            .collect::<Result<_, _>>()
            .map_err(directory_error)?;

        let grant_rows =
            sqlx::query("SELECT file_id, mask FROM file_permissions WHERE user_id = $1")
                .bind(user_id.as_uuid())
                .fetch_all(&*self.pool)
                .await
                .map_err(directory_error)?;

        let grants = grant_rows
            .iter()
            .filter_map(|row| {
                let file_id = row.try_get("file_id").map(FileId::from_uuid).ok()?;
                let bits: i16 = row.try_get("mask").ok()?;
                Some((file_id, PermissionMask::from_bits(bits as u8)?))
            })
            .collect();

        Ok(Some(Identity {
            user_id,
            display_name: user_row.try_get("display_name").map_err(directory_error)?,
            email: user_row.try_get("email").map_err(directory_error)?,
            roles: roles.0,
            owned_files,
            grants,
        }))
    }
}
