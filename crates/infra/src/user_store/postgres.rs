//! Postgres-backed user store.
//!
//! Expected table:
//!
//! ```sql
//! CREATE TABLE users (
//!     id            UUID PRIMARY KEY,
//!     email         TEXT NOT NULL,
//!     display_name  TEXT NOT NULL,
//!     password_hash TEXT NOT NULL,
//!     active        BOOLEAN NOT NULL DEFAULT TRUE,
//!     roles         JSONB NOT NULL,
//!     created_at    TIMESTAMPTZ NOT NULL,
//!     last_login_at TIMESTAMPTZ
//! );
//! CREATE UNIQUE INDEX users_email_ci ON users (lower(email));
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};

use filehaven_auth::{Role, UserAccount};
use filehaven_core::UserId;

use super::UserStore;
use crate::error::StoreError;

pub struct PostgresUserStore {
    pool: Arc<PgPool>,
}

impl PostgresUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

fn account_from_row(row: &PgRow) -> Result<UserAccount, sqlx::Error> {
    let roles: sqlx::types::Json<Vec<Role>> = row.try_get("roles")?;
    Ok(UserAccount {
        id: UserId::from_uuid(row.try_get("id")?),
        email: row.try_get("email")?,
        display_name: row.try_get("display_name")?,
        password_hash: row.try_get("password_hash")?,
        active: row.try_get("active")?,
        roles: roles.0,
        created_at: row.try_get("created_at")?,
        last_login_at: row.try_get("last_login_at")?,
    })
}

const SELECT_COLUMNS: &str =
    "id, email, display_name, password_hash, active, roles, created_at, last_login_at";

#[async_trait]
impl UserStore for PostgresUserStore {
    async fn insert(&self, account: &UserAccount) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO users
                (id, email, display_name, password_hash, active, roles, created_at, last_login_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(account.id.as_uuid())
        .bind(&account.email)
        .bind(&account.display_name)
        .bind(&account.password_hash)
        .bind(account.active)
        .bind(sqlx::types::Json(&account.roles))
        .bind(account.created_at)
        .bind(account.last_login_at)
        .execute(&*self.pool)
        .await?;
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserAccount>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM users WHERE lower(email) = lower($1)"
        ))
        .bind(email.trim())
        .fetch_optional(&*self.pool)
        .await?;

        row.as_ref()
            .map(account_from_row)
            .transpose()
            .map_err(StoreError::from)
    }

    async fn find_active(&self, user_id: UserId) -> Result<Option<UserAccount>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM users WHERE id = $1 AND active"
        ))
        .bind(user_id.as_uuid())
        .fetch_optional(&*self.pool)
        .await?;

        row.as_ref()
            .map(account_from_row)
            .transpose()
            .map_err(StoreError::from)
    }

    async fn record_login(&self, user_id: UserId, at: DateTime<Utc>) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE users SET last_login_at = $2 WHERE id = $1")
            .bind(user_id.as_uuid())
            .bind(at)
            .execute(&*self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
