//! Postgres-backed permission ledger.
//!
//! Expected table:
//!
//! ```sql
//! CREATE TABLE file_permissions (
//!     user_id     UUID NOT NULL REFERENCES users (id),
//!     file_id     UUID NOT NULL REFERENCES files (id),
//!     mask        SMALLINT NOT NULL CHECK (mask BETWEEN 1 AND 15),
//!     created_at  TIMESTAMPTZ NOT NULL,
//!     modified_at TIMESTAMPTZ,
//!     PRIMARY KEY (user_id, file_id)
//! );
//! ```
//!
//! ## Concurrency
//!
//! Grant/revoke are read-modify-write on mask bits, so "load then save"
//! would lose bits under concurrency. Each mutation runs in a transaction
//! that takes a row lock (`SELECT … FOR UPDATE`) before computing the new
//! mask; concurrent inserts of the same (user, file) pair collide on the
//! primary key instead of both succeeding.
//!
//! ## Error mapping
//!
//! | PostgreSQL error code | Meaning | Handling |
//! |-----------------------|---------|----------|
//! | `23505` | Duplicate key: another transaction inserted the row first | retry (the row now exists, the OR path applies) |
//! | `40001` | Serialization failure | retry |
//! | `40P01` | Deadlock detected | retry |
//! | other   | Infrastructure failure | surface as `LedgerError::Store` |
//!
//! Retries are internal and bounded; exhaustion surfaces as
//! [`LedgerError::Conflict`], which is distinct from an authorization
//! denial.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Postgres, Row, Transaction};

use filehaven_auth::{LedgerEntry, LedgerError, PermissionLedger, PermissionMask};
use filehaven_core::{FileId, UserId};

pub struct PostgresPermissionLedger {
    pool: Arc<PgPool>,
}

const MAX_RETRIES: u32 = 3;

impl PostgresPermissionLedger {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    async fn lock_mask(
        tx: &mut Transaction<'_, Postgres>,
        user_id: UserId,
        file_id: FileId,
    ) -> Result<Option<PermissionMask>, sqlx::Error> {
        let row = sqlx::query(
            "SELECT mask FROM file_permissions WHERE user_id = $1 AND file_id = $2 FOR UPDATE",
        )
        .bind(user_id.as_uuid())
        .bind(file_id.as_uuid())
        .fetch_optional(&mut **tx)
        .await?;

        Ok(row.and_then(|row| {
            let bits: i16 = row.try_get("mask").ok()?;
            PermissionMask::from_bits(bits as u8)
        }))
    }

    async fn try_grant(
        &self,
        target: UserId,
        file_id: FileId,
        mask: PermissionMask,
    ) -> Result<LedgerEntry, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        let entry = match Self::lock_mask(&mut tx, target, file_id).await? {
            Some(existing) => {
                let merged = existing.union(mask);
                let row = sqlx::query(
                    r#"
                    UPDATE file_permissions
                    SET mask = $3, modified_at = $4
                    WHERE user_id = $1 AND file_id = $2
                    RETURNING created_at
                    "#,
                )
                .bind(target.as_uuid())
                .bind(file_id.as_uuid())
                .bind(merged.bits() as i16)
                .bind(now)
                .fetch_one(&mut *tx)
                .await?;

                LedgerEntry {
                    user_id: target,
                    file_id,
                    mask: merged,
                    created_at: row.try_get("created_at")?,
                    modified_at: Some(now),
                }
            }
            None => {
                sqlx::query(
                    r#"
                    INSERT INTO file_permissions (user_id, file_id, mask, created_at)
                    VALUES ($1, $2, $3, $4)
                    "#,
                )
                .bind(target.as_uuid())
                .bind(file_id.as_uuid())
                .bind(mask.bits() as i16)
                .bind(now)
                .execute(&mut *tx)
                .await?;

                LedgerEntry {
                    user_id: target,
                    file_id,
                    mask,
                    created_at: now,
                    modified_at: None,
                }
            }
        };

        tx.commit().await?;
        Ok(entry)
    }

    async fn try_revoke(
        &self,
        target: UserId,
        file_id: FileId,
        mask: PermissionMask,
    ) -> Result<bool, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let Some(existing) = Self::lock_mask(&mut tx, target, file_id).await? else {
            tx.commit().await?;
            return Ok(false);
        };

        let remaining = existing.without(mask);
        if remaining.is_empty() {
            sqlx::query("DELETE FROM file_permissions WHERE user_id = $1 AND file_id = $2")
                .bind(target.as_uuid())
                .bind(file_id.as_uuid())
                .execute(&mut *tx)
                .await?;
        } else {
            sqlx::query(
                r#"
                UPDATE file_permissions
                SET mask = $3, modified_at = $4
                WHERE user_id = $1 AND file_id = $2
                "#,
            )
            .bind(target.as_uuid())
            .bind(file_id.as_uuid())
            .bind(remaining.bits() as i16)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(true)
    }
}

fn is_retryable(e: &sqlx::Error) -> bool {
    matches!(
        e,
        sqlx::Error::Database(db)
            if matches!(db.code().as_deref(), Some("23505" | "40001" | "40P01"))
    )
}

fn store_error(e: sqlx::Error) -> LedgerError {
    LedgerError::Store(e.to_string())
}

#[async_trait]
impl PermissionLedger for PostgresPermissionLedger {
    async fn check(
        &self,
        user_id: UserId,
        file_id: FileId,
        required: PermissionMask,
    ) -> Result<bool, LedgerError> {
        let row = sqlx::query(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM file_permissions
                WHERE user_id = $1 AND file_id = $2 AND mask & $3 = $3
            ) AS held
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(file_id.as_uuid())
        .bind(required.bits() as i16)
        .fetch_one(&*self.pool)
        .await
        .map_err(store_error)?;

        row.try_get("held").map_err(store_error)
    }

    async fn grant(
        &self,
        target: UserId,
        file_id: FileId,
        mask: PermissionMask,
    ) -> Result<LedgerEntry, LedgerError> {
        let mut attempt = 0;
        loop {
            match self.try_grant(target, file_id, mask).await {
                Ok(entry) => return Ok(entry),
                Err(e) if is_retryable(&e) => {
                    attempt += 1;
                    if attempt > MAX_RETRIES {
                        return Err(LedgerError::Conflict);
                    }
                    tracing::debug!(
                        target_user = %target,
                        file_id = %file_id,
                        attempt,
                        "retrying grant after serialization conflict"
                    );
                }
                Err(e) => return Err(store_error(e)),
            }
        }
    }

    async fn revoke(
        &self,
        target: UserId,
        file_id: FileId,
        mask: PermissionMask,
    ) -> Result<bool, LedgerError> {
        let mut attempt = 0;
        loop {
            match self.try_revoke(target, file_id, mask).await {
                Ok(revoked) => return Ok(revoked),
                Err(e) if is_retryable(&e) => {
                    attempt += 1;
                    if attempt > MAX_RETRIES {
                        return Err(LedgerError::Conflict);
                    }
                    tracing::debug!(
                        target_user = %target,
                        file_id = %file_id,
                        attempt,
                        "retrying revoke after serialization conflict"
                    );
                }
                Err(e) => return Err(store_error(e)),
            }
        }
    }

    async fn entries_for(
        &self,
        user_id: UserId,
        file_id: FileId,
    ) -> Result<Vec<LedgerEntry>, LedgerError> {
        let rows = sqlx::query(
            r#"
            SELECT mask, created_at, modified_at
            FROM file_permissions
            WHERE user_id = $1 AND file_id = $2
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(file_id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(store_error)?;

        rows.iter()
            .filter_map(|row| {
                let bits: i16 = row.try_get("mask").ok()?;
                let mask = PermissionMask::from_bits(bits as u8)?;
                Some(Ok(LedgerEntry {
                    user_id,
                    file_id,
                    mask,
                    created_at: row.try_get("created_at").ok()?,
                    modified_at: row.try_get("modified_at").ok()?,
                }))
            })
            .collect()
    }

    async fn accessible_files(
        &self,
        user_id: UserId,
        required: PermissionMask,
    ) -> Result<Vec<FileId>, LedgerError> {
        let rows = sqlx::query(
            r#"
            SELECT p.file_id
            FROM file_permissions p
            JOIN files f ON f.id = p.file_id
            WHERE p.user_id = $1 AND p.mask & $2 = $2 AND NOT f.deleted
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(required.bits() as i16)
        .fetch_all(&*self.pool)
        .await
        .map_err(store_error)?;

        rows.iter()
            .map(|row| {
                row.try_get("file_id")
                    .map(FileId::from_uuid)
                    .map_err(store_error)
            })
            .collect()
    }
}
