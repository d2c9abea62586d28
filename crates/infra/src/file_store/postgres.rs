//! Postgres-backed file store.
//!
//! Expected table:
//!
//! ```sql
//! CREATE TABLE files (
//!     id              UUID PRIMARY KEY,
//!     file_name       TEXT NOT NULL,
//!     content_type    TEXT NOT NULL,
//!     size            BIGINT NOT NULL,
//!     owner_id        UUID NOT NULL REFERENCES users (id),
//!     version         TEXT NOT NULL,
//!     uploaded_at     TIMESTAMPTZ NOT NULL,
//!     deleted         BOOLEAN NOT NULL DEFAULT FALSE,
//!     custom_metadata JSONB NOT NULL DEFAULT '{}'
//! );
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};

use filehaven_auth::{FileIndex, LedgerError};
use filehaven_core::{FileId, UserId};
use filehaven_files::FileMetadata;

use super::FileStore;
use crate::error::StoreError;

pub struct PostgresFileStore {
    pool: Arc<PgPool>,
}

impl PostgresFileStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

const SELECT_COLUMNS: &str =
    "id, file_name, content_type, size, owner_id, version, uploaded_at, deleted, custom_metadata";

fn metadata_from_row(row: &PgRow) -> Result<FileMetadata, sqlx::Error> {
    let custom: sqlx::types::Json<HashMap<String, String>> = row.try_get("custom_metadata")?;
    Ok(FileMetadata {
        id: FileId::from_uuid(row.try_get("id")?),
        file_name: row.try_get("file_name")?,
        content_type: row.try_get("content_type")?,
        size: row.try_get("size")?,
        owner_id: UserId::from_uuid(row.try_get("owner_id")?),
        version: row.try_get("version")?,
        uploaded_at: row.try_get("uploaded_at")?,
        deleted: row.try_get("deleted")?,
        custom_metadata: custom.0,
    })
}

#[async_trait]
impl FileStore for PostgresFileStore {
    async fn insert(&self, metadata: &FileMetadata) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO files
                (id, file_name, content_type, size, owner_id, version, uploaded_at, deleted, custom_metadata)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(metadata.id.as_uuid())
        .bind(&metadata.file_name)
        .bind(&metadata.content_type)
        .bind(metadata.size)
        .bind(metadata.owner_id.as_uuid())
        .bind(&metadata.version)
        .bind(metadata.uploaded_at)
        .bind(metadata.deleted)
        .bind(sqlx::types::Json(&metadata.custom_metadata))
        .execute(&*self.pool)
        .await?;
        Ok(())
    }

    async fn find_live(&self, file_id: FileId) -> Result<Option<FileMetadata>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM files WHERE id = $1 AND NOT deleted"
        ))
        .bind(file_id.as_uuid())
        .fetch_optional(&*self.pool)
        .await?;

        row.as_ref()
            .map(metadata_from_row)
            .transpose()
            .map_err(StoreError::from)
    }

    async fn mark_deleted(&self, file_id: FileId) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE files SET deleted = TRUE WHERE id = $1 AND NOT deleted")
            .bind(file_id.as_uuid())
            .execute(&*self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn update_custom_metadata(
        &self,
        file_id: FileId,
        entries: HashMap<String, String>,
    ) -> Result<Option<FileMetadata>, StoreError> {
        // jsonb || merges keys, overwriting existing ones, matching the
        // in-memory semantics.
        let row = sqlx::query(&format!(
            r#"
            UPDATE files
            SET custom_metadata = custom_metadata || $2
            WHERE id = $1 AND NOT deleted
            RETURNING {SELECT_COLUMNS}
            "#
        ))
        .bind(file_id.as_uuid())
        .bind(sqlx::types::Json(&entries))
        .fetch_optional(&*self.pool)
        .await?;

        row.as_ref()
            .map(metadata_from_row)
            .transpose()
            .map_err(StoreError::from)
    }

    async fn search(&self, term: &str) -> Result<Vec<FileMetadata>, StoreError> {
        let pattern = format!("%{}%", term.replace('%', "\\%").replace('_', "\\_"));
        let rows = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM files WHERE NOT deleted AND file_name ILIKE $1"
        ))
        .bind(pattern)
        .fetch_all(&*self.pool)
        .await?;

        rows.iter()
            .map(metadata_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(StoreError::from)
    }

    async fn owned_live_ids(&self, owner_id: UserId) -> Result<Vec<FileId>, StoreError> {
        let rows = sqlx::query("SELECT id FROM files WHERE owner_id = $1 AND NOT deleted")
            .bind(owner_id.as_uuid())
            .fetch_all(&*self.pool)
            .await?;

        rows.iter()
            .map(|row| Ok(FileId::from_uuid(row.try_get("id")?)))
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .map_err(StoreError::from)
    }
}

#[async_trait]
impl FileIndex for PostgresFileStore {
    async fn retain_visible(&self, ids: Vec<FileId>) -> Result<Vec<FileId>, LedgerError> {
        if ids.is_empty() {
            return Ok(ids);
        }
        let uuids: Vec<uuid::Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();
        let rows = sqlx::query("SELECT id FROM files WHERE id = ANY($1) AND NOT deleted")
            .bind(uuids)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| LedgerError::Store(e.to_string()))?;

        rows.iter()
            .map(|row| {
                row.try_get("id")
                    .map(FileId::from_uuid)
                    .map_err(|e| LedgerError::Store(e.to_string()))
            })
            .collect()
    }
}
