//! File storage endpoints.
//!
//! Authorization happens in the enforcement adapters before these handlers
//! run; handlers only deal with storage. Missing or soft-deleted files are
//! reported as not-found.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Extension, Json,
    body::Bytes,
    extract::{Path, Query},
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
};
use chrono::Utc;
use uuid::Uuid;

use filehaven_auth::Identity;
use filehaven_core::FileId;
use filehaven_files::FileMetadata;

use crate::app::dto::{FileDto, SearchQuery, UpdateMetadataRequest, UploadQuery};
use crate::app::{errors, services::AppServices};

/// POST /files?file_name=… — body is the raw content.
pub async fn upload(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<UploadQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> axum::response::Response {
    if body.is_empty() {
        return errors::json_error(StatusCode::BAD_REQUEST, "validation_error", "no file content");
    }

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    let metadata = match FileMetadata::create(
        identity.user_id,
        &query.file_name,
        content_type,
        body.len() as i64,
        HashMap::new(),
        Utc::now(),
    ) {
        Ok(metadata) => metadata,
        Err(e) => return errors::domain_error_to_response(e),
    };

    if let Err(e) = services.content.put(metadata.id, &body).await {
        return errors::store_error_to_response(e);
    }
    if let Err(e) = services.files.insert(&metadata).await {
        return errors::store_error_to_response(e);
    }

    tracing::info!(
        file_id = %metadata.id,
        owner = %identity.user_id,
        size = metadata.size,
        "file uploaded"
    );
    (StatusCode::CREATED, Json(FileDto::from(&metadata))).into_response()
}

/// GET /files/:file_id — download the content.
pub async fn download(
    Extension(services): Extension<Arc<AppServices>>,
    Path(file_id): Path<Uuid>,
) -> axum::response::Response {
    let file_id = FileId::from_uuid(file_id);

    let metadata = match services.files.find_live(file_id).await {
        Ok(Some(metadata)) => metadata,
        Ok(None) => return errors::json_error(StatusCode::NOT_FOUND, "not_found", "file not found"),
        Err(e) => return errors::store_error_to_response(e),
    };

    let bytes = match services.content.get(file_id).await {
        Ok(Some(bytes)) => bytes,
        Ok(None) => return errors::json_error(StatusCode::NOT_FOUND, "not_found", "file not found"),
        Err(e) => return errors::store_error_to_response(e),
    };

    (
        [
            (header::CONTENT_TYPE, metadata.content_type.clone()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", metadata.file_name),
            ),
        ],
        bytes,
    )
        .into_response()
}

/// GET /files/:file_id/metadata
pub async fn metadata(
    Extension(services): Extension<Arc<AppServices>>,
    Path(file_id): Path<Uuid>,
) -> axum::response::Response {
    match services.files.find_live(FileId::from_uuid(file_id)).await {
        Ok(Some(metadata)) => Json(FileDto::from(&metadata)).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "file not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}

/// PUT /files/:file_id/metadata — merge custom key/value entries.
pub async fn update_metadata(
    Extension(services): Extension<Arc<AppServices>>,
    Path(file_id): Path<Uuid>,
    Json(request): Json<UpdateMetadataRequest>,
) -> axum::response::Response {
    match services
        .files
        .update_custom_metadata(FileId::from_uuid(file_id), request.metadata)
        .await
    {
        Ok(Some(metadata)) => Json(FileDto::from(&metadata)).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "file not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}

/// DELETE /files/:file_id — soft delete; content is removed, the record
/// stays flagged.
pub async fn delete(
    Extension(services): Extension<Arc<AppServices>>,
    Path(file_id): Path<Uuid>,
) -> axum::response::Response {
    let file_id = FileId::from_uuid(file_id);

    match services.files.mark_deleted(file_id).await {
        Ok(true) => {}
        Ok(false) => {
            return errors::json_error(StatusCode::NOT_FOUND, "not_found", "file not found");
        }
        Err(e) => return errors::store_error_to_response(e),
    }

    if let Err(e) = services.content.delete(file_id).await {
        // The record is already flagged; content cleanup failure is logged,
        // not surfaced.
        tracing::warn!(file_id = %file_id, error = %e, "content cleanup failed after soft delete");
    }

    tracing::info!(file_id = %file_id, "file deleted");
    Json(serde_json::json!({ "deleted": true })).into_response()
}

/// GET /files?search=term — name search over live files.
pub async fn search(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<SearchQuery>,
) -> axum::response::Response {
    match services.files.search(&query.search).await {
        Ok(results) => {
            let dtos: Vec<FileDto> = results.iter().map(FileDto::from).collect();
            Json(dtos).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}
