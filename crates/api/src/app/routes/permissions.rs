//! Permission management endpoints.
//!
//! Grant/revoke preconditions (effective full control) are enforced by the
//! authorization engine, not re-derived here.

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, Query},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use filehaven_auth::{Capability, Identity, PermissionMask};
use filehaven_core::{FileId, UserId};

use crate::app::dto::{
    AccessibleQuery, FileDto, GrantPermissionRequest, LedgerEntryDto, RevokePermissionRequest,
};
use crate::app::{errors, services::AppServices};

fn parse_mask(bits: u8) -> Result<PermissionMask, axum::response::Response> {
    PermissionMask::from_bits(bits).ok_or_else(|| {
        errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            format!("'{bits}' is not a valid permission mask"),
        )
    })
}

/// GET /files/:file_id/permissions — the caller's entries for this file.
pub async fn list(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<Identity>,
    Path(file_id): Path<Uuid>,
) -> axum::response::Response {
    match services
        .engine
        .entries_for(identity.user_id, FileId::from_uuid(file_id))
        .await
    {
        Ok(entries) => {
            let dtos: Vec<LedgerEntryDto> = entries.iter().map(LedgerEntryDto::from).collect();
            Json(dtos).into_response()
        }
        Err(e) => errors::ledger_error_to_response(e),
    }
}

/// POST /files/:file_id/permissions — grant mask bits to another user.
pub async fn grant(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<Identity>,
    Path(file_id): Path<Uuid>,
    Json(request): Json<GrantPermissionRequest>,
) -> axum::response::Response {
    let mask = match parse_mask(request.permission) {
        Ok(mask) => mask,
        Err(response) => return response,
    };

    match services
        .engine
        .grant(
            &identity,
            UserId::from_uuid(request.target_user_id),
            FileId::from_uuid(file_id),
            mask,
        )
        .await
    {
        Ok(true) => Json(serde_json::json!({ "granted": true })).into_response(),
        Ok(false) => errors::json_error(StatusCode::FORBIDDEN, "forbidden", "forbidden"),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

/// DELETE /files/:file_id/permissions — revoke mask bits from a user.
pub async fn revoke(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<Identity>,
    Path(file_id): Path<Uuid>,
    Json(request): Json<RevokePermissionRequest>,
) -> axum::response::Response {
    let mask = match parse_mask(request.permission) {
        Ok(mask) => mask,
        Err(response) => return response,
    };

    match services
        .engine
        .revoke(
            &identity,
            UserId::from_uuid(request.target_user_id),
            FileId::from_uuid(file_id),
            mask,
        )
        .await
    {
        Ok(true) => Json(serde_json::json!({ "revoked": true })).into_response(),
        Ok(false) => errors::json_error(StatusCode::FORBIDDEN, "forbidden", "forbidden"),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

/// GET /files/accessible?capability=file.view — files the caller holds at
/// least the capability's bits on (ownership and blanket roles aside).
pub async fn accessible(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<AccessibleQuery>,
) -> axum::response::Response {
    let capability: Capability = match query.capability.parse() {
        Ok(capability) => capability,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let ids = match services.engine.list_accessible(&identity, capability).await {
        Ok(ids) => ids,
        Err(e) => return errors::ledger_error_to_response(e),
    };

    let mut dtos = Vec::with_capacity(ids.len());
    for id in ids {
        match services.files.find_live(id).await {
            Ok(Some(metadata)) => dtos.push(FileDto::from(&metadata)),
            Ok(None) => {}
            Err(e) => return errors::store_error_to_response(e),
        }
    }
    Json(dtos).into_response()
}
