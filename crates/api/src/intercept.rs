//! Interception enforcement adapter.
//!
//! Runs on every file route and derives the required capability from the
//! HTTP method instead of a declared name, so it enforces a coarser,
//! structurally-derived policy. Both adapters consult the same engine and
//! the same capability table; when both run, either one's denial is final.

use std::sync::Arc;

use axum::{
    extract::{RawPathParams, State},
    http::{Method, StatusCode},
    middleware::Next,
    response::Response,
};

use filehaven_auth::{Capability, Identity};

use crate::app::{errors, services::AppServices};
use crate::guard::file_id_param;

/// Method → capability class. Read-class methods need the Read bit,
/// write-class the Write bit, delete the Delete bit; anything unrecognized
/// conservatively needs Read.
pub fn capability_for_method(method: &Method) -> Capability {
    match method.as_str() {
        "GET" | "HEAD" => Capability::View,
        "POST" | "PUT" | "PATCH" => Capability::Update,
        "DELETE" => Capability::Delete,
        _ => Capability::View,
    }
}

pub async fn intercept_file_requests(
    State(services): State<Arc<AppServices>>,
    params: RawPathParams,
    req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    // No file id in the path: nothing to check here. The declarative
    // layer, if present, still gates the request.
    let Some(file_id) = file_id_param(&params) else {
        return next.run(req).await;
    };

    let Some(identity) = req.extensions().get::<Identity>() else {
        return errors::json_error(StatusCode::UNAUTHORIZED, "unauthenticated", "unauthenticated");
    };

    let capability = capability_for_method(req.method());

    match services
        .engine
        .authorize(identity, capability, Some(file_id))
        .await
    {
        Ok(true) => next.run(req).await,
        Ok(false) => errors::json_error(StatusCode::FORBIDDEN, "forbidden", "forbidden"),
        Err(e) => errors::ledger_error_to_response(e),
    }
}
