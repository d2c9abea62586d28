//! Declarative enforcement adapter.
//!
//! Each file route declares the capability it needs; this middleware runs
//! before the handler and translates that declaration into a call to the
//! one authorization engine. A missing or unparsable `file_id` path
//! parameter makes the request resource-less (only upload survives that
//! path for non-blanket roles).

use std::sync::Arc;

use axum::{
    extract::{RawPathParams, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};

use filehaven_auth::{Capability, Identity};
use filehaven_core::FileId;

use crate::app::{errors, services::AppServices};

/// State for one guarded route: the shared services plus the declared
/// capability.
#[derive(Clone)]
pub struct CapabilityGuard {
    pub services: Arc<AppServices>,
    pub capability: Capability,
}

impl CapabilityGuard {
    pub fn new(services: Arc<AppServices>, capability: Capability) -> Self {
        Self {
            services,
            capability,
        }
    }
}

pub async fn require_capability(
    State(guard): State<CapabilityGuard>,
    params: RawPathParams,
    req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let Some(identity) = req.extensions().get::<Identity>() else {
        return errors::json_error(StatusCode::UNAUTHORIZED, "unauthenticated", "unauthenticated");
    };

    let file_id = file_id_param(&params);

    match guard
        .services
        .engine
        .authorize(identity, guard.capability, file_id)
        .await
    {
        Ok(true) => next.run(req).await,
        Ok(false) => errors::json_error(StatusCode::FORBIDDEN, "forbidden", "forbidden"),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

/// The path parameter believed to name the file. Unparsable values are
/// treated the same as absent ones.
pub(crate) fn file_id_param(params: &RawPathParams) -> Option<FileId> {
    params
        .iter()
        .find(|(name, _)| *name == "file_id")
        .and_then(|(_, value)| value.parse().ok())
}
