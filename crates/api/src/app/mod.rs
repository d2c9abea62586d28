//! HTTP application wiring (axum router + service wiring).
//!
//! Structure:
//! - `services.rs`: store selection and service construction
//! - `routes/`: handlers, one file per area
//! - `dto.rs`: request/response DTOs
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{
    Extension, Router,
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
};

use filehaven_auth::Capability;

use crate::config::AppConfig;
use crate::guard::{CapabilityGuard, require_capability};
use crate::{intercept, middleware};

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

use services::AppServices;

/// Build the full router (public entrypoint used by `main.rs` and the
/// black-box tests).
pub async fn build_app(config: &AppConfig) -> anyhow::Result<Router> {
    let services = Arc::new(services::build_services(config).await?);
    Ok(router(services))
}

fn router(services: Arc<AppServices>) -> Router {
    let requires = |capability: Capability| {
        from_fn_with_state(
            CapabilityGuard::new(services.clone(), capability),
            require_capability,
        )
    };

    // File routes, grouped by the capability their declarative guard
    // requires. The same path with different methods merges cleanly.
    let file_routes = Router::new()
        .route("/files", post(routes::files::upload))
        .route_layer(requires(Capability::Upload))
        .merge(
            Router::new()
                .route("/files", get(routes::files::search))
                .route("/files/:file_id/metadata", get(routes::files::metadata))
                .route_layer(requires(Capability::View)),
        )
        .merge(
            Router::new()
                .route("/files/:file_id", get(routes::files::download))
                .route_layer(requires(Capability::Download)),
        )
        .merge(
            Router::new()
                .route(
                    "/files/:file_id/metadata",
                    put(routes::files::update_metadata),
                )
                .route_layer(requires(Capability::Update)),
        )
        .merge(
            Router::new()
                .route("/files/:file_id", delete(routes::files::delete))
                .route_layer(requires(Capability::Delete)),
        );

    // Permission management and listings carry no declared capability; the
    // engine enforces grant/revoke preconditions itself.
    let permission_routes = Router::new()
        .route("/files/accessible", get(routes::permissions::accessible))
        .route(
            "/files/:file_id/permissions",
            get(routes::permissions::list)
                .post(routes::permissions::grant)
                .delete(routes::permissions::revoke),
        );

    // Both enforcement adapters run on every protected request: the
    // interceptor router-wide, the declarative guard per route. Either
    // denial is final.
    let protected = file_routes
        .merge(permission_routes)
        .route("/auth/me", get(routes::auth::me))
        .layer(
            tower::ServiceBuilder::new()
                .layer(from_fn_with_state(
                    services.clone(),
                    middleware::auth_middleware,
                ))
                .layer(from_fn_with_state(
                    services.clone(),
                    intercept::intercept_file_requests,
                )),
        );

    let public = Router::new()
        .route("/health", get(routes::system::health))
        .route("/auth/register", post(routes::auth::register))
        .route("/auth/login", post(routes::auth::login))
        .route("/auth/validate", post(routes::auth::validate));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(Extension(services))
}
