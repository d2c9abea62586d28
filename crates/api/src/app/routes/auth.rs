//! Account endpoints: register, login, token validation, whoami.

use std::sync::Arc;

use axum::{Extension, Json, http::StatusCode, response::IntoResponse};

use filehaven_auth::Identity;
use filehaven_infra::AuthSession;

use crate::app::dto::{
    AuthResponse, IdentityDto, LoginRequest, RegisterRequest, ValidateRequest, ValidateResponse,
};
use crate::app::{errors, services::AppServices};

fn auth_response(session: &AuthSession) -> AuthResponse {
    AuthResponse {
        token: session.token.clone(),
        expires_at: session.expires_at,
        user: (&session.account).into(),
    }
}

/// POST /auth/register
pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    Json(request): Json<RegisterRequest>,
) -> axum::response::Response {
    match services
        .accounts
        .register(&request.email, &request.full_name, &request.password)
        .await
    {
        Ok(session) => (StatusCode::CREATED, Json(auth_response(&session))).into_response(),
        Err(e) => errors::account_error_to_response(e),
    }
}

/// POST /auth/login
pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    Json(request): Json<LoginRequest>,
) -> axum::response::Response {
    match services
        .accounts
        .login(&request.email, &request.password)
        .await
    {
        Ok(session) => (StatusCode::OK, Json(auth_response(&session))).into_response(),
        Err(e) => errors::account_error_to_response(e),
    }
}

/// POST /auth/validate — signature/expiry check only, no account lookup.
pub async fn validate(
    Extension(services): Extension<Arc<AppServices>>,
    Json(request): Json<ValidateRequest>,
) -> Json<ValidateResponse> {
    Json(ValidateResponse {
        valid: services.identity.verify(&request.token),
    })
}

/// GET /auth/me — the caller's resolved identity.
pub async fn me(Extension(identity): Extension<Identity>) -> Json<IdentityDto> {
    Json((&identity).into())
}
