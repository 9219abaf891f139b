// handlers/public/auth.rs - POST /auth/login handler

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::app::AppState;
use crate::auth::ROLE_RIDER;
use crate::baas::Identity;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::validation::FieldValidator;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub expires_in: i64,
    pub user: Identity,
}

/// POST /auth/login - Authenticate a staff member against the BaaS
///
/// Expected Input:
/// ```json
/// { "email": "ops@pragxi.com", "password": "..." }
/// ```
///
/// Expected Output (Success):
/// ```json
/// {
///   "success": true,
///   "data": {
///     "access_token": "eyJhbGciOiJIUzI1NiI...",
///     "expires_in": 3600,
///     "user": { "id": "uuid", "email": "ops@pragxi.com", "role": "admin" }
///   }
/// }
/// ```
///
/// Rider accounts authenticate fine against the BaaS but are refused here
/// with 403.
pub async fn login_post(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<LoginResponse> {
    let Json(request) = payload?;

    let mut v = FieldValidator::new();
    let email = v.email("email", &request.email);
    if request.password.is_empty() {
        v.issue("password", "This field is required");
    }
    let Some(email) = email.filter(|_| v.is_clean()) else {
        return Err(ApiError::validation_error("Validation failed", v.into_issues()));
    };

    let session = state
        .baas
        .auth
        .sign_in_with_password(&email, &request.password)
        .await?;

    if session.user.role.as_deref() == Some(ROLE_RIDER) {
        warn!("Rider account {} attempted a dashboard login", email);
        if let Err(e) = state.baas.auth.sign_out(&session.access_token).await {
            warn!("Failed to revoke rider session: {}", e);
        }
        return Err(ApiError::forbidden("Rider accounts cannot sign in to the dashboard"));
    }

    info!("Staff login: {}", email);
    Ok(ApiResponse::success(LoginResponse {
        access_token: session.access_token,
        expires_in: session.expires_in,
        user: session.user,
    }))
}
