// handlers/protected/auth.rs - Session endpoints for the signed-in staff member

use axum::{extract::State, Extension};
use serde_json::{json, Value};
use tracing::warn;

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult, StaffUser};

/// GET /api/auth/whoami - Current staff user from the validated JWT
///
/// Expected Output:
/// ```json
/// {
///   "success": true,
///   "data": { "id": "user_uuid", "email": "ops@pragxi.com", "role": "admin" }
/// }
/// ```
pub async fn whoami(Extension(staff): Extension<StaffUser>) -> ApiResult<StaffUser> {
    Ok(ApiResponse::success(staff))
}

/// POST /api/auth/logout - Revoke the session at the BaaS.
///
/// Best-effort: a failed revocation is logged and the call still succeeds,
/// the client drops its token either way.
pub async fn logout(State(state): State<AppState>, Extension(staff): Extension<StaffUser>) -> ApiResult<Value> {
    let revoked = match state.baas.auth.sign_out(&staff.access_token).await {
        Ok(()) => true,
        Err(e) => {
            warn!("Sign-out for {} failed: {}", staff.email, e);
            false
        }
    };

    Ok(ApiResponse::success(json!({ "logged_out": true, "revoked": revoked })))
}
