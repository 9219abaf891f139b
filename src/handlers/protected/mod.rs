// handlers/protected/mod.rs - Protected handlers (staff JWT required)
//
// Security Level: JWT Authentication Required, rider accounts refused
// Route Prefix: /api/*
// Middleware: jwt_auth_middleware injects Extension<StaffUser>

pub mod audit; // Audit log listing
pub mod auth; // Session endpoints for the signed-in staff member
pub mod enrollment; // Wizard step actions
pub mod riders; // Rider read model and edit path

use axum::{extract::rejection::JsonRejection, Json};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::ApiError;
use crate::models::RiderId;
use crate::validation::decode_form;

/// Parse the `:rider_id` path segment
pub(crate) fn parse_rider_id(raw: &str) -> Result<RiderId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::bad_request(format!("Invalid rider id: {}", raw)))
}

/// Decode a form body; mistyped fields come back as validation issues
pub(crate) fn form_body<T>(payload: Result<Json<Value>, JsonRejection>) -> Result<T, ApiError>
where
    T: DeserializeOwned + Serialize + Default,
{
    let Json(body) = payload?;
    decode_form(body).map_err(|issues| ApiError::validation_error("Validation failed", issues))
}

/*
PROTECTED HANDLER ARCHITECTURE:

Router::new()
    .route("/api/enrollment/personal", post(enrollment::personal_post))
    .route("/api/riders/:rider_id", get(riders::rider_get))
    ...
    .route_layer(from_fn_with_state(state, jwt_auth_middleware))

Each handler receives:
- State<AppState>: BaaS handle, configuration and the services
- Extension<StaffUser>: the validated caller, recorded as the audit actor

Handler Categories:

1. **Enrollment** (/api/enrollment/):
   - Step 1 creates the rider identity and returns its id
   - Steps 2-4 write one record each, keyed by that id
   - No step checks that an earlier one ran; ordering is the wizard's job

2. **Riders** (/api/riders/):
   - Rider record assembled from the four step tables
   - Edit path for personal and security information

3. **Audit** (/api/audit-logs):
   - Entries appended by every successful step action and edit
*/
