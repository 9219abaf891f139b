use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Extension, Json,
};
use serde_json::Value;

use crate::app::AppState;
use crate::handlers::protected::{form_body, parse_rider_id};
use crate::middleware::{ApiResponse, ApiResult, StaffUser};
use crate::models::{SecurityInfoForm, SecurityInfoRecord};

/// POST /api/enrollment/:rider_id/security - Step 2: vehicle, license,
/// insurance and witness details. `insurance_expiration_date` must be after
/// today.
pub async fn security_post(
    State(state): State<AppState>,
    Extension(staff): Extension<StaffUser>,
    Path(rider_id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<SecurityInfoRecord> {
    let rider_id = parse_rider_id(&rider_id)?;
    let form: SecurityInfoForm = form_body(payload)?;

    let saved = state.enrollment.create_security(&staff, rider_id, &form).await?;
    Ok(ApiResponse::created(saved))
}
