// handlers/protected/riders.rs - Rider read model and edit path

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Extension, Json,
};

use serde_json::Value;

use super::{form_body, parse_rider_id};
use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult, StaffUser};
use crate::models::{PersonalInfoForm, PersonalInfoRecord, RiderRecord, SecurityInfoForm, SecurityInfoRecord};

/// GET /api/riders - Personal records of every rider, newest first
pub async fn riders_list(State(state): State<AppState>) -> ApiResult<Vec<PersonalInfoRecord>> {
    Ok(ApiResponse::success(state.riders.list_riders().await?))
}

/// GET /api/riders/:rider_id - Everything recorded for one rider
///
/// Expected Output:
/// ```json
/// {
///   "success": true,
///   "data": {
///     "id": "rider_uuid",
///     "personal": { "first_name": "Kwame", ... },
///     "security": null,
///     "documents": null,
///     "finance": null
///   }
/// }
/// ```
pub async fn rider_get(State(state): State<AppState>, Path(rider_id): Path<String>) -> ApiResult<RiderRecord> {
    let rider_id = parse_rider_id(&rider_id)?;
    Ok(ApiResponse::success(state.riders.get_rider(rider_id).await?))
}

/// PUT /api/riders/:rider_id/personal
pub async fn rider_personal_put(
    State(state): State<AppState>,
    Extension(staff): Extension<StaffUser>,
    Path(rider_id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<PersonalInfoRecord> {
    let rider_id = parse_rider_id(&rider_id)?;
    let form: PersonalInfoForm = form_body(payload)?;

    let updated = state.riders.update_personal(&staff, rider_id, &form).await?;
    Ok(ApiResponse::success(updated))
}

/// PUT /api/riders/:rider_id/security
pub async fn rider_security_put(
    State(state): State<AppState>,
    Extension(staff): Extension<StaffUser>,
    Path(rider_id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<SecurityInfoRecord> {
    let rider_id = parse_rider_id(&rider_id)?;
    let form: SecurityInfoForm = form_body(payload)?;

    let updated = state.riders.update_security(&staff, rider_id, &form).await?;
    Ok(ApiResponse::success(updated))
}
