use axum::{extract::rejection::JsonRejection, extract::State, Extension, Json};

use serde_json::Value;

use crate::app::AppState;
use crate::handlers::protected::form_body;
use crate::middleware::{ApiResponse, ApiResult, StaffUser};
use crate::models::{CreatedRider, PersonalInfoForm};

/// POST /api/enrollment/personal - Step 1: create the rider identity and
/// personal record
///
/// Expected Input:
/// ```json
/// {
///   "first_name": "Kwame", "last_name": "Mensah", "other_names": null,
///   "email": "kwame@example.com", "phone_number": "0241234567",
///   "date_of_birth": "1992-03-14", "marital_status": "single",
///   "gender": "male", "nationality": "Ghanaian", "city": "Accra",
///   "gps_address": "GA-183-8164"
/// }
/// ```
///
/// Expected Output (201):
/// ```json
/// { "success": true, "data": { "id": "rider_uuid", "email": "kwame@example.com" } }
/// ```
pub async fn personal_post(
    State(state): State<AppState>,
    Extension(staff): Extension<StaffUser>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<CreatedRider> {
    let form: PersonalInfoForm = form_body(payload)?;
    let created = state.enrollment.create_rider(&staff, &form).await?;
    Ok(ApiResponse::created(created))
}
