use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Extension, Json,
};
use serde_json::Value;

use crate::app::AppState;
use crate::handlers::protected::{form_body, parse_rider_id};
use crate::middleware::{ApiResponse, ApiResult, StaffUser};
use crate::models::{FinanceForm, FinanceRecord};

/// POST /api/enrollment/:rider_id/finance - Step 4: payout details
///
/// Expected Input:
/// ```json
/// { "service_provider": "mtn", "mobile_money_number": "0241234567" }
/// ```
///
/// Creates the finance record or replaces the existing one; a rider never
/// has more than one.
pub async fn finance_post(
    State(state): State<AppState>,
    Extension(staff): Extension<StaffUser>,
    Path(rider_id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<FinanceRecord> {
    let rider_id = parse_rider_id(&rider_id)?;
    let form: FinanceForm = form_body(payload)?;

    let saved = state.enrollment.save_finance(&staff, rider_id, &form).await?;
    Ok(ApiResponse::success(saved))
}
