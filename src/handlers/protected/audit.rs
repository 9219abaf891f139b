use axum::extract::State;

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult};
use crate::models::AuditEntry;

/// GET /api/audit-logs - Staff actions, newest first
pub async fn audit_logs_get(State(state): State<AppState>) -> ApiResult<Vec<AuditEntry>> {
    Ok(ApiResponse::success(state.audit.list().await?))
}
