// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Security Level: None
// Route Prefix: no /api prefix (/, /health, /auth/*)

pub mod auth; // POST /auth/login - exchange staff credentials for a JWT

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::app::AppState;

/// GET / - service banner with the route map
pub async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Pragxi Admin API",
            "version": version,
            "description": "Rider enrollment and dashboard backend",
            "endpoints": {
                "health": "/health (public)",
                "login": "/auth/login (public)",
                "auth": "/api/auth/{whoami,logout} (protected)",
                "enrollment": "/api/enrollment/personal, /api/enrollment/:rider_id/{security,documents,finance} (protected)",
                "riders": "/api/riders[/:rider_id[/personal|/security]] (protected)",
                "audit": "/api/audit-logs (protected)",
            }
        }
    }))
}

/// GET /health - checks the BaaS
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.baas.auth.health().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "backend": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "Backend unavailable",
                    "code": "SERVICE_UNAVAILABLE",
                    "data": {
                        "status": "degraded",
                        "timestamp": now
                    }
                })),
            )
        }
    }
}
