// app.rs - Shared application state and router assembly
//
// main.rs and the integration tests both build the router from here, so a
// test server is the production router wired to a different BaaS.

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::baas::Baas;
use crate::config::AppConfig;
use crate::handlers::{protected, public};
use crate::middleware::jwt_auth_middleware;
use crate::services::{AuditLog, EnrollmentService, EnrollmentSettings, RiderService};

/// Upper bound on documents per request used to size the multipart body limit
const MAX_DOCUMENT_FILES: usize = 12;

#[derive(Clone)]
pub struct AppState {
    pub baas: Baas,
    pub config: Arc<AppConfig>,
    pub enrollment: EnrollmentService,
    pub riders: RiderService,
    pub audit: AuditLog,
}

impl AppState {
    pub fn new(config: AppConfig, baas: Baas) -> Self {
        let audit = AuditLog::new(baas.tables.clone());
        let enrollment = EnrollmentService::new(baas.clone(), audit.clone(), EnrollmentSettings::from_config(&config));
        let riders = RiderService::new(baas.clone(), audit.clone());

        Self {
            baas,
            config: Arc::new(config),
            enrollment,
            riders,
            audit,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let mut router = Router::new()
        // Public
        .route("/", get(public::root))
        .route("/health", get(public::health))
        .route("/auth/login", post(public::auth::login_post))
        // Protected (JWT)
        .merge(protected_routes(state.clone()));

    if let Some(cors) = cors_layer(&state.config) {
        router = router.layer(cors);
    }
    if state.config.server.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }

    router.with_state(state)
}

fn protected_routes(state: AppState) -> Router<AppState> {
    use protected::{audit, auth, enrollment, riders};

    let documents_limit = state.config.storage.max_file_bytes.saturating_mul(MAX_DOCUMENT_FILES);

    Router::new()
        .route("/api/auth/whoami", get(auth::whoami))
        .route("/api/auth/logout", post(auth::logout))
        // Enrollment wizard steps
        .route("/api/enrollment/personal", post(enrollment::personal_post))
        .route("/api/enrollment/:rider_id/security", post(enrollment::security_post))
        .route(
            "/api/enrollment/:rider_id/documents",
            post(enrollment::documents_post).layer(DefaultBodyLimit::max(documents_limit)),
        )
        .route("/api/enrollment/:rider_id/finance", post(enrollment::finance_post))
        // Rider read and edit path
        .route("/api/riders", get(riders::riders_list))
        .route("/api/riders/:rider_id", get(riders::rider_get))
        .route("/api/riders/:rider_id/personal", put(riders::rider_personal_put))
        .route("/api/riders/:rider_id/security", put(riders::rider_security_put))
        .route("/api/audit-logs", get(audit::audit_logs_get))
        .route_layer(from_fn_with_state(state, jwt_auth_middleware))
}

fn cors_layer(config: &AppConfig) -> Option<CorsLayer> {
    if !config.security.enable_cors {
        return None;
    }

    let origins: Vec<HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    if origins.is_empty() {
        return Some(CorsLayer::permissive());
    }

    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(tower_http::cors::Any)
            .allow_headers(tower_http::cors::Any),
    )
}
