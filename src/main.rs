use anyhow::Context;
use tracing_subscriber::EnvFilter;

use pragxi_admin_api::baas::Baas;
use pragxi_admin_api::config::{self, BackendKind};
use pragxi_admin_api::{build_router, is_production, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up BAAS_URL, BAAS_JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("pragxi_admin_api=info,tower_http=info")),
        )
        .init();

    // Initialize configuration (this loads the config singleton)
    let config = config::config().clone();
    tracing::info!("Starting Pragxi Admin API in {:?} mode", config.environment);

    if config.security.jwt_secret.is_empty() {
        anyhow::bail!("BAAS_JWT_SECRET must be set to validate staff tokens");
    }
    if config.baas.backend == BackendKind::Memory {
        if is_production!() {
            anyhow::bail!("the in-memory backend cannot run in production");
        }
        tracing::warn!("Using the in-memory BaaS; data is lost on restart");
    }

    let baas = Baas::from_config(&config).context("failed to initialise the BaaS client")?;
    let port = config.server.port;
    let app = build_router(AppState::new(config, baas));

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Pragxi Admin API listening on http://{}", bind_addr);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
