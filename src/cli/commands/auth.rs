use serde_json::json;
use tracing::warn;

use crate::cli::config::{load_auth_config, save_auth_config};
use crate::cli::utils::{output_success, output_wizard_error};
use crate::cli::OutputFormat;
use crate::wizard::HttpEnrollmentClient;

pub async fn login(
    server: Option<String>,
    email: String,
    password: String,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    let mut config = load_auth_config()?;
    let server_url = server.unwrap_or_else(|| config.server_url.clone());
    let client = HttpEnrollmentClient::new(server_url, None);

    let session = match client.login(&email, &password).await {
        Ok(session) => session,
        Err(e) => return output_wizard_error(&output_format, e),
    };

    config.record_login(
        client.base_url().to_string(),
        session.user.email.clone(),
        session.access_token,
        session.expires_in,
    );
    save_auth_config(&config)?;

    output_success(
        &output_format,
        &format!("Logged in as {} on {}", session.user.email, config.server_url),
        Some(json!({
            "email": session.user.email,
            "role": session.user.role,
            "server_url": config.server_url,
            "expires_at": config.expires_at,
        })),
    )
}

pub async fn logout(output_format: OutputFormat) -> anyhow::Result<()> {
    let mut config = load_auth_config()?;

    let Some(token) = config.token.clone() else {
        return output_success(&output_format, "Not logged in", None);
    };

    // The local token is dropped even when the server cannot revoke it
    let client = HttpEnrollmentClient::new(config.server_url.clone(), Some(token));
    if let Err(e) = client.logout().await {
        warn!("Server-side logout failed: {}", e);
    }

    config.clear_session();
    save_auth_config(&config)?;

    output_success(&output_format, "Logged out", None)
}
