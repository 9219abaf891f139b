pub mod auth;
pub mod enroll;
pub mod riders;

use crate::cli::config::load_auth_config;
use crate::wizard::HttpEnrollmentClient;

/// Client for the stored server, authenticated with the stored token
pub fn authenticated_client() -> anyhow::Result<HttpEnrollmentClient> {
    let config = load_auth_config()?;
    let token = config.require_token()?;
    Ok(HttpEnrollmentClient::new(config.server_url, Some(token)))
}
