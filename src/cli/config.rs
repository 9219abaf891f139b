use std::fs;
use std::path::PathBuf;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_SERVER_URL: &str = "http://localhost:3000";

/// Server and staff session the CLI talks to, stored in `auth.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub server_url: String,
    pub token: Option<String>,
    pub email: Option<String>,
    pub logged_in_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            token: None,
            email: None,
            logged_in_at: None,
            expires_at: None,
        }
    }
}

impl AuthConfig {
    pub fn record_login(&mut self, server_url: String, email: String, token: String, expires_in: i64) {
        let now = Utc::now();
        self.server_url = server_url;
        self.email = Some(email);
        self.token = Some(token);
        self.logged_in_at = Some(now);
        self.expires_at = chrono::Duration::try_seconds(expires_in).and_then(|ttl| now.checked_add_signed(ttl));
    }

    pub fn clear_session(&mut self) {
        self.token = None;
        self.email = None;
        self.logged_in_at = None;
        self.expires_at = None;
    }

    pub fn require_token(&self) -> anyhow::Result<String> {
        self.token
            .clone()
            .ok_or_else(|| anyhow::anyhow!("Not logged in; run `pragxi login` first"))
    }
}

pub fn get_config_dir() -> anyhow::Result<PathBuf> {
    let config_dir = if let Ok(custom_dir) = std::env::var("PRAGXI_CLI_CONFIG_DIR") {
        PathBuf::from(custom_dir)
    } else {
        let home = std::env::var("HOME").map_err(|_| anyhow::anyhow!("HOME environment variable not set"))?;
        PathBuf::from(home).join(".config").join("pragxi").join("cli")
    };

    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

/// Directory holding one wizard session file per key
pub fn get_sessions_dir() -> anyhow::Result<PathBuf> {
    Ok(get_config_dir()?.join("sessions"))
}

pub fn load_auth_config() -> anyhow::Result<AuthConfig> {
    let config_dir = get_config_dir()?;
    let auth_file = config_dir.join("auth.json");

    if !auth_file.exists() {
        return Ok(AuthConfig::default());
    }

    let content = fs::read_to_string(auth_file)?;
    let config: AuthConfig = serde_json::from_str(&content)?;
    Ok(config)
}

pub fn save_auth_config(config: &AuthConfig) -> anyhow::Result<()> {
    let config_dir = get_config_dir()?;
    let auth_file = config_dir.join("auth.json");

    let content = serde_json::to_string_pretty(config)?;
    fs::write(auth_file, content)?;
    Ok(())
}
