#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use serde_json::{json, Value};

use pragxi_admin_api::baas::{Baas, MemoryBaas};
use pragxi_admin_api::config::AppConfig;
use pragxi_admin_api::{build_router, AppState};

pub const STAFF_EMAIL: &str = "ops@pragxi.com";
pub const STAFF_PASSWORD: &str = "correct horse battery staple";
pub const BUCKET: &str = "rider-documents";

/// Admin API served in-process on an ephemeral port over a fresh MemoryBaas
pub struct TestServer {
    pub base_url: String,
    pub memory: Arc<MemoryBaas>,
    pub token: String,
    pub client: Client,
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::development();
    config.server.enable_request_logging = false;
    config.security.enable_cors = false;
    config.enrollment.compensation_initial_backoff_ms = 1;
    config.enrollment.compensation_max_backoff_ms = 5;
    config
}

impl TestServer {
    pub async fn start() -> Result<Self> {
        Self::start_with(test_config()).await
    }

    pub async fn start_with(config: AppConfig) -> Result<Self> {
        let memory = Arc::new(MemoryBaas::new(
            config.security.jwt_secret.clone(),
            config.security.jwt_expiry_hours,
        ));
        memory.seed_user(STAFF_EMAIL, STAFF_PASSWORD, "admin").await;

        let app = build_router(AppState::new(config, Baas::from_memory(memory.clone())));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .context("failed to bind test listener")?;
        let base_url = format!("http://{}", listener.local_addr()?);
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let client = Client::new();
        let login: Value = client
            .post(format!("{}/auth/login", base_url))
            .json(&json!({ "email": STAFF_EMAIL, "password": STAFF_PASSWORD }))
            .send()
            .await?
            .json()
            .await?;
        let token = login["data"]["access_token"]
            .as_str()
            .context("login returned no token")?
            .to_string();

        Ok(Self {
            base_url,
            memory,
            token,
            client,
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn get(&self, path: &str) -> RequestBuilder {
        self.client.get(self.url(path)).bearer_auth(&self.token)
    }

    pub fn post(&self, path: &str) -> RequestBuilder {
        self.client.post(self.url(path)).bearer_auth(&self.token)
    }

    pub fn put(&self, path: &str) -> RequestBuilder {
        self.client.put(self.url(path)).bearer_auth(&self.token)
    }

    /// Runs step 1 and returns the new rider id
    pub async fn enroll_personal(&self, email: &str) -> Result<String> {
        let body: Value = self
            .post("/api/enrollment/personal")
            .json(&personal_form(email))
            .send()
            .await?
            .json()
            .await?;
        body["data"]["id"]
            .as_str()
            .map(str::to_string)
            .with_context(|| format!("personal step failed: {}", body))
    }
}

pub fn personal_form(email: &str) -> Value {
    json!({
        "first_name": "Kwame",
        "last_name": "Mensah",
        "email": email,
        "phone_number": "0241234567",
        "date_of_birth": "1992-03-14",
        "marital_status": "single",
        "gender": "male",
        "nationality": "Ghanaian",
        "city": "Accra",
        "gps_address": "GA-183-8164"
    })
}

pub fn date_from_today(days: i64) -> String {
    (Utc::now().date_naive() + Duration::days(days)).to_string()
}

pub fn security_form(insurance_expiration_date: &str) -> Value {
    json!({
        "vehicle_make": "Toyota",
        "vehicle_model": "Corolla",
        "vehicle_colour": "Silver",
        "vehicle_registration_number": "GR-4521-22",
        "license_number": "DL-0098812",
        "insurance_number": "INS-55120",
        "insurance_expiration_date": insurance_expiration_date,
        "witness_name": "Ama Owusu",
        "witness_phone_number": "0209876543",
        "witness_address": "12 Ring Road, Accra"
    })
}

pub fn finance_form(provider: &str, number: &str) -> Value {
    json!({ "service_provider": provider, "mobile_money_number": number })
}

fn file_part(name: &str, mime: &str) -> Part {
    Part::bytes(format!("contents of {}", name).into_bytes())
        .file_name(name.to_string())
        .mime_str(mime)
        .expect("valid mime type")
}

/// One identity card (front and back), one license, one insurance proof
pub fn document_form() -> Form {
    Form::new()
        .part("identity_card", file_part("front.png", "image/png"))
        .part("identity_card", file_part("back.png", "image/png"))
        .part("drivers_license", file_part("license.jpg", "image/jpeg"))
        .part("insurance_proof", file_part("policy.pdf", "application/pdf"))
}
