use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{header, Client, RequestBuilder, Response, StatusCode};
use serde_json::{json, Value};
use tracing::debug;
use url::Url;
use uuid::Uuid;

use super::{AuthApi, BaasError, Identity, NewIdentity, Session, StorageApi, TableApi};
use crate::config::BaasConfig;

/// REST client for the hosted BaaS (identity admin, table gateway, storage)
pub struct RestBaas {
    client: Client,
    base_url: Url,
    anon_key: String,
    service_role_key: String,
}

/// Which error variant a non-success response maps to by default
#[derive(Clone, Copy)]
enum Surface {
    Auth,
    Database,
    Storage,
}

impl RestBaas {
    pub fn new(config: &BaasConfig) -> Result<Self, BaasError> {
        if config.url.is_empty() {
            return Err(BaasError::Unavailable("BAAS_URL is not configured".to_string()));
        }
        if config.service_role_key.is_empty() {
            return Err(BaasError::Unavailable("BAAS_SERVICE_ROLE_KEY is not configured".to_string()));
        }

        let base_url = Url::parse(&config.url)
            .map_err(|e| BaasError::Unavailable(format!("BAAS_URL is invalid: {}", e)))?;
        if base_url.cannot_be_a_base() {
            return Err(BaasError::Unavailable(format!("BAAS_URL is not a base URL: {}", config.url)));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url,
            anon_key: config.anon_key.clone(),
            service_role_key: config.service_role_key.clone(),
        })
    }

    /// Appends `path` to the base URL segment by segment, percent-encoding each
    fn url(&self, path: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(path.split('/').filter(|segment| !segment.is_empty()));
        }
        url
    }

    /// Request carrying service-role credentials
    fn service(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.service_role_key)
            .bearer_auth(&self.service_role_key)
    }

    fn table_url(&self, table: &str) -> Url {
        self.url(&format!("/rest/v1/{}", table))
    }

    fn eq_filter(column: &str, value: &str) -> [(String, String); 1] {
        [(column.to_string(), format!("eq.{}", value))]
    }
}

fn extract_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["msg", "message", "error_description", "error"]
        .iter()
        .find_map(|key| value.get(*key).and_then(|v| v.as_str()).map(str::to_string))
}

async fn read_json(response: Response, surface: Surface) -> Result<Value, BaasError> {
    let status = response.status();
    if status.is_success() {
        if status == StatusCode::NO_CONTENT {
            return Ok(Value::Null);
        }
        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        return serde_json::from_str(&body).map_err(|e| BaasError::Decode(e.to_string()));
    }

    let body = response.text().await.unwrap_or_default();
    let message = extract_message(&body).unwrap_or_else(|| status.to_string());
    debug!("BaaS responded {}: {}", status, body);

    Err(match status {
        StatusCode::NOT_FOUND => BaasError::NotFound(message),
        StatusCode::CONFLICT => BaasError::Conflict(message),
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT => {
            BaasError::Unavailable(message)
        }
        _ => match surface {
            Surface::Auth => BaasError::Auth(message),
            Surface::Database => BaasError::Database(message),
            Surface::Storage => BaasError::Storage(message),
        },
    })
}

fn rows(value: Value) -> Vec<Value> {
    match value {
        Value::Array(rows) => rows,
        Value::Null => Vec::new(),
        other => vec![other],
    }
}

fn first_row(value: Value, table: &str) -> Result<Value, BaasError> {
    rows(value)
        .into_iter()
        .next()
        .ok_or_else(|| BaasError::Database(format!("{} returned no representation", table)))
}

/// Identity as encoded by the auth admin API
fn parse_identity(value: Value) -> Result<Identity, BaasError> {
    let id = value
        .get("id")
        .and_then(|v| v.as_str())
        .and_then(|s| Uuid::parse_str(s).ok())
        .ok_or_else(|| BaasError::Decode("user without id".to_string()))?;

    Ok(Identity {
        id,
        email: value.get("email").and_then(|v| v.as_str()).unwrap_or_default().to_string(),
        role: value
            .get("user_metadata")
            .and_then(|m| m.get("role"))
            .and_then(|r| r.as_str())
            .map(str::to_string),
        created_at: value
            .get("created_at")
            .and_then(|v| v.as_str())
            .and_then(|s| chrono::DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&chrono::Utc)),
    })
}

#[async_trait]
impl AuthApi for RestBaas {
    async fn create_user(&self, user: NewIdentity) -> Result<Identity, BaasError> {
        let body = json!({
            "id": user.id,
            "email": user.email,
            "password": user.password,
            "email_confirm": true,
            "user_metadata": user.metadata,
        });
        let response = self
            .service(self.client.post(self.url("/auth/v1/admin/users")))
            .json(&body)
            .send()
            .await?;
        parse_identity(read_json(response, Surface::Auth).await?)
    }

    async fn delete_user(&self, id: Uuid) -> Result<(), BaasError> {
        let response = self
            .service(self.client.delete(self.url(&format!("/auth/v1/admin/users/{}", id))))
            .send()
            .await?;
        read_json(response, Surface::Auth).await.map(|_| ())
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<Identity>, BaasError> {
        let response = self
            .service(self.client.get(self.url(&format!("/auth/v1/admin/users/{}", id))))
            .send()
            .await?;
        match read_json(response, Surface::Auth).await {
            Ok(value) => parse_identity(value).map(Some),
            Err(BaasError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, BaasError> {
        let response = self
            .client
            .post(self.url("/auth/v1/token"))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.anon_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        let value = read_json(response, Surface::Auth).await?;

        let access_token = value
            .get("access_token")
            .and_then(|v| v.as_str())
            .ok_or_else(|| BaasError::Decode("session without access_token".to_string()))?
            .to_string();
        let expires_in = value.get("expires_in").and_then(|v| v.as_i64()).unwrap_or(3600);
        let user = parse_identity(value.get("user").cloned().unwrap_or(Value::Null))?;

        Ok(Session {
            access_token,
            expires_in,
            user,
        })
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), BaasError> {
        let response = self
            .client
            .post(self.url("/auth/v1/logout"))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;
        read_json(response, Surface::Auth).await.map(|_| ())
    }

    async fn health(&self) -> Result<(), BaasError> {
        let response = self
            .client
            .get(self.url("/auth/v1/health"))
            .header("apikey", &self.anon_key)
            .send()
            .await
            .map_err(|e| BaasError::Unavailable(e.to_string()))?;
        read_json(response, Surface::Auth).await.map(|_| ())
    }
}

#[async_trait]
impl TableApi for RestBaas {
    async fn select_eq(
        &self,
        table: &str,
        column: &str,
        value: &str,
        order_desc_by: Option<&str>,
    ) -> Result<Vec<Value>, BaasError> {
        let mut request = self
            .service(self.client.get(self.table_url(table)))
            .query(&[("select", "*")])
            .query(&Self::eq_filter(column, value));
        if let Some(order) = order_desc_by {
            request = request.query(&[("order", format!("{}.desc", order))]);
        }
        let response = request.send().await?;
        Ok(rows(read_json(response, Surface::Database).await?))
    }

    async fn select_all(&self, table: &str, order_desc_by: Option<&str>) -> Result<Vec<Value>, BaasError> {
        let mut request = self
            .service(self.client.get(self.table_url(table)))
            .query(&[("select", "*")]);
        if let Some(order) = order_desc_by {
            request = request.query(&[("order", format!("{}.desc", order))]);
        }
        let response = request.send().await?;
        Ok(rows(read_json(response, Surface::Database).await?))
    }

    async fn insert(&self, table: &str, row: Value) -> Result<Value, BaasError> {
        let response = self
            .service(self.client.post(self.table_url(table)))
            .header("Prefer", "return=representation")
            .json(&row)
            .send()
            .await?;
        first_row(read_json(response, Surface::Database).await?, table)
    }

    async fn update_eq(
        &self,
        table: &str,
        column: &str,
        value: &str,
        patch: Value,
    ) -> Result<Vec<Value>, BaasError> {
        let response = self
            .service(self.client.patch(self.table_url(table)))
            .query(&Self::eq_filter(column, value))
            .header("Prefer", "return=representation")
            .json(&patch)
            .send()
            .await?;
        Ok(rows(read_json(response, Surface::Database).await?))
    }

    async fn upsert(&self, table: &str, row: Value, on_conflict: &str) -> Result<Value, BaasError> {
        let response = self
            .service(self.client.post(self.table_url(table)))
            .query(&[("on_conflict", on_conflict)])
            .header("Prefer", "resolution=merge-duplicates,return=representation")
            .json(&row)
            .send()
            .await?;
        first_row(read_json(response, Surface::Database).await?, table)
    }

    async fn delete_eq(&self, table: &str, column: &str, value: &str) -> Result<u64, BaasError> {
        let response = self
            .service(self.client.delete(self.table_url(table)))
            .query(&Self::eq_filter(column, value))
            .header("Prefer", "return=representation")
            .send()
            .await?;
        Ok(rows(read_json(response, Surface::Database).await?).len() as u64)
    }
}

#[async_trait]
impl StorageApi for RestBaas {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Bytes,
        content_type: &str,
        upsert: bool,
    ) -> Result<(), BaasError> {
        let response = self
            .service(self.client.post(self.url(&format!("/storage/v1/object/{}/{}", bucket, path))))
            .header(header::CONTENT_TYPE, content_type)
            .header("x-upsert", if upsert { "true" } else { "false" })
            .body(bytes)
            .send()
            .await?;
        read_json(response, Surface::Storage).await.map(|_| ())
    }

    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<(), BaasError> {
        if paths.is_empty() {
            return Ok(());
        }
        let response = self
            .service(self.client.delete(self.url(&format!("/storage/v1/object/{}", bucket))))
            .json(&json!({ "prefixes": paths }))
            .send()
            .await?;
        read_json(response, Surface::Storage).await.map(|_| ())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        self.url(&format!("/storage/v1/object/public/{}/{}", bucket, path)).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_backend_error_messages() {
        assert_eq!(
            extract_message(r#"{"msg":"User already registered"}"#).as_deref(),
            Some("User already registered")
        );
        assert_eq!(
            extract_message(r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#)
                .as_deref(),
            Some("Invalid login credentials")
        );
        assert_eq!(extract_message("<html>"), None);
    }

    #[test]
    fn parses_identity_role_from_metadata() {
        let identity = parse_identity(json!({
            "id": "7a6b5c4d-0000-4000-8000-000000000001",
            "email": "rider@pragxi.com",
            "user_metadata": { "role": "rider" },
            "created_at": "2024-03-01T10:00:00Z"
        }))
        .unwrap();
        assert_eq!(identity.role.as_deref(), Some("rider"));
        assert!(identity.created_at.is_some());
    }

    fn config(url: &str) -> BaasConfig {
        BaasConfig {
            backend: crate::config::BackendKind::Rest,
            url: url.to_string(),
            anon_key: "anon".to_string(),
            service_role_key: "service".to_string(),
            timeout_secs: 5,
        }
    }

    #[test]
    fn rejects_missing_configuration() {
        let mut missing = config("");
        missing.service_role_key = String::new();
        assert!(RestBaas::new(&missing).is_err());
        assert!(RestBaas::new(&config("not a url")).is_err());
        assert!(RestBaas::new(&config("mailto:ops@pragxi.com")).is_err());
    }

    #[test]
    fn endpoint_urls_keep_the_base_path_and_encode_segments() {
        let baas = RestBaas::new(&config("https://project.example.co/gateway/")).unwrap();

        assert_eq!(
            baas.table_url("rider_finance").as_str(),
            "https://project.example.co/gateway/rest/v1/rider_finance"
        );
        assert_eq!(
            baas.public_url("rider-documents", "r1/identity_card/0-front scan.png"),
            "https://project.example.co/gateway/storage/v1/object/public/rider-documents/r1/identity_card/0-front%20scan.png"
        );
    }
}
