//! Client side of the hosted backend-as-a-service.
//!
//! The service is split into three collaborators that mirror what the BaaS
//! exposes: identity administration, table access behind the REST gateway,
//! and object storage. Each is an object-safe async trait so the server can
//! hold them as `Arc<dyn …>` and swap the REST client for the in-memory one.

pub mod error;
pub mod memory;
pub mod rest;

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

pub use error::BaasError;
pub use memory::MemoryBaas;
pub use rest::RestBaas;

use crate::config::{AppConfig, BackendKind};

/// Identity to create through the admin API. The id is chosen by the caller.
#[derive(Debug, Clone)]
pub struct NewIdentity {
    pub id: Uuid,
    pub email: String,
    pub password: String,
    pub metadata: Value,
}

/// Identity as returned by the BaaS auth service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
    /// Application role from the identity's user metadata ("rider", "admin", ...)
    pub role: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub expires_in: i64,
    pub user: Identity,
}

#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn create_user(&self, user: NewIdentity) -> Result<Identity, BaasError>;

    /// Deletes with elevated (service) credentials. Missing users yield `NotFound`.
    async fn delete_user(&self, id: Uuid) -> Result<(), BaasError>;

    async fn get_user(&self, id: Uuid) -> Result<Option<Identity>, BaasError>;

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, BaasError>;

    async fn sign_out(&self, access_token: &str) -> Result<(), BaasError>;

    async fn health(&self) -> Result<(), BaasError>;
}

#[async_trait]
pub trait TableApi: Send + Sync {
    /// Rows where `column` equals `value`, optionally ordered descending by `order_desc_by`
    async fn select_eq(
        &self,
        table: &str,
        column: &str,
        value: &str,
        order_desc_by: Option<&str>,
    ) -> Result<Vec<Value>, BaasError>;

    /// All rows, optionally ordered descending by `order_desc_by`
    async fn select_all(&self, table: &str, order_desc_by: Option<&str>) -> Result<Vec<Value>, BaasError>;

    async fn insert(&self, table: &str, row: Value) -> Result<Value, BaasError>;

    /// Returns the rows that were updated (empty when nothing matched)
    async fn update_eq(
        &self,
        table: &str,
        column: &str,
        value: &str,
        patch: Value,
    ) -> Result<Vec<Value>, BaasError>;

    /// Native insert-or-merge keyed on the unique column `on_conflict`
    async fn upsert(&self, table: &str, row: Value, on_conflict: &str) -> Result<Value, BaasError>;

    /// Returns the number of rows deleted
    async fn delete_eq(&self, table: &str, column: &str, value: &str) -> Result<u64, BaasError>;
}

#[async_trait]
pub trait StorageApi: Send + Sync {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Bytes,
        content_type: &str,
        upsert: bool,
    ) -> Result<(), BaasError>;

    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<(), BaasError>;

    fn public_url(&self, bucket: &str, path: &str) -> String;
}

/// Handle bundling the three collaborators. Cheap to clone.
#[derive(Clone)]
pub struct Baas {
    pub auth: Arc<dyn AuthApi>,
    pub tables: Arc<dyn TableApi>,
    pub storage: Arc<dyn StorageApi>,
}

impl Baas {
    pub fn from_memory(memory: Arc<MemoryBaas>) -> Self {
        Self {
            auth: memory.clone(),
            tables: memory.clone(),
            storage: memory,
        }
    }

    pub fn from_rest(rest: Arc<RestBaas>) -> Self {
        Self {
            auth: rest.clone(),
            tables: rest.clone(),
            storage: rest,
        }
    }

    /// Build the client selected by configuration
    pub fn from_config(config: &AppConfig) -> Result<Self, BaasError> {
        match config.baas.backend {
            BackendKind::Memory => Ok(Self::from_memory(Arc::new(MemoryBaas::new(
                config.security.jwt_secret.clone(),
                config.security.jwt_expiry_hours,
            )))),
            BackendKind::Rest => Ok(Self::from_rest(Arc::new(RestBaas::new(&config.baas)?))),
        }
    }
}

/// Decode the first row, if any
pub fn decode_first<T: DeserializeOwned>(rows: Vec<Value>) -> Result<Option<T>, BaasError> {
    match rows.into_iter().next() {
        Some(row) => decode(row).map(Some),
        None => Ok(None),
    }
}

pub fn decode_rows<T: DeserializeOwned>(rows: Vec<Value>) -> Result<Vec<T>, BaasError> {
    rows.into_iter().map(decode).collect()
}

pub fn decode<T: DeserializeOwned>(row: Value) -> Result<T, BaasError> {
    serde_json::from_value(row).map_err(|e| BaasError::Decode(e.to_string()))
}
