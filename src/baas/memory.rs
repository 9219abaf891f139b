use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use serde_json::{json, Map, Value};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{AuthApi, BaasError, Identity, NewIdentity, Session, StorageApi, TableApi};
use crate::auth::{generate_jwt, Claims};
use crate::models::tables::USERS as USERS_TABLE;

/// In-process BaaS used for development runs and tests.
///
/// Behaves like the hosted service for everything the API relies on and
/// carries switchable faults so failure paths can be exercised.
pub struct MemoryBaas {
    jwt_secret: String,
    jwt_expiry_hours: u64,
    state: RwLock<MemoryState>,
    faults: RwLock<Faults>,
}

#[derive(Default)]
struct MemoryState {
    users: HashMap<Uuid, MemoryUser>,
    tables: HashMap<String, Vec<Map<String, Value>>>,
    objects: BTreeMap<(String, String), MemoryObject>,
}

struct MemoryUser {
    identity: Identity,
    password: String,
}

#[derive(Debug, Clone)]
pub struct MemoryObject {
    pub bytes: Bytes,
    pub content_type: String,
}

#[derive(Default)]
struct Faults {
    failing_writes: HashSet<String>,
    failing_reads: HashSet<String>,
    failing_uploads: Vec<String>,
    failing_user_creation: Option<String>,
    failing_user_deletes: u32,
}

impl MemoryBaas {
    pub fn new(jwt_secret: impl Into<String>, jwt_expiry_hours: u64) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            jwt_expiry_hours,
            state: RwLock::new(MemoryState::default()),
            faults: RwLock::new(Faults::default()),
        }
    }

    // Fault injection

    /// Every insert/update/upsert/delete on `table` fails
    pub async fn fail_writes_to(&self, table: &str) {
        self.faults.write().await.failing_writes.insert(table.to_string());
    }

    /// Every select on `table` fails
    pub async fn fail_reads_from(&self, table: &str) {
        self.faults.write().await.failing_reads.insert(table.to_string());
    }

    /// Uploads whose path contains `fragment` fail
    pub async fn fail_uploads_matching(&self, fragment: &str) {
        self.faults.write().await.failing_uploads.push(fragment.to_string());
    }

    pub async fn fail_user_creation(&self, message: &str) {
        self.faults.write().await.failing_user_creation = Some(message.to_string());
    }

    /// The next `count` calls to `delete_user` fail with `Unavailable`
    pub async fn fail_next_user_deletes(&self, count: u32) {
        self.faults.write().await.failing_user_deletes = count;
    }

    pub async fn clear_faults(&self) {
        *self.faults.write().await = Faults::default();
    }

    // Seeding and inspection

    pub async fn seed_user(&self, email: &str, password: &str, role: &str) -> Identity {
        let identity = Identity {
            id: Uuid::new_v4(),
            email: email.to_string(),
            role: Some(role.to_string()),
            created_at: Some(Utc::now()),
        };
        self.state.write().await.users.insert(
            identity.id,
            MemoryUser {
                identity: identity.clone(),
                password: password.to_string(),
            },
        );
        identity
    }

    pub async fn seed_row(&self, table: &str, row: Value) {
        let mut state = self.state.write().await;
        if let Value::Object(map) = row {
            state.tables.entry(table.to_string()).or_default().push(with_defaults(map));
        }
    }

    pub async fn user_count(&self) -> usize {
        self.state.read().await.users.len()
    }

    pub async fn rows(&self, table: &str) -> Vec<Value> {
        self.state
            .read()
            .await
            .tables
            .get(table)
            .map(|rows| rows.iter().cloned().map(Value::Object).collect())
            .unwrap_or_default()
    }

    pub async fn object_paths(&self, bucket: &str) -> Vec<String> {
        self.state
            .read()
            .await
            .objects
            .keys()
            .filter(|(b, _)| b == bucket)
            .map(|(_, path)| path.clone())
            .collect()
    }

    pub async fn object(&self, bucket: &str, path: &str) -> Option<MemoryObject> {
        self.state
            .read()
            .await
            .objects
            .get(&(bucket.to_string(), path.to_string()))
            .cloned()
    }

    async fn check_write(&self, table: &str) -> Result<(), BaasError> {
        if self.faults.read().await.failing_writes.contains(table) {
            return Err(BaasError::Database(format!("write to {} rejected", table)));
        }
        Ok(())
    }

    async fn check_read(&self, table: &str) -> Result<(), BaasError> {
        if self.faults.read().await.failing_reads.contains(table) {
            return Err(BaasError::Database(format!("read from {} rejected", table)));
        }
        Ok(())
    }
}

fn with_defaults(mut row: Map<String, Value>) -> Map<String, Value> {
    let now = Utc::now().to_rfc3339();
    row.entry("id").or_insert_with(|| json!(Uuid::new_v4()));
    row.entry("created_at").or_insert_with(|| json!(now.clone()));
    row.entry("updated_at").or_insert_with(|| json!(now));
    row
}

fn matches(row: &Map<String, Value>, column: &str, value: &str) -> bool {
    match row.get(column) {
        Some(Value::String(s)) => s == value,
        Some(Value::Null) | None => false,
        Some(other) => other.to_string() == value,
    }
}

fn merge(row: &mut Map<String, Value>, patch: Map<String, Value>) {
    for (key, value) in patch {
        if key == "id" || key == "created_at" {
            continue;
        }
        row.insert(key, value);
    }
    row.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));
}

/// Newest first by `column`; among equal keys the later insert wins
fn sort_desc(rows: &mut [Map<String, Value>], column: &str) {
    let key = |row: &Map<String, Value>| row.get(column).map(|v| v.to_string()).unwrap_or_default();
    rows.reverse();
    rows.sort_by(|a, b| key(b).cmp(&key(a)));
}

fn into_object(row: Value) -> Result<Map<String, Value>, BaasError> {
    match row {
        Value::Object(map) => Ok(map),
        other => Err(BaasError::Database(format!("expected a JSON object row, got {}", other))),
    }
}

#[async_trait]
impl AuthApi for MemoryBaas {
    async fn create_user(&self, user: NewIdentity) -> Result<Identity, BaasError> {
        if let Some(message) = self.faults.read().await.failing_user_creation.clone() {
            return Err(BaasError::Auth(message));
        }

        let mut state = self.state.write().await;
        if state.users.values().any(|u| u.identity.email.eq_ignore_ascii_case(&user.email)) {
            return Err(BaasError::Auth("A user with this email address has already been registered".to_string()));
        }
        if state.users.contains_key(&user.id) {
            return Err(BaasError::Conflict(format!("user {} already exists", user.id)));
        }

        let identity = Identity {
            id: user.id,
            email: user.email,
            role: user.metadata.get("role").and_then(|r| r.as_str()).map(str::to_string),
            created_at: Some(Utc::now()),
        };
        state.users.insert(
            identity.id,
            MemoryUser {
                identity: identity.clone(),
                password: user.password,
            },
        );
        // The hosted service mirrors new identities into the general users table
        let mirror = json!({ "id": identity.id, "email": identity.email, "role": identity.role });
        if let Value::Object(row) = mirror {
            state.tables.entry(USERS_TABLE.to_string()).or_default().push(with_defaults(row));
        }
        Ok(identity)
    }

    async fn delete_user(&self, id: Uuid) -> Result<(), BaasError> {
        {
            let mut faults = self.faults.write().await;
            if faults.failing_user_deletes > 0 {
                faults.failing_user_deletes -= 1;
                return Err(BaasError::Unavailable("auth admin temporarily unavailable".to_string()));
            }
        }

        match self.state.write().await.users.remove(&id) {
            Some(_) => Ok(()),
            None => Err(BaasError::NotFound(format!("user {}", id))),
        }
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<Identity>, BaasError> {
        Ok(self.state.read().await.users.get(&id).map(|u| u.identity.clone()))
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, BaasError> {
        let identity = {
            let state = self.state.read().await;
            state
                .users
                .values()
                .find(|u| u.identity.email.eq_ignore_ascii_case(email) && u.password == password)
                .map(|u| u.identity.clone())
                .ok_or_else(|| BaasError::Auth("Invalid login credentials".to_string()))?
        };

        let claims = Claims::for_identity(&identity, self.jwt_expiry_hours);
        let access_token =
            generate_jwt(&claims, &self.jwt_secret).map_err(|e| BaasError::Auth(e.to_string()))?;

        Ok(Session {
            access_token,
            expires_in: claims.exp - claims.iat,
            user: identity,
        })
    }

    // Tokens are stateless JWTs; there is no server-side session to drop
    async fn sign_out(&self, _access_token: &str) -> Result<(), BaasError> {
        Ok(())
    }

    async fn health(&self) -> Result<(), BaasError> {
        Ok(())
    }
}

#[async_trait]
impl TableApi for MemoryBaas {
    async fn select_eq(
        &self,
        table: &str,
        column: &str,
        value: &str,
        order_desc_by: Option<&str>,
    ) -> Result<Vec<Value>, BaasError> {
        self.check_read(table).await?;
        let state = self.state.read().await;
        let mut rows: Vec<Map<String, Value>> = state
            .tables
            .get(table)
            .map(|rows| rows.iter().filter(|row| matches(row, column, value)).cloned().collect())
            .unwrap_or_default();
        if let Some(order) = order_desc_by {
            sort_desc(&mut rows, order);
        }
        Ok(rows.into_iter().map(Value::Object).collect())
    }

    async fn select_all(&self, table: &str, order_desc_by: Option<&str>) -> Result<Vec<Value>, BaasError> {
        self.check_read(table).await?;
        let state = self.state.read().await;
        let mut rows: Vec<Map<String, Value>> = state.tables.get(table).cloned().unwrap_or_default();
        if let Some(order) = order_desc_by {
            sort_desc(&mut rows, order);
        }
        Ok(rows.into_iter().map(Value::Object).collect())
    }

    async fn insert(&self, table: &str, row: Value) -> Result<Value, BaasError> {
        self.check_write(table).await?;
        let row = with_defaults(into_object(row)?);
        self.state
            .write()
            .await
            .tables
            .entry(table.to_string())
            .or_default()
            .push(row.clone());
        Ok(Value::Object(row))
    }

    async fn update_eq(
        &self,
        table: &str,
        column: &str,
        value: &str,
        patch: Value,
    ) -> Result<Vec<Value>, BaasError> {
        self.check_write(table).await?;
        let patch = into_object(patch)?;
        let mut state = self.state.write().await;
        let mut updated = Vec::new();
        if let Some(rows) = state.tables.get_mut(table) {
            for row in rows.iter_mut().filter(|row| matches(row, column, value)) {
                merge(row, patch.clone());
                updated.push(Value::Object(row.clone()));
            }
        }
        Ok(updated)
    }

    async fn upsert(&self, table: &str, row: Value, on_conflict: &str) -> Result<Value, BaasError> {
        self.check_write(table).await?;
        let row = into_object(row)?;
        let key = row
            .get(on_conflict)
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .ok_or_else(|| BaasError::Database(format!("upsert row is missing conflict column {}", on_conflict)))?;

        // Single write lock: the lookup and the write are one atomic step
        let mut state = self.state.write().await;
        let rows = state.tables.entry(table.to_string()).or_default();
        if let Some(existing) = rows.iter_mut().find(|r| matches(r, on_conflict, &key)) {
            merge(existing, row);
            return Ok(Value::Object(existing.clone()));
        }
        let row = with_defaults(row);
        rows.push(row.clone());
        Ok(Value::Object(row))
    }

    async fn delete_eq(&self, table: &str, column: &str, value: &str) -> Result<u64, BaasError> {
        self.check_write(table).await?;
        let mut state = self.state.write().await;
        let Some(rows) = state.tables.get_mut(table) else {
            return Ok(0);
        };
        let before = rows.len();
        rows.retain(|row| !matches(row, column, value));
        Ok((before - rows.len()) as u64)
    }
}

#[async_trait]
impl StorageApi for MemoryBaas {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Bytes,
        content_type: &str,
        upsert: bool,
    ) -> Result<(), BaasError> {
        if self
            .faults
            .read()
            .await
            .failing_uploads
            .iter()
            .any(|fragment| path.contains(fragment.as_str()))
        {
            return Err(BaasError::Storage(format!("upload of {} rejected", path)));
        }

        let key = (bucket.to_string(), path.to_string());
        let mut state = self.state.write().await;
        if !upsert && state.objects.contains_key(&key) {
            return Err(BaasError::Conflict(format!("object {} already exists", path)));
        }
        state.objects.insert(
            key,
            MemoryObject {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<(), BaasError> {
        let mut state = self.state.write().await;
        for path in paths {
            state.objects.remove(&(bucket.to_string(), path.clone()));
        }
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("memory://storage/{}/{}", bucket, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> MemoryBaas {
        MemoryBaas::new("test-secret", 1)
    }

    #[tokio::test]
    async fn upsert_merges_on_conflict_column() {
        let baas = backend();
        baas.upsert("rider_finance", json!({"rider_id": "r1", "mobile_money_number": "0241111111"}), "rider_id")
            .await
            .unwrap();
        let second = baas
            .upsert("rider_finance", json!({"rider_id": "r1", "mobile_money_number": "0242222222"}), "rider_id")
            .await
            .unwrap();

        let rows = baas.rows("rider_finance").await;
        assert_eq!(rows.len(), 1);
        assert_eq!(second["mobile_money_number"], "0242222222");
    }

    #[tokio::test]
    async fn update_reports_matched_rows_only() {
        let baas = backend();
        baas.insert("things", json!({"rider_id": "a", "v": 1})).await.unwrap();

        let none = baas.update_eq("things", "rider_id", "b", json!({"v": 2})).await.unwrap();
        let one = baas.update_eq("things", "rider_id", "a", json!({"v": 2})).await.unwrap();

        assert!(none.is_empty());
        assert_eq!(one.len(), 1);
        assert_eq!(one[0]["v"], 2);
    }

    #[tokio::test]
    async fn ordered_select_puts_newest_first() {
        let baas = backend();
        baas.seed_row("things", json!({"rider_id": "a", "v": 1, "created_at": "2024-05-02T08:00:00+00:00"}))
            .await;
        baas.seed_row("things", json!({"rider_id": "a", "v": 2, "created_at": "2024-05-01T08:00:00+00:00"}))
            .await;
        baas.seed_row("things", json!({"rider_id": "b", "v": 3})).await;

        let rows = baas.select_eq("things", "rider_id", "a", Some("created_at")).await.unwrap();
        assert_eq!(rows.iter().map(|r| r["v"].clone()).collect::<Vec<_>>(), vec![json!(1), json!(2)]);
    }

    #[tokio::test]
    async fn write_faults_are_table_scoped() {
        let baas = backend();
        baas.fail_writes_to("broken").await;

        assert!(baas.insert("broken", json!({"a": 1})).await.is_err());
        assert!(baas.insert("fine", json!({"a": 1})).await.is_ok());
    }

    #[tokio::test]
    async fn deleting_missing_user_is_not_found() {
        let baas = backend();
        let err = baas.delete_user(Uuid::new_v4()).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn sign_in_issues_token_for_seeded_user() {
        let baas = backend();
        baas.seed_user("ops@pragxi.com", "hunter22", "admin").await;

        let session = baas.sign_in_with_password("ops@pragxi.com", "hunter22").await.unwrap();
        let claims = crate::auth::validate_jwt(&session.access_token, "test-secret").unwrap();
        assert_eq!(claims.app_role(), Some("admin"));

        assert!(baas.sign_in_with_password("ops@pragxi.com", "wrong").await.is_err());
    }

    #[tokio::test]
    async fn non_upsert_upload_refuses_overwrite() {
        let baas = backend();
        let bytes = Bytes::from_static(b"x");
        baas.upload("b", "p", bytes.clone(), "text/plain", false).await.unwrap();
        assert!(baas.upload("b", "p", bytes.clone(), "text/plain", false).await.is_err());
        assert!(baas.upload("b", "p", bytes, "text/plain", true).await.is_ok());
    }
}
