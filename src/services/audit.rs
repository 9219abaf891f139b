use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{error, warn};

use super::ActionError;
use crate::auth::StaffUser;
use crate::baas::{decode_rows, TableApi};
use crate::models::{tables, AuditEntry, RiderId};

/// Action names written to `audit_logs`
pub mod actions {
    pub const RIDER_CREATE: &str = "rider.create";
    pub const RIDER_SECURITY_CREATE: &str = "rider.security.create";
    pub const RIDER_DOCUMENTS_CREATE: &str = "rider.documents.create";
    pub const RIDER_FINANCE_UPSERT: &str = "rider.finance.upsert";
    pub const RIDER_PERSONAL_UPDATE: &str = "rider.personal.update";
    pub const RIDER_SECURITY_UPDATE: &str = "rider.security.update";
}

#[derive(Clone)]
pub struct AuditLog {
    tables: Arc<dyn TableApi>,
}

impl AuditLog {
    pub fn new(tables: Arc<dyn TableApi>) -> Self {
        Self { tables }
    }

    /// Append an entry. Failures are logged and swallowed so the action
    /// being audited still succeeds.
    pub async fn record(&self, actor: &StaffUser, action: &str, target: &RiderId, details: Value) {
        let row = json!({
            "actor_id": actor.id,
            "actor_email": actor.email,
            "action": action,
            "target_id": target.to_string(),
            "details": details,
        });

        if let Err(e) = self.tables.insert(tables::AUDIT_LOGS, row).await {
            warn!("Failed to write audit entry {} for {}: {}", action, target, e);
        }
    }

    /// Newest first
    pub async fn list(&self) -> Result<Vec<AuditEntry>, ActionError> {
        let rows = self
            .tables
            .select_all(tables::AUDIT_LOGS, Some("created_at"))
            .await
            .map_err(|e| {
                error!("Failed to list audit entries: {}", e);
                ActionError::Upstream("Failed to load audit log".to_string())
            })?;

        decode_rows(rows).map_err(|e| {
            error!("Malformed audit entry: {}", e);
            ActionError::Upstream("Failed to load audit log".to_string())
        })
    }
}
