// services/riders.rs - Rider read model and the edit path outside the wizard

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::error;

use super::audit::actions;
use super::{today, ActionError, AuditLog};
use crate::auth::StaffUser;
use crate::baas::{decode, decode_rows, Baas, BaasError};
use crate::models::{
    tables, DocumentRecord, FinanceRecord, PersonalInfoForm, PersonalInfoRecord, RiderId, RiderRecord,
    SecurityInfoForm, SecurityInfoRecord,
};

const LOAD_FAILED: &str = "Failed to load rider";

#[derive(Clone)]
pub struct RiderService {
    baas: Baas,
    audit: AuditLog,
}

impl RiderService {
    pub fn new(baas: Baas, audit: AuditLog) -> Self {
        Self { baas, audit }
    }

    /// Newest row for the rider in `table`, if any
    async fn latest<T: DeserializeOwned>(&self, table: &str, rider_id: &RiderId) -> Result<Option<T>, BaasError> {
        let rows = self
            .baas
            .tables
            .select_eq(table, "rider_id", &rider_id.to_string(), Some("created_at"))
            .await?;
        rows.into_iter().next().map(decode).transpose()
    }

    pub async fn get_rider(&self, rider_id: RiderId) -> Result<RiderRecord, ActionError> {
        let (personal, security, documents, finance) = tokio::try_join!(
            self.latest::<PersonalInfoRecord>(tables::PERSONAL_INFO, &rider_id),
            self.latest::<SecurityInfoRecord>(tables::SECURITY_INFO, &rider_id),
            self.latest::<DocumentRecord>(tables::DOCUMENTS, &rider_id),
            self.latest::<FinanceRecord>(tables::FINANCE, &rider_id),
        )
        .map_err(|e| {
            error!("Failed to load rider {}: {}", rider_id, e);
            ActionError::Upstream(LOAD_FAILED.to_string())
        })?;

        if personal.is_none() {
            return Err(ActionError::NotFound(format!("Rider {} not found", rider_id)));
        }

        Ok(RiderRecord {
            id: rider_id,
            personal,
            security,
            documents,
            finance,
        })
    }

    pub async fn list_riders(&self) -> Result<Vec<PersonalInfoRecord>, ActionError> {
        let rows = self
            .baas
            .tables
            .select_all(tables::PERSONAL_INFO, Some("created_at"))
            .await
            .map_err(|e| {
                error!("Failed to list riders: {}", e);
                ActionError::Upstream("Failed to load riders".to_string())
            })?;

        decode_rows(rows).map_err(|e| {
            error!("Malformed rider row: {}", e);
            ActionError::Upstream("Failed to load riders".to_string())
        })
    }

    /// The email belongs to the rider's identity and cannot change here
    pub async fn update_personal(
        &self,
        actor: &StaffUser,
        rider_id: RiderId,
        form: &PersonalInfoForm,
    ) -> Result<PersonalInfoRecord, ActionError> {
        let info = form.validate(today()).map_err(ActionError::Validation)?;

        let current = self
            .latest::<PersonalInfoRecord>(tables::PERSONAL_INFO, &rider_id)
            .await
            .map_err(|e| {
                error!("Failed to load rider {}: {}", rider_id, e);
                ActionError::Upstream(LOAD_FAILED.to_string())
            })?
            .ok_or_else(|| ActionError::NotFound(format!("Rider {} not found", rider_id)))?;

        if current.info.email != info.email {
            return Err(ActionError::issue("email", "Email cannot be changed"));
        }

        let patch = encode(&info, "Failed to update rider information")?;
        let updated: PersonalInfoRecord = self
            .update_one(tables::PERSONAL_INFO, &rider_id, patch, "Failed to update rider information")
            .await?;

        self.audit
            .record(actor, actions::RIDER_PERSONAL_UPDATE, &rider_id, json!({}))
            .await;
        Ok(updated)
    }

    /// Edit path for step 2 data: updates the existing row instead of
    /// inserting another one
    pub async fn update_security(
        &self,
        actor: &StaffUser,
        rider_id: RiderId,
        form: &SecurityInfoForm,
    ) -> Result<SecurityInfoRecord, ActionError> {
        let info = form.validate(today()).map_err(ActionError::Validation)?;

        let patch = encode(&info, "Failed to update security information")?;
        let updated: SecurityInfoRecord = self
            .update_one(tables::SECURITY_INFO, &rider_id, patch, "Failed to update security information")
            .await?;

        self.audit
            .record(
                actor,
                actions::RIDER_SECURITY_UPDATE,
                &rider_id,
                json!({ "vehicle_registration_number": updated.info.vehicle_registration_number }),
            )
            .await;
        Ok(updated)
    }

    async fn update_one<T: DeserializeOwned>(
        &self,
        table: &str,
        rider_id: &RiderId,
        patch: Value,
        failure: &str,
    ) -> Result<T, ActionError> {
        let rows = self
            .baas
            .tables
            .update_eq(table, "rider_id", &rider_id.to_string(), patch)
            .await
            .map_err(|e| {
                error!("Update of {} for rider {} failed: {}", table, rider_id, e);
                ActionError::Upstream(failure.to_string())
            })?;

        let Some(row) = rows.into_iter().last() else {
            return Err(ActionError::NotFound(format!("Rider {} not found", rider_id)));
        };
        decode(row).map_err(|e| {
            error!("Malformed {} row for rider {}: {}", table, rider_id, e);
            ActionError::Upstream(failure.to_string())
        })
    }
}

fn encode<T: Serialize>(value: &T, failure: &str) -> Result<Value, ActionError> {
    serde_json::to_value(value).map_err(|e| {
        error!("Failed to encode patch: {}", e);
        ActionError::Upstream(failure.to_string())
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::baas::MemoryBaas;
    use crate::models::personal::tests::valid_form as personal_form;
    use crate::models::security::tests::valid_form as security_form;
    use crate::services::enrollment::test_support::staff;

    fn service() -> (RiderService, Arc<MemoryBaas>) {
        let memory = Arc::new(MemoryBaas::new("test-secret", 1));
        let baas = Baas::from_memory(memory.clone());
        let audit = AuditLog::new(baas.tables.clone());
        (RiderService::new(baas, audit), memory)
    }

    async fn seed_personal(memory: &MemoryBaas, rider: RiderId) {
        let info = personal_form("kwame@example.com").validate(today()).unwrap();
        let row = serde_json::to_value(PersonalInfoRecord::new(rider, info)).unwrap();
        memory.seed_row(tables::PERSONAL_INFO, row).await;
    }

    #[tokio::test]
    async fn missing_personal_record_is_not_found() {
        let (service, _) = service();
        let err = service.get_rider(RiderId::new()).await.unwrap_err();
        assert!(matches!(err, ActionError::NotFound(_)));
    }

    #[tokio::test]
    async fn assembles_partial_record() {
        let (service, memory) = service();
        let rider = RiderId::new();
        seed_personal(&memory, rider).await;

        let record = service.get_rider(rider).await.unwrap();
        assert_eq!(record.id, rider);
        assert!(record.personal.is_some());
        assert!(record.security.is_none() && record.documents.is_none() && record.finance.is_none());
    }

    #[tokio::test]
    async fn newest_security_row_wins() {
        let (service, memory) = service();
        let rider = RiderId::new();
        seed_personal(&memory, rider).await;

        for (colour, created_at) in [("Blue", "2024-06-02T09:00:00+00:00"), ("Red", "2024-06-01T09:00:00+00:00")] {
            let mut info = security_form("2099-01-01").validate(today()).unwrap();
            info.vehicle_colour = colour.to_string();
            let mut row = serde_json::to_value(SecurityInfoRecord::new(rider, info)).unwrap();
            row["created_at"] = json!(created_at);
            memory.seed_row(tables::SECURITY_INFO, row).await;
        }

        let record = service.get_rider(rider).await.unwrap();
        assert_eq!(record.security.unwrap().info.vehicle_colour, "Blue");
    }

    #[tokio::test]
    async fn email_is_immutable_on_edit() {
        let (service, memory) = service();
        let rider = RiderId::new();
        seed_personal(&memory, rider).await;

        let err = service
            .update_personal(&staff(), rider, &personal_form("other@example.com"))
            .await
            .unwrap_err();
        match err {
            ActionError::Validation(issues) => assert_eq!(issues[0].field, "email"),
            other => panic!("unexpected {:?}", other),
        }

        let mut form = personal_form("kwame@example.com");
        form.city = "Kumasi".to_string();
        let updated = service.update_personal(&staff(), rider, &form).await.unwrap();
        assert_eq!(updated.info.city, "Kumasi");
    }

    #[tokio::test]
    async fn security_update_without_row_is_not_found() {
        let (service, memory) = service();
        let err = service
            .update_security(&staff(), RiderId::new(), &security_form("2099-01-01"))
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::NotFound(_)));
        assert!(memory.rows(tables::SECURITY_INFO).await.is_empty());
    }
}
