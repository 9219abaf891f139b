use serde_json::json;
use tracing::error;

use super::EnrollmentService;
use crate::auth::StaffUser;
use crate::baas::decode;
use crate::models::{tables, RiderId, SecurityInfoForm, SecurityInfoRecord};
use crate::services::audit::actions;
use crate::services::{today, ActionError};

const SAVE_FAILED: &str = "Failed to save security information";

impl EnrollmentService {
    /// Step 2: plain insert keyed by the rider id. Re-submitting inserts
    /// again; corrections go through the rider edit path.
    pub async fn create_security(
        &self,
        actor: &StaffUser,
        rider_id: RiderId,
        form: &SecurityInfoForm,
    ) -> Result<SecurityInfoRecord, ActionError> {
        let info = form.validate(today()).map_err(ActionError::Validation)?;

        let record = SecurityInfoRecord::new(rider_id, info);
        let row = serde_json::to_value(&record).map_err(|e| {
            error!("Failed to encode security record: {}", e);
            ActionError::Upstream(SAVE_FAILED.to_string())
        })?;

        let saved = self
            .baas
            .tables
            .insert(tables::SECURITY_INFO, row)
            .await
            .and_then(decode::<SecurityInfoRecord>)
            .map_err(|e| {
                error!("Security record insert for rider {} failed: {}", rider_id, e);
                ActionError::Upstream(SAVE_FAILED.to_string())
            })?;

        self.audit
            .record(
                actor,
                actions::RIDER_SECURITY_CREATE,
                &rider_id,
                json!({ "vehicle_registration_number": saved.info.vehicle_registration_number }),
            )
            .await;

        Ok(saved)
    }
}
