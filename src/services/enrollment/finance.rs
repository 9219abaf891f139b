use serde_json::json;
use tracing::{error, warn};

use super::EnrollmentService;
use crate::auth::StaffUser;
use crate::baas::decode;
use crate::models::{tables, FinanceForm, FinanceRecord, RiderId};
use crate::services::audit::actions;
use crate::services::ActionError;

const UPDATE_FAILED: &str = "Failed to update finance information";
const CREATE_FAILED: &str = "Failed to create finance information";

impl EnrollmentService {
    /// Step 4: a single upsert keyed on `rider_id`, so concurrent or
    /// repeated submissions leave exactly one row per rider.
    pub async fn save_finance(
        &self,
        actor: &StaffUser,
        rider_id: RiderId,
        form: &FinanceForm,
    ) -> Result<FinanceRecord, ActionError> {
        let info = form.validate().map_err(ActionError::Validation)?;

        // Only picks the failure message; the upsert decides insert vs update
        let existed = match self
            .baas
            .tables
            .select_eq(tables::FINANCE, "rider_id", &rider_id.to_string(), None)
            .await
        {
            Ok(rows) => !rows.is_empty(),
            Err(e) => {
                warn!("Finance lookup for rider {} failed: {}", rider_id, e);
                false
            }
        };
        let failure = if existed { UPDATE_FAILED } else { CREATE_FAILED };

        let record = FinanceRecord {
            rider_id,
            info,
            created_at: None,
            updated_at: None,
        };
        let row = serde_json::to_value(&record).map_err(|e| {
            error!("Failed to encode finance record: {}", e);
            ActionError::Upstream(failure.to_string())
        })?;

        let saved = self
            .baas
            .tables
            .upsert(tables::FINANCE, row, "rider_id")
            .await
            .and_then(decode::<FinanceRecord>)
            .map_err(|e| {
                error!("Finance upsert for rider {} failed: {}", rider_id, e);
                ActionError::Upstream(failure.to_string())
            })?;

        self.audit
            .record(
                actor,
                actions::RIDER_FINANCE_UPSERT,
                &rider_id,
                json!({
                    "service_provider": saved.info.service_provider,
                    "existed": existed,
                }),
            )
            .await;

        Ok(saved)
    }
}
