// wizard/controller.rs - Drives WizardState against an EnrollmentClient

use tracing::{info, warn};

use super::{EnrollmentClient, SessionStore, Step, WizardError, WizardState};
use crate::models::{
    CreatedRider, DocumentBundle, DocumentRecord, FinanceForm, FinanceRecord, PersonalInfoForm, RiderId,
    RiderRecord, SecurityInfoForm, SecurityInfoRecord,
};

pub struct WizardController<C, S> {
    client: C,
    store: S,
    session_key: String,
    state: WizardState,
    rider: Option<RiderRecord>,
}

impl<C: EnrollmentClient, S: SessionStore> WizardController<C, S> {
    pub fn new(client: C, store: S, session_key: impl Into<String>) -> Self {
        Self {
            client,
            store,
            session_key: session_key.into(),
            state: WizardState::new(),
            rider: None,
        }
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    /// Rider record as last fetched from the backend
    pub fn rider(&self) -> Option<&RiderRecord> {
        self.rider.as_ref()
    }

    pub fn session_key(&self) -> &str {
        &self.session_key
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Step 1. A new rider starts a fresh wizard; the record is read back
    /// before the step counts as completed.
    pub async fn submit_personal(&mut self, form: &PersonalInfoForm) -> Result<CreatedRider, WizardError> {
        let created = self.client.submit_personal(form).await?;

        self.store.save(&self.session_key, created.id)?;
        let rider_id = self
            .store
            .load(&self.session_key)?
            .ok_or(WizardError::MissingRider)?;

        self.state = WizardState::new();
        self.state.set_rider_id(Some(rider_id));

        match self.client.fetch_rider(rider_id).await {
            Ok(record) => {
                info!("Rider {} created in session '{}'", rider_id, self.session_key);
                self.rider = Some(record);
                self.state.complete(Step::Personal);
                Ok(created)
            }
            Err(e) => {
                warn!("Rider {} created but fetch failed: {}", rider_id, e);
                self.rider = None;
                Err(WizardError::RiderFetch {
                    rider_id,
                    reason: e.to_string(),
                })
            }
        }
    }

    pub async fn submit_security(&mut self, form: &SecurityInfoForm) -> Result<SecurityInfoRecord, WizardError> {
        let rider_id = self.enter(Step::Security)?;
        let record = self.client.submit_security(rider_id, form).await?;

        self.state.complete(Step::Security);
        if let Some(rider) = self.rider.as_mut() {
            rider.security = Some(record.clone());
        }
        Ok(record)
    }

    pub async fn submit_documents(&mut self, bundle: &DocumentBundle) -> Result<DocumentRecord, WizardError> {
        let rider_id = self.enter(Step::Documents)?;
        let record = self.client.submit_documents(rider_id, bundle).await?;

        self.state.complete(Step::Documents);
        if let Some(rider) = self.rider.as_mut() {
            rider.documents = Some(record.clone());
        }
        Ok(record)
    }

    pub async fn submit_finance(&mut self, form: &FinanceForm) -> Result<FinanceRecord, WizardError> {
        let rider_id = self.enter(Step::Finance)?;
        let record = self.client.submit_finance(rider_id, form).await?;

        self.state.complete(Step::Finance);
        if let Some(rider) = self.rider.as_mut() {
            rider.finance = Some(record.clone());
        }
        Ok(record)
    }

    /// Rebuild the wizard for this session key from what the backend has
    pub async fn resume(&mut self) -> Result<&WizardState, WizardError> {
        self.state = WizardState::new();
        self.rider = None;

        let Some(rider_id) = self.store.load(&self.session_key)? else {
            return Ok(&self.state);
        };
        self.state.set_rider_id(Some(rider_id));

        let record = self
            .client
            .fetch_rider(rider_id)
            .await
            .map_err(|e| WizardError::RiderFetch {
                rider_id,
                reason: e.to_string(),
            })?;

        let present = [
            (Step::Personal, record.personal.is_some()),
            (Step::Security, record.security.is_some()),
            (Step::Documents, record.documents.is_some()),
            (Step::Finance, record.finance.is_some()),
        ];
        for (step, exists) in present {
            if exists {
                self.state.complete(step);
            }
        }

        self.rider = Some(record);
        Ok(&self.state)
    }

    pub fn reset(&mut self) -> Result<(), WizardError> {
        self.store.clear(&self.session_key)?;
        self.state = WizardState::new();
        self.rider = None;
        Ok(())
    }

    fn enter(&mut self, step: Step) -> Result<RiderId, WizardError> {
        if !self.state.can_enter(step) {
            return Err(WizardError::StepLocked(step));
        }
        let rider_id = self
            .store
            .load(&self.session_key)?
            .ok_or(WizardError::MissingRider)?;

        self.state.go_to(step)?;
        self.state.set_rider_id(Some(rider_id));
        Ok(rider_id)
    }
}
