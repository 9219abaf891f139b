use rand::seq::SliceRandom;
use rand::Rng;
use serde_json::json;
use tracing::{error, info, warn};

use super::EnrollmentService;
use crate::auth::{StaffUser, ROLE_RIDER};
use crate::baas::NewIdentity;
use crate::models::{tables, CreatedRider, PersonalInfoForm, PersonalInfoRecord, RiderId};
use crate::services::audit::actions;
use crate::services::{today, ActionError, Saga};

const LOWERCASE: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const UPPERCASE: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &[u8] = b"0123456789";
const SYMBOLS: &[u8] = b"!@#$%^&*()-_=+";

const EMAIL_EXISTS: &str = "A user with this email already exists";
const SAVE_FAILED: &str = "Failed to save rider information";

/// Random password with at least one character from every class
pub fn generate_password(length: usize) -> String {
    let classes = [LOWERCASE, UPPERCASE, DIGITS, SYMBOLS];
    let length = length.max(classes.len());
    let mut rng = rand::thread_rng();

    let mut chars: Vec<u8> = classes
        .iter()
        .map(|class| class[rng.gen_range(0..class.len())])
        .collect();

    let all: Vec<u8> = classes.concat();
    while chars.len() < length {
        chars.push(all[rng.gen_range(0..all.len())]);
    }
    chars.shuffle(&mut rng);

    chars.into_iter().map(char::from).collect()
}

impl EnrollmentService {
    /// Step 1: create the rider identity and its personal record.
    ///
    /// Identity creation and the first insert form a saga. If the insert
    /// fails the identity (and its mirrored `users` row) is removed again,
    /// so no half-enrolled rider is left behind.
    pub async fn create_rider(
        &self,
        actor: &StaffUser,
        form: &PersonalInfoForm,
    ) -> Result<CreatedRider, ActionError> {
        let info = form.validate(today()).map_err(ActionError::Validation)?;

        if self.email_exists(&info.email).await {
            return Err(ActionError::Conflict(EMAIL_EXISTS.to_string()));
        }

        let rider_id = RiderId::new();
        let uuid = *rider_id.as_uuid();
        let mut saga = Saga::new(format!("enroll rider {}", rider_id), self.settings.retry);

        let auth = self.baas.auth.clone();
        saga.compensate_with(format!("delete identity {}", rider_id), move || {
            let auth = auth.clone();
            async move { auth.delete_user(uuid).await }
        });
        let identity = saga
            .run(self.baas.auth.create_user(NewIdentity {
                id: uuid,
                email: info.email.clone(),
                password: generate_password(self.settings.password_length),
                metadata: json!({ "role": ROLE_RIDER }),
            }))
            .await
            .map_err(|e| {
                warn!("Identity creation for {} failed: {}", info.email, e);
                ActionError::Upstream(e.error.to_string())
            })?;

        let table_api = self.baas.tables.clone();
        saga.compensate_with(format!("delete users row {}", rider_id), move || {
            let table_api = table_api.clone();
            async move {
                table_api
                    .delete_eq(tables::USERS, "id", &uuid.to_string())
                    .await
                    .map(|_| ())
            }
        });

        let record = PersonalInfoRecord::new(rider_id, info);
        let row = serde_json::to_value(&record).map_err(|e| {
            error!("Failed to encode personal record: {}", e);
            ActionError::Upstream(SAVE_FAILED.to_string())
        })?;
        if let Err(e) = saga.run(self.baas.tables.insert(tables::PERSONAL_INFO, row)).await {
            error!(
                "Personal record insert for rider {} failed: {} (unresolved compensations: {:?})",
                rider_id, e.error, e.unresolved
            );
            return Err(ActionError::Upstream(SAVE_FAILED.to_string()));
        }
        saga.commit();

        info!("Enrolled rider {} <{}>", rider_id, identity.email);
        self.audit
            .record(actor, actions::RIDER_CREATE, &rider_id, json!({ "email": identity.email }))
            .await;

        Ok(CreatedRider {
            id: rider_id,
            email: identity.email,
        })
    }

    /// True when either table already holds the email. A failed lookup is
    /// treated as a match.
    pub async fn email_exists(&self, email: &str) -> bool {
        for table in [tables::USERS, tables::PERSONAL_INFO] {
            match self.baas.tables.select_eq(table, "email", email, None).await {
                Ok(rows) if rows.is_empty() => {}
                Ok(_) => return true,
                Err(e) => {
                    warn!("Email lookup in {} failed, assuming it exists: {}", table, e);
                    return true;
                }
            }
        }
        false
    }
}
