use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::RiderId;
use crate::validation::{FieldValidator, Issue};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityInfoForm {
    pub vehicle_make: String,
    pub vehicle_model: String,
    pub vehicle_colour: String,
    pub vehicle_registration_number: String,
    pub license_number: String,
    pub insurance_number: String,
    pub insurance_expiration_date: String,
    pub witness_name: String,
    pub witness_phone_number: String,
    pub witness_address: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityInfo {
    pub vehicle_make: String,
    pub vehicle_model: String,
    pub vehicle_colour: String,
    pub vehicle_registration_number: String,
    pub license_number: String,
    pub insurance_number: String,
    pub insurance_expiration_date: NaiveDate,
    pub witness_name: String,
    pub witness_phone_number: String,
    pub witness_address: String,
}

/// Row of `rider_security_info`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityInfoRecord {
    pub rider_id: RiderId,
    #[serde(flatten)]
    pub info: SecurityInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl SecurityInfoRecord {
    pub fn new(rider_id: RiderId, info: SecurityInfo) -> Self {
        Self {
            rider_id,
            info,
            created_at: None,
            updated_at: None,
        }
    }
}

impl SecurityInfoForm {
    /// The insurance must still be valid tomorrow: an expiration of `today`
    /// or earlier is rejected.
    pub fn validate(&self, today: NaiveDate) -> Result<SecurityInfo, Vec<Issue>> {
        let mut v = FieldValidator::new();

        let vehicle_make = v.required("vehicle_make", &self.vehicle_make);
        let vehicle_model = v.required("vehicle_model", &self.vehicle_model);
        let vehicle_colour = v.required("vehicle_colour", &self.vehicle_colour);
        let vehicle_registration_number =
            v.required("vehicle_registration_number", &self.vehicle_registration_number);
        let license_number = v.required("license_number", &self.license_number);
        let insurance_number = v.required("insurance_number", &self.insurance_number);
        let insurance_expiration_date = v.date("insurance_expiration_date", &self.insurance_expiration_date);
        if matches!(insurance_expiration_date, Some(date) if date <= today) {
            v.issue("insurance_expiration_date", "Insurance expiration date must be in the future");
        }
        let witness_name = v.required("witness_name", &self.witness_name);
        let witness_phone_number = v.phone("witness_phone_number", &self.witness_phone_number);
        let witness_address = v.required("witness_address", &self.witness_address);

        let (
            Some(vehicle_make),
            Some(vehicle_model),
            Some(vehicle_colour),
            Some(vehicle_registration_number),
            Some(license_number),
            Some(insurance_number),
            Some(insurance_expiration_date),
            Some(witness_name),
            Some(witness_phone_number),
            Some(witness_address),
        ) = (
            vehicle_make,
            vehicle_model,
            vehicle_colour,
            vehicle_registration_number,
            license_number,
            insurance_number,
            insurance_expiration_date,
            witness_name,
            witness_phone_number,
            witness_address,
        )
        else {
            return Err(v.into_issues());
        };
        if !v.is_clean() {
            return Err(v.into_issues());
        }

        Ok(SecurityInfo {
            vehicle_make,
            vehicle_model,
            vehicle_colour,
            vehicle_registration_number,
            license_number,
            insurance_number,
            insurance_expiration_date,
            witness_name,
            witness_phone_number,
            witness_address,
        })
    }
}
