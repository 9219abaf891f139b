use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::RiderId;
use crate::validation::{FieldValidator, Issue};

/// Step 1 form as submitted. Every field is lenient so validation can
/// report all problems instead of failing deserialization on the first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonalInfoForm {
    pub first_name: String,
    pub last_name: String,
    pub other_names: Option<String>,
    pub email: String,
    pub phone_number: String,
    pub date_of_birth: String,
    pub marital_status: String,
    pub gender: String,
    pub nationality: String,
    pub city: String,
    pub gps_address: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalInfo {
    pub first_name: String,
    pub last_name: String,
    pub other_names: Option<String>,
    pub email: String,
    pub phone_number: String,
    pub date_of_birth: NaiveDate,
    pub marital_status: String,
    pub gender: String,
    pub nationality: String,
    pub city: String,
    pub gps_address: String,
}

/// Row of `rider_personal_info`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonalInfoRecord {
    pub rider_id: RiderId,
    #[serde(flatten)]
    pub info: PersonalInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl PersonalInfoRecord {
    pub fn new(rider_id: RiderId, info: PersonalInfo) -> Self {
        Self {
            rider_id,
            info,
            created_at: None,
            updated_at: None,
        }
    }
}

impl PersonalInfoForm {
    pub fn validate(&self, today: NaiveDate) -> Result<PersonalInfo, Vec<Issue>> {
        let mut v = FieldValidator::new();

        let first_name = v.required("first_name", &self.first_name);
        let last_name = v.required("last_name", &self.last_name);
        let other_names = v.optional(&self.other_names);
        let email = v.email("email", &self.email);
        let phone_number = v.phone("phone_number", &self.phone_number);
        let date_of_birth = v.date("date_of_birth", &self.date_of_birth);
        if matches!(date_of_birth, Some(dob) if dob > today) {
            v.issue("date_of_birth", "Date of birth cannot be in the future");
        }
        let marital_status = v.required("marital_status", &self.marital_status);
        let gender = v.required("gender", &self.gender);
        let nationality = v.required("nationality", &self.nationality);
        let city = v.required("city", &self.city);
        let gps_address = v.required("gps_address", &self.gps_address);

        let (
            Some(first_name),
            Some(last_name),
            Some(email),
            Some(phone_number),
            Some(date_of_birth),
            Some(marital_status),
            Some(gender),
            Some(nationality),
            Some(city),
            Some(gps_address),
        ) = (
            first_name,
            last_name,
            email,
            phone_number,
            date_of_birth,
            marital_status,
            gender,
            nationality,
            city,
            gps_address,
        )
        else {
            return Err(v.into_issues());
        };
        if !v.is_clean() {
            return Err(v.into_issues());
        }

        Ok(PersonalInfo {
            first_name,
            last_name,
            other_names,
            email,
            phone_number,
            date_of_birth,
            marital_status,
            gender,
            nationality,
            city,
            gps_address,
        })
    }
}
