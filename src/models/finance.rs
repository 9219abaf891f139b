use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::RiderId;
use crate::validation::{FieldValidator, Issue};

/// Mobile money network a rider is paid out on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceProvider {
    Mtn,
    Telecel,
    AirtelTigo,
}

impl ServiceProvider {
    pub const ALL: [&'static str; 3] = ["mtn", "telecel", "airteltigo"];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceProvider::Mtn => "mtn",
            ServiceProvider::Telecel => "telecel",
            ServiceProvider::AirtelTigo => "airteltigo",
        }
    }
}

impl fmt::Display for ServiceProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mtn" => Ok(ServiceProvider::Mtn),
            "telecel" => Ok(ServiceProvider::Telecel),
            "airteltigo" => Ok(ServiceProvider::AirtelTigo),
            other => Err(format!("unknown service provider '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FinanceForm {
    pub service_provider: String,
    pub mobile_money_number: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinanceInfo {
    pub service_provider: ServiceProvider,
    pub mobile_money_number: String,
}

/// Row of `rider_finance`; `rider_id` is unique
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinanceRecord {
    pub rider_id: RiderId,
    #[serde(flatten)]
    pub info: FinanceInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl FinanceForm {
    pub fn validate(&self) -> Result<FinanceInfo, Vec<Issue>> {
        let mut v = FieldValidator::new();
        let service_provider =
            v.one_of::<ServiceProvider>("service_provider", &self.service_provider, &ServiceProvider::ALL);
        let mobile_money_number = v.mobile_money_number("mobile_money_number", &self.mobile_money_number);

        match (service_provider, mobile_money_number) {
            (Some(service_provider), Some(mobile_money_number)) => Ok(FinanceInfo {
                service_provider,
                mobile_money_number,
            }),
            _ => Err(v.into_issues()),
        }
    }
}
