use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::{DocumentRecord, FinanceRecord, PersonalInfoRecord, SecurityInfoRecord};

/// Identity minted for a rider by step 1; every rider record references it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RiderId(Uuid);

impl RiderId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RiderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RiderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for RiderId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// Result of a successful step 1
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedRider {
    pub id: RiderId,
    pub email: String,
}

/// Everything known about a rider, one optional record per wizard step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiderRecord {
    pub id: RiderId,
    pub personal: Option<PersonalInfoRecord>,
    pub security: Option<SecurityInfoRecord>,
    pub documents: Option<DocumentRecord>,
    pub finance: Option<FinanceRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_displays_as_plain_uuid() {
        let raw = "3f2a1b4c-5d6e-4f70-8a9b-0c1d2e3f4a5b";
        let id: RiderId = raw.parse().unwrap();
        assert_eq!(id.to_string(), raw);
        assert_eq!(serde_json::to_value(id).unwrap(), serde_json::json!(raw));
        assert!("not-a-uuid".parse::<RiderId>().is_err());
    }
}
