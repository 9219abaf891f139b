// services/enrollment/mod.rs - The four step actions of the rider wizard
//
// Each step validates its input before touching the backend and writes one
// logical record keyed by the rider id. Steps are independent: nothing here
// checks that an earlier step ran.

mod documents;
mod finance;
mod personal;
mod security;

pub use personal::generate_password;

use crate::baas::Baas;
use crate::config::AppConfig;
use crate::services::{AuditLog, RetryPolicy};

#[derive(Debug, Clone)]
pub struct EnrollmentSettings {
    pub bucket: String,
    pub max_file_bytes: usize,
    pub password_length: usize,
    pub retry: RetryPolicy,
}

impl EnrollmentSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            bucket: config.storage.bucket.clone(),
            max_file_bytes: config.storage.max_file_bytes,
            password_length: config.enrollment.generated_password_length,
            retry: RetryPolicy::from_config(&config.enrollment),
        }
    }
}

#[derive(Clone)]
pub struct EnrollmentService {
    baas: Baas,
    audit: AuditLog,
    settings: EnrollmentSettings,
}

impl EnrollmentService {
    pub fn new(baas: Baas, audit: AuditLog, settings: EnrollmentSettings) -> Self {
        Self { baas, audit, settings }
    }

    pub fn settings(&self) -> &EnrollmentSettings {
        &self.settings
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;
    use std::time::Duration;

    use uuid::Uuid;

    use super::*;
    use crate::auth::StaffUser;
    use crate::baas::MemoryBaas;

    pub(crate) const BUCKET: &str = "rider-documents";

    pub(crate) fn service() -> (EnrollmentService, Arc<MemoryBaas>) {
        let memory = Arc::new(MemoryBaas::new("test-secret", 1));
        let baas = Baas::from_memory(memory.clone());
        let settings = EnrollmentSettings {
            bucket: BUCKET.to_string(),
            max_file_bytes: 1024,
            password_length: 12,
            retry: RetryPolicy {
                max_attempts: 3,
                initial_delay: Duration::from_millis(1),
                multiplier: 2,
                max_delay: Duration::from_millis(4),
            },
        };
        let audit = AuditLog::new(baas.tables.clone());
        (EnrollmentService::new(baas, audit, settings), memory)
    }

    pub(crate) fn staff() -> StaffUser {
        StaffUser {
            id: Uuid::new_v4(),
            email: "ops@pragxi.com".to_string(),
            role: Some("admin".to_string()),
            access_token: String::new(),
        }
    }
}
