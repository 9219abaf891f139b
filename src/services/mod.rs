pub mod audit;
pub mod enrollment;
pub mod riders;
pub mod saga;

pub use audit::AuditLog;
pub use enrollment::{EnrollmentService, EnrollmentSettings};
pub use riders::RiderService;
pub use saga::{RetryPolicy, Saga, SagaError};

use chrono::{NaiveDate, Utc};
use thiserror::Error;

use crate::validation::Issue;

/// Outcome of a failed step action or edit, in terms a caller can act on.
///
/// Messages are safe to show to a client; upstream details are logged where
/// the failure happens and never carried here.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("Validation failed")]
    Validation(Vec<Issue>),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Upstream(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),
}

impl ActionError {
    pub fn issue(field: &str, message: &str) -> Self {
        ActionError::Validation(vec![Issue::new(field, message)])
    }
}

/// Calendar date used by the date rules (UTC)
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}
