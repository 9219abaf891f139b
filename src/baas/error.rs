use thiserror::Error;

/// Errors surfaced by the BaaS clients
#[derive(Debug, Error)]
pub enum BaasError {
    /// Identity service rejection. The message is the service's own wording.
    #[error("{0}")]
    Auth(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("Failed to decode backend response: {0}")]
    Decode(String),
}

impl BaasError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, BaasError::NotFound(_))
    }
}
