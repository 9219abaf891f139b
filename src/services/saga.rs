// services/saga.rs - Forward actions paired with compensations
//
// A compensation is recorded before its forward action runs. When a forward
// action fails, every recorded compensation runs newest-first, each retried
// under the saga's RetryPolicy.

use std::future::Future;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use thiserror::Error;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::baas::BaasError;
use crate::config::EnrollmentConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub multiplier: u32,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(50),
            multiplier: 2,
            max_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &EnrollmentConfig) -> Self {
        Self {
            max_attempts: config.compensation_max_attempts.max(1),
            initial_delay: Duration::from_millis(config.compensation_initial_backoff_ms),
            multiplier: 2,
            max_delay: Duration::from_millis(config.compensation_max_backoff_ms),
        }
    }

    /// Delay after the given failed attempt (1-based)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.saturating_pow(attempt.saturating_sub(1));
        self.initial_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Run `action` until it succeeds or attempts run out. `NotFound` counts
    /// as success: the thing being undone is already gone.
    pub async fn retry<F, Fut>(&self, label: &str, mut action: F) -> Result<(), BaasError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<(), BaasError>>,
    {
        let mut attempt = 1;
        loop {
            match action().await {
                Ok(()) => return Ok(()),
                Err(err) if err.is_not_found() => {
                    info!("{}: already gone ({})", label, err);
                    return Ok(());
                }
                Err(err) if attempt >= self.max_attempts => {
                    error!("{} failed after {} attempts: {}", label, attempt, err);
                    return Err(err);
                }
                Err(err) => {
                    let delay = self.delay_after(attempt);
                    warn!("{} failed (attempt {}): {}. retrying in {:?}", label, attempt, err, delay);
                    sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

/// A forward action failed. `unresolved` names the compensations that
/// still failed after their retries.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct SagaError {
    pub error: BaasError,
    pub unresolved: Vec<String>,
}

type Compensation = Box<dyn Fn() -> BoxFuture<'static, Result<(), BaasError>> + Send + Sync>;

pub struct Saga {
    name: String,
    policy: RetryPolicy,
    compensations: Vec<(String, Compensation)>,
}

impl Saga {
    pub fn new(name: impl Into<String>, policy: RetryPolicy) -> Self {
        Self {
            name: name.into(),
            policy,
            compensations: Vec::new(),
        }
    }

    /// Record how to undo the next forward action
    pub fn compensate_with<F, Fut>(&mut self, label: impl Into<String>, compensation: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), BaasError>> + Send + 'static,
    {
        self.compensations
            .push((label.into(), Box::new(move || compensation().boxed())));
    }

    /// Run a forward action; on failure roll back everything recorded so far
    pub async fn run<T, Fut>(&mut self, forward: Fut) -> Result<T, SagaError>
    where
        Fut: Future<Output = Result<T, BaasError>>,
    {
        match forward.await {
            Ok(value) => Ok(value),
            Err(error) => {
                warn!("saga {}: forward action failed, rolling back: {}", self.name, error);
                let unresolved = self.rollback().await;
                Err(SagaError { error, unresolved })
            }
        }
    }

    pub fn pending(&self) -> usize {
        self.compensations.len()
    }

    /// Forget the compensations; the saga succeeded
    pub fn commit(mut self) {
        self.compensations.clear();
    }

    async fn rollback(&mut self) -> Vec<String> {
        let mut unresolved = Vec::new();
        while let Some((label, compensation)) = self.compensations.pop() {
            if self.policy.retry(&label, || compensation()).await.is_err() {
                unresolved.push(label);
            }
        }
        if !unresolved.is_empty() {
            error!("saga {}: unresolved compensations: {:?}", self.name, unresolved);
        }
        unresolved
    }
}
