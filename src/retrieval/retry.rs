//! Bounded retry with exponential backoff and jitter for search requests

use super::traits::*;
use crate::config::RetrievalSettings;
use async_trait::async_trait;
use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Retry policy for transient search failures
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt (0 disables retrying)
    pub max_retries: u32,
    pub initial_interval: Duration,
    pub max_interval: Duration,
    pub multiplier: f64,
    pub randomization_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetrievalSettings::default())
    }
}

impl From<&RetrievalSettings> for RetryPolicy {
    fn from(settings: &RetrievalSettings) -> Self {
        Self {
            max_retries: settings.max_retries,
            initial_interval: Duration::from_millis(settings.initial_interval_ms),
            max_interval: Duration::from_millis(settings.max_interval_ms),
            multiplier: 2.0,
            randomization_factor: settings.randomization_factor.clamp(0.0, 1.0),
        }
    }
}

impl RetryPolicy {
    fn backoff(&self) -> ExponentialBackoff {
        let mut backoff = ExponentialBackoff {
            initial_interval: self.initial_interval,
            max_interval: self.max_interval,
            multiplier: self.multiplier,
            randomization_factor: self.randomization_factor,
            // The orchestrator deadline bounds total time
            max_elapsed_time: None,
            ..ExponentialBackoff::default()
        };
        backoff.reset();
        backoff
    }
}

/// Retriever decorator that retries transient failures of the inner retriever
pub struct RetryingRetriever {
    inner: Arc<dyn Retriever>,
    policy: RetryPolicy,
}

impl RetryingRetriever {
    pub fn new(inner: Arc<dyn Retriever>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl Retriever for RetryingRetriever {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn search(&self, query: &str, top: usize) -> Result<Vec<Document>, RetrievalError> {
        let mut backoff = self.policy.backoff();
        let mut attempts = 0;

        loop {
            match self.inner.search(query, top).await {
                Ok(documents) => return Ok(documents),
                Err(err) if err.is_transient() && attempts < self.policy.max_retries => {
                    let Some(delay) = backoff.next_backoff() else {
                        return Err(err);
                    };
                    attempts += 1;
                    warn!(
                        "Search via {} failed, retrying in {:?} (attempt {}/{}): {}",
                        self.inner.name(),
                        delay,
                        attempts,
                        self.policy.max_retries,
                        err
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
