//! Retry and timeout behavior wrapped around command handlers.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::{DomainError, Result};

/// How a handler invocation is retried and bounded in time.
///
/// Only transient failures are retried. A timeout is reported as
/// [`DomainError::Timeout`] and never retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Policy {
    pub retries: u32,
    pub retry_delay: Duration,
    pub timeout: Option<Duration>,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            retries: 0,
            retry_delay: Duration::from_millis(100),
            timeout: None,
        }
    }
}

impl Policy {
    pub fn with_retries(mut self, retries: u32, delay: Duration) -> Self {
        self.retries = retries;
        self.retry_delay = delay;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Runs `attempt`, retrying transient failures up to `retries` times.
    pub async fn run<T, F, Fut>(&self, operation: &'static str, mut attempt: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut retried = 0;
        loop {
            let outcome = match self.timeout {
                Some(limit) => match tokio::time::timeout(limit, attempt()).await {
                    Ok(outcome) => outcome,
                    Err(_) => Err(DomainError::Timeout(limit)),
                },
                None => attempt().await,
            };

            match outcome {
                Err(err) if err.is_transient() && retried < self.retries => {
                    retried += 1;
                    warn!(
                        operation,
                        attempt = retried,
                        error = %err,
                        "Transient failure, retrying"
                    );
                    tokio::time::sleep(self.retry_delay).await;
                }
                other => return other,
            }
        }
    }
}
