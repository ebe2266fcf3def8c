//! Retry-on-throttle layer with exponential backoff.
//!
//! Only `429 Too Many Requests` is retried. Every other response, successful
//! or not, is handed back untouched after the first attempt, and network
//! errors are never retried.

use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::{HttpRequest, HttpResponse, HttpTransport, TransportError, STATUS_TOO_MANY_REQUESTS};

/// Backoff settings for [`RetryTransport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    /// Total attempts, including the first one. `0` behaves like `1`.
    pub max_attempts: u32,
    /// Wait before the second attempt; doubles after every throttled attempt.
    pub initial_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(100),
        }
    }
}

impl RetryConfig {
    pub fn new(max_attempts: u32, initial_delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay,
        }
    }

    /// Delay after the throttled attempt number `attempt` (0-based):
    /// `initial_delay * 2^attempt`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.initial_delay
            .saturating_mul(2u32.saturating_pow(attempt))
    }

    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

/// Retries throttled requests against the inner transport.
#[derive(Debug)]
pub struct RetryTransport<T> {
    inner: T,
    config: RetryConfig,
}

impl<T> RetryTransport<T> {
    pub fn new(inner: T, config: RetryConfig) -> Self {
        Self { inner, config }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }
}

#[async_trait]
impl<T: HttpTransport> HttpTransport for RetryTransport<T> {
    async fn execute(
        &self,
        request: HttpRequest,
        cancel: &CancellationToken,
    ) -> Result<HttpResponse, TransportError> {
        let attempts = self.config.attempts();
        let mut last_status = STATUS_TOO_MANY_REQUESTS;

        for attempt in 0..attempts {
            let response = self.inner.execute(request.clone(), cancel).await?;
            if response.status != STATUS_TOO_MANY_REQUESTS {
                return Ok(response);
            }
            last_status = response.status;
            drop(response);

            if attempt + 1 == attempts {
                break;
            }

            let delay = self.config.delay_for_attempt(attempt);
            warn!(
                url = %request.url,
                attempt = attempt + 1,
                max_attempts = attempts,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "Throttled, backing off"
            );

            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!(url = %request.url, "Backoff abandoned: cancelled");
                    return Err(TransportError::Cancelled);
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }

        Err(TransportError::RetriesExhausted {
            attempts,
            status: last_status,
        })
    }
}
