//! Rate-limit-aware execution of Sheets calls.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use crate::error::{ApiError, GradeSyncError, GradeSyncResult};
use crate::sheets::{SheetsCall, SheetsTransport};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(60);

/// When to retry a failed call, how often, and how long to wait.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub retry_if: fn(&ApiError) -> bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            retry_if: ApiError::is_rate_limit,
        }
    }
}

impl RetryPolicy {
    pub fn should_retry(&self, error: &ApiError) -> bool {
        (self.retry_if)(error)
    }

    /// Delay after the `attempt`-th failure (1-based): `base * 2^(attempt - 1)`,
    /// capped at `max_delay`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

/// Wraps a transport with a [`RetryPolicy`] and counts retries.
pub struct RetryingExecutor<T> {
    transport: T,
    policy: RetryPolicy,
    retries: AtomicU32,
}

impl<T: SheetsTransport> RetryingExecutor<T> {
    pub fn new(transport: T, policy: RetryPolicy) -> Self {
        RetryingExecutor {
            transport,
            policy,
            retries: AtomicU32::new(0),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Backoff-triggered retries since the last reset. Diagnostic only.
    pub fn retry_count(&self) -> u32 {
        self.retries.load(Ordering::Relaxed)
    }

    pub fn reset_retry_count(&self) {
        self.retries.store(0, Ordering::Relaxed);
    }

    /// Run `call`, retrying while the policy allows it.
    ///
    /// Errors the policy rejects are returned after the first attempt. A
    /// retryable error that persists through the last attempt becomes
    /// [`GradeSyncError::RateLimited`].
    pub async fn execute<C: SheetsCall>(&self, call: &C) -> GradeSyncResult<C::Response> {
        let endpoint = call.endpoint();
        let body = call.body()?;
        let max_attempts = self.policy.max_attempts.max(1);

        let mut attempt = 1;
        loop {
            log::debug!("Making request: {} (attempt {})", call.describe(), attempt);

            let error = match self.transport.send(&endpoint, body.as_ref()).await {
                Ok(value) => {
                    log::debug!("Request completed successfully: {}", call.describe());
                    return serde_json::from_value(value).map_err(|e| {
                        GradeSyncError::UnexpectedResponse {
                            call: call.describe(),
                            message: e.to_string(),
                        }
                    });
                }
                Err(error) => error,
            };

            if !self.policy.should_retry(&error) {
                return Err(GradeSyncError::Api {
                    call: call.describe(),
                    source: error,
                });
            }

            if attempt >= max_attempts {
                return Err(GradeSyncError::RateLimited {
                    call: call.describe(),
                    attempts: attempt,
                });
            }

            let delay = self.policy.backoff(attempt);
            self.retries.fetch_add(1, Ordering::Relaxed);
            log::warn!(
                "{} rate limited, retry {}/{} in {:?}",
                call.describe(),
                attempt,
                max_attempts - 1,
                delay
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}
