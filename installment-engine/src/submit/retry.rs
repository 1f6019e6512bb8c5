//! Bounded retry with linear backoff
//!
//! The policy is a plain value so the backoff schedule can be asserted
//! without any network in sight; [`with_retry`] is the only place that
//! sleeps.

use std::future::Future;
use std::time::Duration;

/// Maximum network attempts for contract creation
const CONTRACT_MAX_ATTEMPTS: u32 = 5;

/// Base delay between contract-creation attempts
const CONTRACT_BASE_DELAY: Duration = Duration::from_secs(3);

/// Retry schedule: at most `max_attempts` tries, waiting
/// `base_delay * attempt` after the n-th failure (linear backoff)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub const fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self { max_attempts, base_delay }
    }

    /// The schedule used for contract creation (5 attempts, base 3s)
    pub const fn contract_default() -> Self {
        Self::new(CONTRACT_MAX_ATTEMPTS, CONTRACT_BASE_DELAY)
    }

    /// Delay after the given 1-based attempt number
    pub fn delay(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::contract_default()
    }
}

/// Run `operation` until it succeeds, the error is not retryable, or the
/// attempt budget is spent. The operation receives the 1-based attempt
/// number.
pub async fn with_retry<T, E, F, Fut>(
    mut operation: F,
    policy: &RetryPolicy,
    is_retryable: impl Fn(&E) -> bool,
) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 1u32;
    loop {
        match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < policy.max_attempts && is_retryable(&err) => {
                let delay = policy.delay(attempt);
                tracing::warn!(attempt, delay_ms = delay.as_millis() as u64, "attempt failed, retrying");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
