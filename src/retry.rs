//! Bounded retry with exponential backoff
//!
//! [`run_with_retry`] wraps any fallible async operation. The operation
//! classifies each failure itself ([`AttemptFailure`]); the executor only
//! decides whether and how long to wait. Each call owns its own attempt
//! counter, so concurrent requests never share retry state.

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Retry schedule for one fallible operation.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first)
    pub max_attempts: u32,
    /// Delay before the second attempt
    pub initial_delay: Duration,
    /// Factor applied to the delay after each failed attempt
    pub backoff_multiplier: f64,
}

impl RetryPolicy {
    /// Create a policy. `max_attempts` is clamped to at least 1.
    pub fn new(max_attempts: u32, initial_delay: Duration, backoff_multiplier: f64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay,
            backoff_multiplier,
        }
    }

    /// Backoff delay before the attempt following `attempt_index`
    /// (0-based index of the attempt that just failed).
    ///
    /// Growth is unbounded within the attempt cap; no jitter.
    pub fn backoff_delay(&self, attempt_index: u32) -> Duration {
        self.initial_delay
            .mul_f64(self.backoff_multiplier.powi(attempt_index as i32))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(5, Duration::from_secs(1), 2.0)
    }
}

/// Classification of one failed attempt, decided by the operation itself.
#[derive(Debug)]
pub enum AttemptFailure<E> {
    /// Worth retrying after the exponential backoff delay
    Transient(E),
    /// Remote asked us to slow down; the hint replaces the backoff schedule
    RateLimited {
        /// Wait exactly this long before the next attempt, when present
        retry_after: Option<Duration>,
        /// Underlying failure
        source: E,
    },
    /// Retrying cannot help
    Permanent(E),
}

/// Final failure of a retried operation.
#[derive(Debug, thiserror::Error)]
pub enum RetryError<E>
where
    E: std::error::Error,
{
    /// The operation failed in a way retrying cannot fix
    #[error("{0}")]
    Permanent(E),

    /// Every attempt in the budget failed; wraps the last observed cause
    #[error("retries exhausted after {attempts} attempts: {last}")]
    Exhausted {
        /// Number of attempts made
        attempts: u32,
        /// Last underlying failure
        last: E,
    },
}

impl<E: std::error::Error> RetryError<E> {
    /// The underlying failure, regardless of how the retry ended.
    pub fn into_inner(self) -> E {
        match self {
            RetryError::Permanent(e) => e,
            RetryError::Exhausted { last, .. } => last,
        }
    }
}

/// Run `operation` up to `policy.max_attempts` times.
///
/// Transient failures wait `initial_delay * multiplier^attempt` before the
/// next attempt. A rate-limit failure carrying a retry-after hint waits
/// exactly that long instead, but still consumes one attempt from the normal
/// budget. Permanent failures return immediately.
pub async fn run_with_retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    mut operation: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AttemptFailure<E>>>,
    E: std::error::Error,
{
    let attempts = policy.max_attempts.max(1);
    let mut last: Option<E> = None;

    for attempt in 0..attempts {
        match operation().await {
            Ok(value) => {
                if attempt > 0 {
                    debug!(attempt = attempt + 1, "operation succeeded after retry");
                }
                return Ok(value);
            }
            Err(AttemptFailure::Permanent(e)) => return Err(RetryError::Permanent(e)),
            Err(AttemptFailure::Transient(e)) => {
                warn!(
                    attempt = attempt + 1,
                    max_attempts = attempts,
                    error = %e,
                    "transient failure"
                );
                last = Some(e);
                if attempt + 1 < attempts {
                    let delay = policy.backoff_delay(attempt);
                    debug!(delay_ms = delay.as_millis() as u64, "backing off");
                    sleep(delay).await;
                }
            }
            Err(AttemptFailure::RateLimited {
                retry_after,
                source,
            }) => {
                let delay = retry_after.unwrap_or_else(|| policy.backoff_delay(attempt));
                warn!(
                    attempt = attempt + 1,
                    max_attempts = attempts,
                    delay_ms = delay.as_millis() as u64,
                    hinted = retry_after.is_some(),
                    "rate limited"
                );
                last = Some(source);
                if attempt + 1 < attempts {
                    sleep(delay).await;
                }
            }
        }
    }

    // SAFETY: the loop runs at least once and every non-returning branch sets `last`.
    let last = last.expect("at least one attempt was made");
    Err(RetryError::Exhausted { attempts, last })
}
