//! Bounded exponential-backoff retry for rate-limited operations.
//!
//! The policy only ever retries errors that report a rate-limit signal through
//! [`RateLimitSignal`]. Everything else propagates on first occurrence.
//!
//! Before retry attempt `i` (1-indexed) the policy waits
//! `2^i * base_delay + jitter`, where jitter is drawn uniformly from
//! `[0, max_jitter)`. With the defaults that is 2-3s, 4-5s, 8-9s and 16-17s.

use rand::Rng;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Default total number of attempts, including the first.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default backoff unit; doubled per retry.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1000);

/// Default upper bound (exclusive) of the random jitter added to each wait.
pub const DEFAULT_MAX_JITTER: Duration = Duration::from_millis(1000);

/// Classifies an error as a rate-limit signal.
///
/// This is the single seam that adapts a backend's error shape to the retry
/// algorithm. Implementations should return `true` only for rate-limit class
/// failures (HTTP 429, `RESOURCE_EXHAUSTED` and equivalents).
pub trait RateLimitSignal {
    fn is_rate_limited(&self) -> bool;
}

/// Why [`RetryPolicy::execute`] gave up.
#[derive(Debug, Error)]
pub enum RetryFailure<E> {
    /// The operation failed with an error that is not rate-limit class.
    #[error("{0}")]
    Fatal(E),
    /// Every attempt was rate limited; `last` is the error of the final attempt.
    #[error("gave up after {attempts} attempt(s): {last}")]
    Exhausted { attempts: u32, last: E },
    /// The cancellation token fired at a suspension point.
    #[error("cancelled")]
    Cancelled,
}

impl<E> RetryFailure<E> {
    /// Returns the underlying operation error, if there is one.
    pub fn into_error(self) -> Option<E> {
        match self {
            RetryFailure::Fatal(e) | RetryFailure::Exhausted { last: e, .. } => Some(e),
            RetryFailure::Cancelled => None,
        }
    }
}

/// Retry configuration and executor.
///
/// # Example
///
/// ```
/// use contraption_rs::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::default()
///     .with_max_attempts(3)
///     .with_base_delay(Duration::from_millis(250));
///
/// assert_eq!(policy.max_attempts(), 3);
/// assert_eq!(policy.base_backoff(2), Duration::from_millis(1000));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            max_jitter: DEFAULT_MAX_JITTER,
        }
    }
}

impl RetryPolicy {
    /// Sets the total attempt budget. Zero is clamped to one.
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    #[must_use]
    pub const fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Sets the exclusive upper bound of the jitter. `Duration::ZERO` disables jitter.
    #[must_use]
    pub const fn with_max_jitter(mut self, max_jitter: Duration) -> Self {
        self.max_jitter = max_jitter;
        self
    }

    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    #[must_use]
    pub const fn base_delay(&self) -> Duration {
        self.base_delay
    }

    #[must_use]
    pub const fn max_jitter(&self) -> Duration {
        self.max_jitter
    }

    /// The deterministic part of the wait before retry attempt `retry` (1-indexed).
    #[must_use]
    pub fn base_backoff(&self, retry: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(retry))
    }

    /// The full wait before retry attempt `retry`: base backoff plus fresh jitter.
    #[must_use]
    pub fn backoff_delay(&self, retry: u32) -> Duration {
        self.base_backoff(retry).saturating_add(self.jitter())
    }

    fn jitter(&self) -> Duration {
        let bound = u64::try_from(self.max_jitter.as_nanos()).unwrap_or(u64::MAX);
        if bound == 0 {
            return Duration::ZERO;
        }
        Duration::from_nanos(rand::rng().random_range(0..bound))
    }

    /// Runs `operation`, retrying rate-limited failures with backoff.
    ///
    /// Returns the first success. A non rate-limit error is returned as
    /// [`RetryFailure::Fatal`] without further attempts. When the budget runs
    /// out, the error of the last attempt is returned as
    /// [`RetryFailure::Exhausted`].
    pub async fn execute<T, E, F, Fut>(&self, operation: F) -> Result<T, RetryFailure<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: RateLimitSignal + Display,
    {
        self.run(operation, None).await
    }

    /// Like [`execute`](Self::execute), but abandons the call when `token` is
    /// cancelled during a backend round trip or a backoff wait.
    pub async fn execute_cancellable<T, E, F, Fut>(
        &self,
        operation: F,
        token: &CancellationToken,
    ) -> Result<T, RetryFailure<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: RateLimitSignal + Display,
    {
        self.run(operation, Some(token)).await
    }

    async fn run<T, E, F, Fut>(
        &self,
        mut operation: F,
        token: Option<&CancellationToken>,
    ) -> Result<T, RetryFailure<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: RateLimitSignal + Display,
    {
        let mut attempt = 1;

        loop {
            let Some(outcome) = suspend(token, operation()).await else {
                debug!(attempt, "Cancelled during attempt");
                return Err(RetryFailure::Cancelled);
            };

            let error = match outcome {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(attempt, "Succeeded after rate-limit retries");
                    }
                    return Ok(value);
                }
                Err(error) => error,
            };

            if !error.is_rate_limited() {
                debug!(attempt, %error, "Non-retryable error");
                return Err(RetryFailure::Fatal(error));
            }

            if attempt >= self.max_attempts {
                warn!(
                    attempts = attempt,
                    %error,
                    "Rate limited on every attempt, giving up"
                );
                return Err(RetryFailure::Exhausted {
                    attempts: attempt,
                    last: error,
                });
            }

            let delay = self.backoff_delay(attempt);
            warn!(
                attempt,
                max_attempts = self.max_attempts,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                %error,
                "Rate limited, backing off"
            );

            if suspend(token, tokio::time::sleep(delay)).await.is_none() {
                debug!(attempt, "Cancelled during backoff");
                return Err(RetryFailure::Cancelled);
            }
            attempt += 1;
        }
    }
}

/// Awaits `future`, or returns `None` if `token` fires first.
async fn suspend<F: Future>(token: Option<&CancellationToken>, future: F) -> Option<F::Output> {
    match token {
        Some(token) => tokio::select! {
            biased;
            () = token.cancelled() => None,
            output = future => Some(output),
        },
        None => Some(future.await),
    }
}
