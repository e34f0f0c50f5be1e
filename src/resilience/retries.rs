//! Retry logic.
//!
//! # Responsibilities
//! - Re-issue a failed call with exponential backoff, up to a bound
//! - Propagate the last failure once attempts are exhausted
//!
//! # Design Decisions
//! - Independent of breaker state: retries protect the orders path, the
//!   breaker protects the payments path, so failures are never double counted
//! - Backoff waits on the Tokio timer and never blocks other tasks
//! - Callers may veto retries for errors that cannot succeed (client errors)

use std::future::Future;
use std::time::Duration;

use crate::config::RetryConfig;
use crate::resilience::backoff::calculate_backoff;

/// Immutable retry parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Delay after the first failed attempt; doubled after each further one.
    pub base_delay: Duration,
    /// Upper bound for a single delay.
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay: Duration::MAX,
        }
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Delay to wait after failed attempt number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        calculate_backoff(attempt, self.base_delay, self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(100))
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self::new(config.max_attempts, Duration::from_millis(config.base_delay_ms))
            .with_max_delay(Duration::from_millis(config.max_delay_ms))
    }
}

/// Run `op`, retrying every failure until the policy is exhausted.
pub async fn retry<F, Fut, T, E>(policy: &RetryPolicy, op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    retry_when(policy, op, |_| true).await
}

/// Run `op`, retrying failures for which `should_retry` returns true.
///
/// An error rejected by `should_retry` is returned immediately.
pub async fn retry_when<F, Fut, T, E, P>(
    policy: &RetryPolicy,
    mut op: F,
    should_retry: P,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        tracing::debug!(attempt, max_attempts, "Attempting call");

        let error = match op().await {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };

        if attempt >= max_attempts {
            tracing::warn!(attempt, error = %error, "All retry attempts failed");
            return Err(error);
        }
        if !should_retry(&error) {
            tracing::debug!(attempt, error = %error, "Error is not retryable");
            return Err(error);
        }

        let delay = policy.delay_for(attempt);
        tracing::info!(attempt, delay = ?delay, error = %error, "Retrying call");
        tokio::time::sleep(delay).await;
    }
}
