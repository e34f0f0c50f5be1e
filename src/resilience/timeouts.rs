//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap a single downstream call with a deadline
//! - Report a distinct `Timeout` outcome when the deadline passes
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - A timed-out future is dropped; work it already handed to the network
//!   may still finish, only the reported outcome is governed here

use std::future::Future;
use std::time::Duration;

use crate::resilience::error::ResilienceError;

/// Tagged result of one guarded invocation.
#[derive(Debug)]
pub enum CallOutcome<T, E> {
    Success(T),
    Failure(E),
    Timeout(Duration),
}

/// Outcome without its payload, used for accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    Success,
    Failure,
    Timeout,
}

impl<T, E> CallOutcome<T, E> {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            CallOutcome::Success(_) => OutcomeKind::Success,
            CallOutcome::Failure(_) => OutcomeKind::Failure,
            CallOutcome::Timeout(_) => OutcomeKind::Timeout,
        }
    }

    /// Collapse into a `Result`, keeping timeouts distinct from failures.
    pub fn into_result(self) -> Result<T, ResilienceError<E>> {
        match self {
            CallOutcome::Success(value) => Ok(value),
            CallOutcome::Failure(e) => Err(ResilienceError::Upstream(e)),
            CallOutcome::Timeout(after) => Err(ResilienceError::Timeout(after)),
        }
    }
}

/// Run `call` with a deadline.
pub async fn govern<F, T, E>(deadline: Duration, call: F) -> CallOutcome<T, E>
where
    F: Future<Output = Result<T, E>>,
{
    match tokio::time::timeout(deadline, call).await {
        Ok(Ok(value)) => CallOutcome::Success(value),
        Ok(Err(e)) => CallOutcome::Failure(e),
        Err(_) => CallOutcome::Timeout(deadline),
    }
}
