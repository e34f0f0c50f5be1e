//! Breaker event consumer.
//!
//! Subscribes to a breaker's event stream and turns each event into a log
//! line and a metrics update. State changes are logged loudly, per-call
//! outcomes only at debug.

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;

use crate::observability::metrics;
use crate::resilience::{BreakerEvent, CircuitState};

/// Spawn a task that drains `events` until the breaker is dropped.
pub fn spawn_event_logger(
    breaker: impl Into<String>,
    mut events: broadcast::Receiver<BreakerEvent>,
) -> JoinHandle<()> {
    let breaker = breaker.into();
    metrics::record_breaker_state(&breaker, CircuitState::Closed);

    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => handle_event(&breaker, &event),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(breaker = %breaker, skipped, "Breaker event logger lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
        tracing::debug!(breaker = %breaker, "Breaker event stream closed");
    })
}

fn handle_event(breaker: &str, event: &BreakerEvent) {
    metrics::record_breaker_event(breaker, event.kind());

    match event {
        BreakerEvent::Opened => {
            tracing::warn!(breaker, "Circuit OPEN, rejecting calls");
            metrics::record_breaker_state(breaker, CircuitState::Open);
        }
        BreakerEvent::HalfOpened => {
            tracing::info!(breaker, "Circuit HALF_OPEN, probing dependency");
            metrics::record_breaker_state(breaker, CircuitState::HalfOpen);
        }
        BreakerEvent::Closed => {
            tracing::info!(breaker, "Circuit CLOSED, dependency recovered");
            metrics::record_breaker_state(breaker, CircuitState::Closed);
        }
        BreakerEvent::Success { latency } => {
            tracing::debug!(breaker, latency_ms = latency.as_millis() as u64, "Call succeeded");
        }
        BreakerEvent::Failure { latency, error } => {
            tracing::debug!(breaker, latency_ms = latency.as_millis() as u64, error = %error, "Call failed");
        }
        BreakerEvent::Timeout { after } => {
            tracing::debug!(breaker, after_ms = after.as_millis() as u64, "Call timed out");
        }
        BreakerEvent::Reject => tracing::debug!(breaker, "Call rejected"),
        BreakerEvent::Fallback => tracing::debug!(breaker, "Fallback served"),
    }
}
