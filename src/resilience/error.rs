//! Error taxonomy for guarded calls.

use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by the resilience engine.
///
/// Generic over the upstream error type so callers keep their own error
/// detail while still being able to tell a fast reject from a real failure.
#[derive(Debug, Error)]
pub enum ResilienceError<E> {
    /// The guarded call itself returned an error.
    #[error("upstream failure: {0}")]
    Upstream(E),

    /// The guarded call did not finish before its deadline.
    #[error("call timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// The breaker refused the call without attempting it.
    #[error("circuit '{breaker}' is open")]
    CircuitOpen { breaker: String },

    /// The guarded call panicked. Counted as a failure by the breaker.
    #[error("call guarded by '{breaker}' panicked")]
    Panicked { breaker: String },
}

impl<E> ResilienceError<E> {
    /// True when the dependency was never contacted.
    pub fn is_rejection(&self) -> bool {
        matches!(self, ResilienceError::CircuitOpen { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ResilienceError::Timeout(_))
    }

    /// Borrow the upstream error, if this is one.
    pub fn upstream(&self) -> Option<&E> {
        match self {
            ResilienceError::Upstream(e) => Some(e),
            _ => None,
        }
    }
}

/// Result type for guarded operations.
pub type ResilienceResult<T, E> = Result<T, ResilienceError<E>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err: ResilienceError<String> = ResilienceError::Timeout(Duration::from_millis(2000));
        assert_eq!(err.to_string(), "call timed out after 2000ms");

        let err: ResilienceError<String> = ResilienceError::CircuitOpen {
            breaker: "payments".into(),
        };
        assert_eq!(err.to_string(), "circuit 'payments' is open");
        assert!(err.is_rejection());

        let err: ResilienceError<String> = ResilienceError::Panicked {
            breaker: "payments".into(),
        };
        assert_eq!(err.to_string(), "call guarded by 'payments' panicked");
        assert!(!err.is_rejection());

        let err = ResilienceError::Upstream("boom".to_string());
        assert_eq!(err.upstream().map(String::as_str), Some("boom"));
        assert!(!err.is_timeout());
    }
}
