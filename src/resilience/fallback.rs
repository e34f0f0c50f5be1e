//! Fallback results.
//!
//! A fallback is registered once per breaker and receives exactly the
//! arguments the guarded call would have received. It runs for both the
//! open-circuit rejection path and the failed-call path, and must not touch
//! the protected dependency.

use std::sync::Arc;

/// Substitute-result function for a breaker with argument type `A`.
pub type FallbackFn<A, T> = Arc<dyn Fn(&A) -> T + Send + Sync>;

/// Value returned by a successful `fire`, tagged by where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FireResult<T> {
    /// The guarded call succeeded.
    Success(T),
    /// The call was rejected or failed and the fallback produced this.
    Fallback(T),
}

impl<T> FireResult<T> {
    pub fn is_fallback(&self) -> bool {
        matches!(self, FireResult::Fallback(_))
    }

    pub fn value(&self) -> &T {
        match self {
            FireResult::Success(v) | FireResult::Fallback(v) => v,
        }
    }

    pub fn into_inner(self) -> T {
        match self {
            FireResult::Success(v) | FireResult::Fallback(v) => v,
        }
    }
}
