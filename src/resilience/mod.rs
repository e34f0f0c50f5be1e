//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Call to the payments service:
//!     → circuit_breaker.rs (admit, reject fast while open)
//!     → timeouts.rs (enforce the per-call deadline)
//!     → rolling_window.rs + stats.rs (record the outcome, maybe trip)
//!     → fallback.rs (degraded result on reject or failure)
//!     → events.rs (lifecycle events for observers)
//!
//! Call to the orders service:
//!     → retries.rs (re-attempt with backoff.rs delays)
//!     → timeouts.rs (deadline per attempt)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - Retries and the breaker guard different call paths and never share
//!   failure accounting
//! - Breakers are explicit values, one per dependency, never globals

pub mod backoff;
pub mod circuit_breaker;
pub mod error;
pub mod events;
pub mod fallback;
pub mod retries;
pub mod rolling_window;
pub mod stats;
pub mod timeouts;

pub use circuit_breaker::{BreakerSettings, BreakerStatus, CircuitBreaker, CircuitState};
pub use error::{ResilienceError, ResilienceResult};
pub use events::{BreakerEvent, EventKind};
pub use fallback::FireResult;
pub use retries::{retry, retry_when, RetryPolicy};
pub use stats::StatsSnapshot;
pub use timeouts::{govern, CallOutcome};
