//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → shutdown_signal resolves
//!
//! Shutdown (shutdown.rs):
//!     trigger → every subscriber stops → server drains in-flight requests
//! ```
//!
//! # Design Decisions
//! - Ordered startup in main: config, logging, metrics, then the listener
//! - Graceful shutdown: stop accepting, let in-flight requests finish

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::shutdown_signal;
