//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Breakers produce:
//!     → breaker_events.rs (event stream → logs + metrics)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Request ID flows through all request logs
//! - Metrics are cheap (atomic increments)

pub mod breaker_events;
pub mod logging;
pub mod metrics;

pub use breaker_events::spawn_event_logger;
pub use logging::init_logging;
pub use metrics::init_metrics;
