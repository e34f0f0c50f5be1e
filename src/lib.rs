//! Resilient API gateway library.
//!
//! Fronts an orders service and a payments service. Orders calls are retried
//! with exponential backoff under a deadline; payments calls go through a
//! circuit breaker with a rolling error window and a deferred-processing
//! fallback.

pub mod admin;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod upstream;

pub use config::schema::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use resilience::{CircuitBreaker, CircuitState, FireResult, ResilienceError, RetryPolicy};
