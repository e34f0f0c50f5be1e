//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize, apply environment overrides)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → breaker/retry settings derived once at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; breakers keep their settings for life
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{default_config, load_config, ConfigError};
pub use schema::{
    BreakerConfig, GatewayConfig, ListenerConfig, LogFormat, ObservabilityConfig, RetryConfig,
    ServicesConfig, TimeoutConfig,
};
