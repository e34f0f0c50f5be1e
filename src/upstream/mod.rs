//! Downstream services the gateway fronts.
//!
//! # Data Flow
//! ```text
//! http handlers
//!     → client.rs (reqwest calls, status mapping)
//!     → types.rs (orders, payment requests and receipts)
//!     → payments.rs (breaker-wrapped payments call with fallback)
//! ```

pub mod client;
pub mod payments;
pub mod types;

pub use client::{OrdersClient, PaymentsClient};
pub use payments::{payment_breaker, PaymentBreaker, PAYMENTS_BREAKER};
pub use types::{
    Order, PaymentFallback, PaymentOutcome, PaymentReceipt, PaymentRequest, UpstreamError,
};
