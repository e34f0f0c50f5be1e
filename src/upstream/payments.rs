//! Breaker-protected payments call.

use crate::resilience::{BreakerSettings, CircuitBreaker};
use crate::upstream::client::PaymentsClient;
use crate::upstream::types::{PaymentFallback, PaymentOutcome, PaymentRequest, UpstreamError};

/// Name the payments breaker reports in logs, metrics and status.
pub const PAYMENTS_BREAKER: &str = "payments";

/// Breaker type guarding the payments service.
pub type PaymentBreaker = CircuitBreaker<PaymentRequest, PaymentOutcome, UpstreamError>;

/// Build the payments breaker, optionally with its deferred-processing
/// fallback.
pub fn payment_breaker(
    client: PaymentsClient,
    settings: BreakerSettings,
    with_fallback: bool,
) -> PaymentBreaker {
    let mut builder =
        CircuitBreaker::builder::<PaymentRequest, PaymentOutcome>(PAYMENTS_BREAKER, settings);
    if with_fallback {
        builder = builder.fallback(|request: &PaymentRequest| {
            PaymentOutcome::Deferred(PaymentFallback::for_request(request))
        });
    }

    builder.build(move |request: PaymentRequest| {
        let client = client.clone();
        async move { client.process(&request).await.map(PaymentOutcome::Processed) }
    })
}
