//! Wire types exchanged with the orders and payments services.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Order state that allows a payment attempt.
pub const ORDER_PENDING: &str = "PENDING";
/// Order state after a successful payment.
pub const ORDER_PAID: &str = "PAID";
/// Order state while payment is deferred by the fallback.
pub const ORDER_PENDING_PROCESSING: &str = "PENDING_PROCESSING";

/// Errors from a downstream HTTP service.
#[derive(Debug, Clone, Error)]
pub enum UpstreamError {
    /// The service answered with a non-success status.
    #[error("upstream returned status {status}")]
    Status { status: u16, body: Value },

    /// The request never got a response (connect, reset, client timeout).
    #[error("transport error: {0}")]
    Transport(String),

    /// The response body did not match the expected shape.
    #[error("invalid response body: {0}")]
    Decode(String),
}

impl UpstreamError {
    pub fn status(&self) -> Option<u16> {
        match self {
            UpstreamError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// 4xx answers: retrying cannot help.
    pub fn is_client_error(&self) -> bool {
        matches!(self.status(), Some(400..=499))
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            UpstreamError::Decode(e.to_string())
        } else {
            UpstreamError::Transport(e.to_string())
        }
    }
}

/// An order as stored by the orders service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub status: String,
    pub total: f64,
    pub payment_method: String,
    /// Any further fields, passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Order {
    pub fn is_pending(&self) -> bool {
        self.status == ORDER_PENDING
    }
}

/// Envelope returned by `GET /orders/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderEnvelope {
    pub order: Order,
}

/// Body sent to the payments service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub order_id: String,
    pub amount: f64,
    pub payment_method: String,
}

impl PaymentRequest {
    pub fn for_order(order: &Order) -> Self {
        Self {
            order_id: order.id.clone(),
            amount: order.total,
            payment_method: order.payment_method.clone(),
        }
    }
}

/// Successful answer from the payments service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentReceipt {
    pub transaction_id: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// What the gateway hands back for a payment: a real receipt or a
/// deferred-processing notice produced by the fallback.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PaymentOutcome {
    Processed(PaymentReceipt),
    Deferred(PaymentFallback),
}

/// Degraded payment response served when the payments service is
/// unavailable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentFallback {
    pub success: bool,
    pub fallback: bool,
    pub order_id: String,
    pub amount: f64,
    pub payment_method: String,
    pub status: &'static str,
    pub message: &'static str,
    pub instructions: &'static str,
    pub timestamp_ms: u128,
}

impl PaymentFallback {
    pub fn for_request(request: &PaymentRequest) -> Self {
        let timestamp_ms = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        Self {
            success: false,
            fallback: true,
            order_id: request.order_id.clone(),
            amount: request.amount,
            payment_method: request.payment_method.clone(),
            status: ORDER_PENDING_PROCESSING,
            message: "The payments service is unavailable. Your order has been recorded and will be processed once it recovers.",
            instructions: "You will be notified when your payment has been processed.",
            timestamp_ms,
        }
    }
}
