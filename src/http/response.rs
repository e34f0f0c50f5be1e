//! Response shaping.
//!
//! # Responsibilities
//! - Map upstream and resilience errors to HTTP status codes
//! - Render a uniform JSON error body
//!
//! # Design Decisions
//! - Client errors from a service (4xx) pass through with the service's body
//! - Exhausted retries and open circuits are 503
//! - Breaker timeouts are 504, other payment failures 502

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use crate::resilience::ResilienceError;
use crate::upstream::UpstreamError;

/// Error response produced by a gateway handler.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: Value,
}

impl ApiError {
    pub fn new(status: StatusCode, error: &str, message: &str) -> Self {
        Self {
            status,
            body: json!({ "error": error, "message": message }),
        }
    }

    /// Forward a service's own error answer unchanged.
    pub fn passthrough(status: u16, body: Value) -> Self {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
        Self { status, body }
    }

    pub fn not_found(what: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            body: json!({ "error": format!("{} not found", what) }),
        }
    }

    pub fn unavailable(error: &str) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            error,
            "The service is temporarily unavailable, please try again shortly",
        )
    }

    /// Map a failed payments call that had no fallback.
    pub fn from_payment_failure(error: &ResilienceError<UpstreamError>) -> Self {
        let detail = error.to_string();
        let (status, title) = match error {
            ResilienceError::CircuitOpen { .. } => {
                (StatusCode::SERVICE_UNAVAILABLE, "Payments circuit is open")
            }
            ResilienceError::Timeout(_) => (StatusCode::GATEWAY_TIMEOUT, "Payments service timed out"),
            ResilienceError::Upstream(_) | ResilienceError::Panicked { .. } => {
                (StatusCode::BAD_GATEWAY, "Payments service failed")
            }
        };
        Self {
            status,
            body: json!({
                "error": title,
                "message": "Please try again",
                "details": detail,
            }),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
