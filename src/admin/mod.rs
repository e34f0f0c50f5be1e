pub mod handlers;

use axum::{
    routing::{get, post},
    Router,
};
use crate::http::server::AppState;
use self::handlers::*;

/// Breaker introspection and health routes.
pub fn setup_admin_router() -> Router<AppState> {
    Router::new()
        .route("/api/circuit-breaker/status", get(get_breaker_status))
        .route("/api/circuit-breaker/reset", post(reset_breaker))
        .route("/api/health", get(get_health))
}
