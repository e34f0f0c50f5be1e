use axum::{extract::State, Json};
use serde::Serialize;

use crate::config::BreakerConfig;
use crate::http::server::AppState;
use crate::resilience::{CircuitState, StatsSnapshot};
use crate::resilience::rolling_window::WindowCounts;

#[derive(Serialize)]
pub struct BreakerStatusResponse {
    pub breaker: String,
    pub state: CircuitState,
    pub stats: StatsSnapshot,
    pub window: WindowCounts,
    pub config: BreakerConfig,
}

#[derive(Serialize)]
pub struct ResetResponse {
    pub message: &'static str,
    pub state: CircuitState,
}

#[derive(Serialize)]
pub struct BreakerSummary {
    pub state: CircuitState,
    pub stats: StatsSnapshot,
}

#[derive(Serialize)]
pub struct ServiceUrls {
    pub orders: String,
    pub payments: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub service: &'static str,
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_secs: f64,
    pub circuit_breaker: BreakerSummary,
    pub services: ServiceUrls,
}

pub async fn get_breaker_status(State(state): State<AppState>) -> Json<BreakerStatusResponse> {
    let status = state.payments.status();
    Json(BreakerStatusResponse {
        breaker: status.name,
        state: status.state,
        stats: status.stats,
        window: status.window,
        config: state.config.breaker.clone(),
    })
}

/// Zero the cumulative stats. The circuit state is left alone.
pub async fn reset_breaker(State(state): State<AppState>) -> Json<ResetResponse> {
    state.payments.reset_stats();
    Json(ResetResponse {
        message: "Circuit breaker stats reset",
        state: state.payments.state(),
    })
}

pub async fn get_health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        service: "api-gateway",
        status: "up",
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: state.started_at.elapsed().as_secs_f64(),
        circuit_breaker: BreakerSummary {
            state: state.payments.state(),
            stats: state.payments.stats(),
        },
        services: ServiceUrls {
            orders: state.config.services.orders_url.clone(),
            payments: state.config.services.payments_url.clone(),
        },
    })
}
