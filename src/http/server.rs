//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, timeout, request ID, metrics)
//! - Build the upstream clients and the payments breaker
//! - Bind server to listener and shut down gracefully

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{MatchedPath, Request},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::admin::setup_admin_router;
use crate::config::GatewayConfig;
use crate::http::{handlers, request};
use crate::observability::{metrics, spawn_event_logger};
use crate::resilience::{BreakerSettings, RetryPolicy};
use crate::upstream::{payment_breaker, OrdersClient, PaymentBreaker, PaymentsClient};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub orders: OrdersClient,
    pub payments: PaymentBreaker,
    pub retry_policy: RetryPolicy,
    pub orders_timeout: Duration,
    pub config: Arc<GatewayConfig>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: GatewayConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().build()?;

        let orders = OrdersClient::new(http.clone(), config.services.orders_url.clone());
        let payments = payment_breaker(
            PaymentsClient::new(http, config.services.payments_url.clone()),
            BreakerSettings::from(&config.breaker),
            config.breaker.fallback_enabled,
        );

        Ok(Self {
            orders,
            payments,
            retry_policy: RetryPolicy::from(&config.retry),
            orders_timeout: Duration::from_millis(config.timeouts.orders_ms),
            config: Arc::new(config),
            started_at: Instant::now(),
        })
    }
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: GatewayConfig) -> Result<Self, reqwest::Error> {
        let state = AppState::new(config)?;
        let router = Self::build_router(state.clone());
        Ok(Self { router, state })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(state: AppState) -> Router {
        let request_timeout = Duration::from_secs(state.config.timeouts.request_secs);

        Router::new()
            .route("/api/products", get(handlers::list_products))
            .route("/api/orders", post(handlers::create_order))
            .route("/api/orders/{id}", get(handlers::get_order))
            .route("/api/orders/{id}/pay", post(handlers::pay_order))
            .merge(setup_admin_router())
            .route_layer(middleware::from_fn(track_metrics))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(request::set_request_id_layer())
                    .layer(TraceLayer::new_for_http().make_span_with(|req: &Request| {
                        tracing::info_span!(
                            "request",
                            method = %req.method(),
                            uri = %req.uri(),
                            request_id = %request::request_id(req.headers()),
                        )
                    }))
                    .layer(TimeoutLayer::new(request_timeout))
                    .layer(request::propagate_request_id_layer()),
            )
    }

    /// Shared state, for callers that need the breaker directly.
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            orders = %self.state.config.services.orders_url,
            payments = %self.state.config.services.payments_url,
            "HTTP server starting"
        );

        let breaker = &self.state.payments;
        let event_logger = spawn_event_logger(breaker.name(), breaker.subscribe());

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        event_logger.abort();
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Record request count and latency under the matched route template.
async fn track_metrics(request: Request, next: Next) -> Response {
    let start = std::time::Instant::now();
    let method = request.method().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_owned())
        .unwrap_or_else(|| request.uri().path().to_owned());

    let response = next.run(request).await;
    metrics::record_request(&method, &route, response.status().as_u16(), start);
    response
}
