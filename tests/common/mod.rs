//! Shared utilities for gateway integration tests.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use axum::{
    body::Bytes,
    http::{Method, StatusCode, Uri},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use resilient_gateway::config::GatewayConfig;
use resilient_gateway::upstream::PaymentBreaker;
use resilient_gateway::{HttpServer, Shutdown};

/// A running mock service and the number of requests it has seen.
pub struct MockService {
    pub addr: SocketAddr,
    pub hits: Arc<AtomicU32>,
}

impl MockService {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn hits(&self) -> u32 {
        self.hits.load(Ordering::SeqCst)
    }
}

/// Start a programmable mock backend on an ephemeral port.
///
/// `handler` gets the method, path, the parsed JSON body (or `Null`) and the
/// zero-based index of the request.
pub async fn start_programmable_service<F, Fut>(handler: F) -> MockService
where
    F: Fn(Method, String, Value, u32) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, Value)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicU32::new(0));
    let handler = Arc::new(handler);

    let counter = hits.clone();
    let app = Router::new().fallback(move |method: Method, uri: Uri, body: Bytes| {
        let handler = handler.clone();
        let counter = counter.clone();
        async move {
            let index = counter.fetch_add(1, Ordering::SeqCst);
            let body = serde_json::from_slice(&body).unwrap_or(Value::Null);
            let (status, reply) = handler(method, uri.path().to_string(), body, index).await;
            (StatusCode::from_u16(status).unwrap(), Json(reply))
        }
    });

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockService { addr, hits }
}

pub fn order_json(id: &str, status: &str) -> Value {
    json!({
        "id": id,
        "status": status,
        "total": 59.9,
        "payment_method": "card",
        "items": [{ "product_id": 1, "quantity": 2 }],
    })
}

/// Orders service knowing order "1" (pending) and "2" (already paid).
pub async fn start_orders_service() -> MockService {
    start_programmable_service(|method, path, _body, _index| async move {
        match (method, path.as_str()) {
            (Method::GET, "/products") => (200, json!({ "products": [{ "id": 1, "name": "Laptop" }] })),
            (Method::GET, "/orders/1") => (200, json!({ "order": order_json("1", "PENDING") })),
            (Method::GET, "/orders/2") => (200, json!({ "order": order_json("2", "PAID") })),
            (Method::GET, _) => (404, json!({ "error": "order not found" })),
            (Method::POST, "/orders") => (201, json!({ "order": order_json("3", "PENDING") })),
            _ => (405, Value::Null),
        }
    })
    .await
}

/// Payments service that always settles.
pub async fn start_healthy_payments() -> MockService {
    start_programmable_service(|_method, _path, body, index| async move {
        (
            200,
            json!({
                "transaction_id": format!("TXN-{}", index),
                "order_id": body["order_id"],
                "status": "APPROVED",
            }),
        )
    })
    .await
}

/// Payments service that always fails with 500.
pub async fn start_failing_payments() -> MockService {
    start_programmable_service(|_method, _path, _body, _index| async move {
        (500, json!({ "error": "payment processor down" }))
    })
    .await
}

/// Config pointing at the mocks, with short delays for fast tests.
pub fn gateway_config(orders: &MockService, payments: &MockService) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.services.orders_url = orders.url();
    config.services.payments_url = payments.url();
    config.timeouts.orders_ms = 1000;
    config.retry.base_delay_ms = 10;
    config.retry.max_delay_ms = 100;
    config.breaker.timeout_ms = 500;
    config.breaker.minimum_volume = 2;
    config.observability.metrics_enabled = false;
    config
}

/// A running gateway.
pub struct TestGateway {
    pub addr: SocketAddr,
    pub breaker: PaymentBreaker,
    pub shutdown: Shutdown,
}

impl TestGateway {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

pub async fn start_gateway(config: GatewayConfig) -> TestGateway {
    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = HttpServer::new(config).unwrap();
    let breaker = server.state().payments.clone();
    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();

    tokio::spawn(async move {
        server.run(listener, rx).await.unwrap();
    });

    TestGateway {
        addr,
        breaker,
        shutdown,
    }
}
