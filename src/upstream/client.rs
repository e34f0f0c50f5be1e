//! HTTP clients for the orders and payments services.
//!
//! # Responsibilities
//! - Build requests against the configured base URLs
//! - Map non-success statuses and transport problems to `UpstreamError`
//!
//! Deadlines are not set here: callers wrap every call in
//! `resilience::timeouts::govern`, so a slow answer is reported as a timeout
//! rather than a transport error.

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::upstream::types::{Order, OrderEnvelope, PaymentReceipt, PaymentRequest, UpstreamError};

async fn send<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, UpstreamError> {
    let response = request.send().await?;
    let status = response.status();

    if !status.is_success() {
        let body = response.json::<Value>().await.unwrap_or(Value::Null);
        return Err(UpstreamError::Status {
            status: status.as_u16(),
            body,
        });
    }

    response
        .json::<T>()
        .await
        .map_err(|e| UpstreamError::Decode(e.to_string()))
}

fn join(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}

/// Client for the orders service (catalog and orders).
#[derive(Debug, Clone)]
pub struct OrdersClient {
    http: Client,
    base_url: String,
}

impl OrdersClient {
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /products`
    pub async fn list_products(&self) -> Result<Value, UpstreamError> {
        send(self.http.get(join(&self.base_url, "/products"))).await
    }

    /// `POST /orders`
    pub async fn create_order(&self, body: &Value) -> Result<Value, UpstreamError> {
        send(self.http.post(join(&self.base_url, "/orders")).json(body)).await
    }

    /// `GET /orders/{id}`, returned as-is.
    pub async fn get_order_raw(&self, id: &str) -> Result<Value, UpstreamError> {
        send(self.http.get(join(&self.base_url, &format!("/orders/{}", id)))).await
    }

    /// `GET /orders/{id}`, decoded.
    pub async fn get_order(&self, id: &str) -> Result<Order, UpstreamError> {
        let envelope: OrderEnvelope =
            send(self.http.get(join(&self.base_url, &format!("/orders/{}", id)))).await?;
        Ok(envelope.order)
    }
}

/// Client for the payments service.
#[derive(Debug, Clone)]
pub struct PaymentsClient {
    http: Client,
    base_url: String,
}

impl PaymentsClient {
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `POST /payments/process`
    pub async fn process(&self, request: &PaymentRequest) -> Result<PaymentReceipt, UpstreamError> {
        tracing::debug!(order_id = %request.order_id, amount = request.amount, "Calling payments service");
        send(self.http.post(join(&self.base_url, "/payments/process")).json(request)).await
    }
}
