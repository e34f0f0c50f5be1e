//! Gateway endpoints backed by the orders and payments services.
//!
//! Catalog and order calls go through `retry_when` with a per-attempt
//! deadline. Payments go through the circuit breaker only, so a failing
//! payments service is never retried on top of the breaker's own accounting.

use std::future::Future;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use crate::http::request::request_id;
use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::resilience::{govern, retry_when, FireResult, ResilienceError};
use crate::upstream::types::{ORDER_PAID, ORDER_PENDING_PROCESSING};
use crate::upstream::{OrdersClient, PaymentOutcome, PaymentRequest, UpstreamError};

type OrdersResult<T> = Result<T, ResilienceError<UpstreamError>>;

/// Call the orders service with retries, each attempt under the orders
/// deadline. Errors rejected by `retryable` end the loop early.
async fn call_orders_with_retry<T, F, Fut, P>(
    state: &AppState,
    operation: &'static str,
    call: F,
    retryable: P,
) -> OrdersResult<T>
where
    F: Fn(OrdersClient) -> Fut,
    Fut: Future<Output = Result<T, UpstreamError>>,
    P: Fn(&ResilienceError<UpstreamError>) -> bool,
{
    let mut attempt = 0u32;
    retry_when(
        &state.retry_policy,
        || {
            attempt += 1;
            if attempt > 1 {
                metrics::record_retry(operation);
            }
            let pending = govern(state.orders_timeout, call(state.orders.clone()));
            async move { pending.await.into_result() }
        },
        retryable,
    )
    .await
}

/// Single orders call under the orders deadline, no retries.
async fn call_orders<T, Fut>(state: &AppState, call: Fut) -> OrdersResult<T>
where
    Fut: Future<Output = Result<T, UpstreamError>>,
{
    govern(state.orders_timeout, call).await.into_result()
}

fn not_client_error(error: &ResilienceError<UpstreamError>) -> bool {
    !error.upstream().is_some_and(UpstreamError::is_client_error)
}

/// `GET /api/products`
pub async fn list_products(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    let request_id = request_id(&headers);
    tracing::info!(request_id = %request_id, "Listing products");

    call_orders_with_retry(
        &state,
        "list_products",
        |orders| async move { orders.list_products().await },
        |_| true,
    )
    .await
    .map(Json)
    .map_err(|e| {
        tracing::warn!(request_id = %request_id, error = %e, "Products unavailable");
        ApiError::unavailable("Product catalog temporarily unavailable")
    })
}

/// `POST /api/orders`
pub async fn create_order(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let request_id = request_id(&headers);
    tracing::info!(request_id = %request_id, "Creating order");

    let result = call_orders_with_retry(
        &state,
        "create_order",
        |orders| {
            let body = body.clone();
            async move { orders.create_order(&body).await }
        },
        not_client_error,
    )
    .await;

    match result {
        Ok(created) => Ok((StatusCode::CREATED, Json(created))),
        Err(ResilienceError::Upstream(UpstreamError::Status { status, body }))
            if (400..500).contains(&status) =>
        {
            tracing::info!(request_id = %request_id, status, "Order rejected by orders service");
            Err(ApiError::passthrough(status, body))
        }
        Err(e) => {
            tracing::warn!(request_id = %request_id, error = %e, "Order creation failed");
            Err(ApiError::unavailable("Could not create order"))
        }
    }
}

/// `GET /api/orders/{id}`
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    let request_id = request_id(&headers);
    tracing::debug!(request_id = %request_id, order_id = %id, "Fetching order");

    match call_orders(&state, state.orders.get_order_raw(&id)).await {
        Ok(order) => Ok(Json(order)),
        Err(e) if e.upstream().is_some_and(UpstreamError::is_not_found) => {
            Err(ApiError::not_found("Order"))
        }
        Err(e) => {
            tracing::warn!(request_id = %request_id, order_id = %id, error = %e, "Order lookup failed");
            Err(ApiError::unavailable("Could not fetch order"))
        }
    }
}

/// `POST /api/orders/{id}/pay`
///
/// The order must still be pending. The payment goes through the payments
/// breaker; a fallback answer is reported as 202 so clients can tell it
/// apart from a settled payment.
pub async fn pay_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let request_id = request_id(&headers);
    tracing::info!(
        request_id = %request_id,
        order_id = %id,
        breaker_state = %state.payments.state(),
        "Processing payment"
    );

    let order = match call_orders(&state, state.orders.get_order(&id)).await {
        Ok(order) => order,
        Err(e) if e.upstream().is_some_and(UpstreamError::is_not_found) => {
            return Err(ApiError::not_found("Order"));
        }
        Err(e) => {
            tracing::warn!(request_id = %request_id, order_id = %id, error = %e, "Order lookup failed");
            return Err(ApiError::unavailable("Could not fetch order"));
        }
    };

    if !order.is_pending() {
        return Err(ApiError {
            status: StatusCode::BAD_REQUEST,
            body: json!({
                "error": format!("Order was already processed. Status: {}", order.status),
            }),
        });
    }

    match state.payments.fire(PaymentRequest::for_order(&order)).await {
        Ok(FireResult::Success(outcome)) => {
            let mut paid = order;
            paid.status = ORDER_PAID.to_string();
            if let PaymentOutcome::Processed(receipt) = &outcome {
                paid.extra
                    .insert("transaction_id".to_string(), json!(receipt.transaction_id));
            }
            tracing::info!(request_id = %request_id, order_id = %id, "Payment processed");

            let body = json!({
                "success": true,
                "message": "Payment processed successfully",
                "order": paid,
                "payment": outcome,
            });
            Ok((StatusCode::OK, Json(body)).into_response())
        }
        Ok(FireResult::Fallback(outcome)) => {
            let mut deferred = order;
            deferred.status = ORDER_PENDING_PROCESSING.to_string();
            tracing::warn!(request_id = %request_id, order_id = %id, "Payment deferred by fallback");

            let body = json!({
                "success": true,
                "message": "Order recorded, payment pending processing",
                "order": deferred,
                "payment_info": outcome,
                "warning": "The payments service is experiencing problems. Your payment will be processed as soon as possible.",
            });
            Ok((StatusCode::ACCEPTED, Json(body)).into_response())
        }
        Err(e) => {
            tracing::warn!(request_id = %request_id, order_id = %id, error = %e, "Payment failed");
            Err(ApiError::from_payment_failure(&e))
        }
    }
}
