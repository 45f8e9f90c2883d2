//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use checkout::{CheckoutError, WebhookError};
use store::OrderStoreError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Missing or invalid caller identity.
    Unauthorized(String),
    /// Authenticated but not allowed.
    Forbidden(String),
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Checkout saga error.
    Checkout(CheckoutError),
    /// Webhook reconciliation error.
    Webhook(WebhookError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Checkout(err) => checkout_error_to_response(err),
            ApiError::Webhook(err) => webhook_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn checkout_error_to_response(err: CheckoutError) -> (StatusCode, String) {
    match &err {
        CheckoutError::EmptyCart
        | CheckoutError::NoItemsSelected
        | CheckoutError::InvalidProduct(_)
        | CheckoutError::InsufficientStock { .. }
        | CheckoutError::InvalidCoupon(_)
        | CheckoutError::ExpiredCoupon(_)
        | CheckoutError::CouponExhausted(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        CheckoutError::Gateway(_) => {
            tracing::error!(error = %err, "payment gateway failure");
            (StatusCode::BAD_GATEWAY, err.to_string())
        }
        CheckoutError::Storage(_) => {
            tracing::error!(error = %err, "storage failure during checkout");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

fn webhook_error_to_response(err: WebhookError) -> (StatusCode, String) {
    match &err {
        WebhookError::Unauthorized => (StatusCode::UNAUTHORIZED, err.to_string()),
        WebhookError::MissingPaymentId => (StatusCode::BAD_REQUEST, err.to_string()),
        WebhookError::OrderNotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        WebhookError::Storage(_) => {
            tracing::error!(error = %err, "storage failure during reconciliation");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        ApiError::Checkout(err)
    }
}

impl From<WebhookError> for ApiError {
    fn from(err: WebhookError) -> Self {
        ApiError::Webhook(err)
    }
}

impl From<OrderStoreError> for ApiError {
    fn from(err: OrderStoreError) -> Self {
        match &err {
            OrderStoreError::NotFound(_) | OrderStoreError::NoOrderForPayment(_) => {
                ApiError::NotFound(err.to_string())
            }
            OrderStoreError::Store(_) => ApiError::Internal(err.to_string()),
        }
    }
}
