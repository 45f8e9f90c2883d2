//! Checkout and reconciliation error types.

use domain::{CouponCode, ProductId};
use store::{CouponError, InventoryError, OrderStoreError, StoreError};
use thiserror::Error;

use crate::services::gateway::GatewayError;

/// Errors that can occur while executing the checkout saga.
///
/// Input errors (`EmptyCart`, `NoItemsSelected`, `InvalidProduct`,
/// `InvalidCoupon`, `ExpiredCoupon`) are raised before or during the
/// saga and carry a message suitable for the customer. Contention
/// errors (`InsufficientStock`, `CouponExhausted`) can arrive mid-saga
/// and always follow full compensation of earlier reservations.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The cart contained no lines at all.
    #[error("Cart is empty")]
    EmptyCart,

    /// The cart contained lines, but none were selected for purchase.
    #[error("No items selected for checkout")]
    NoItemsSelected,

    /// A cart line referenced a product that does not exist.
    #[error("Invalid product: {0}")]
    InvalidProduct(ProductId),

    /// A product did not have enough stock for the requested quantity.
    #[error("Insufficient stock for {title}")]
    InsufficientStock { title: String },

    /// No coupon exists with the given code.
    #[error("Invalid coupon: {0}")]
    InvalidCoupon(CouponCode),

    /// The coupon's validity window has passed.
    #[error("Coupon expired: {0}")]
    ExpiredCoupon(CouponCode),

    /// Every permitted use of the coupon has been consumed.
    #[error("Coupon has no uses left: {0}")]
    CouponExhausted(CouponCode),

    /// A storage backend failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    /// The payment provider failed or rejected the intent.
    #[error("Payment gateway error: {0}")]
    Gateway(#[from] GatewayError),
}

impl From<InventoryError> for CheckoutError {
    fn from(err: InventoryError) -> Self {
        match err {
            InventoryError::ProductNotFound(id) => CheckoutError::InvalidProduct(id),
            InventoryError::InsufficientStock { title } => {
                CheckoutError::InsufficientStock { title }
            }
            InventoryError::Store(e) => CheckoutError::Storage(e),
        }
    }
}

impl From<CouponError> for CheckoutError {
    fn from(err: CouponError) -> Self {
        match err {
            CouponError::NotFound(code) => CheckoutError::InvalidCoupon(code),
            CouponError::Expired(code) => CheckoutError::ExpiredCoupon(code),
            CouponError::Exhausted(code) => CheckoutError::CouponExhausted(code),
            CouponError::Store(e) => CheckoutError::Storage(e),
        }
    }
}

impl From<OrderStoreError> for CheckoutError {
    fn from(err: OrderStoreError) -> Self {
        match err {
            OrderStoreError::Store(e) => CheckoutError::Storage(e),
            // Lookup misses cannot happen for an order the saga just
            // created; fold them into a storage failure.
            other => CheckoutError::Storage(StoreError::Unavailable(other.to_string())),
        }
    }
}

/// Errors that can occur while reconciling a payment notification.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// The notification failed the authenticity check.
    #[error("Invalid webhook signature")]
    Unauthorized,

    /// The notification did not carry a payment identifier.
    #[error("Notification has no payment id")]
    MissingPaymentId,

    /// No order references the notified payment.
    #[error("No order for payment {0}")]
    OrderNotFound(String),

    /// A storage backend failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

impl From<OrderStoreError> for WebhookError {
    fn from(err: OrderStoreError) -> Self {
        match err {
            OrderStoreError::NoOrderForPayment(id) => WebhookError::OrderNotFound(id),
            OrderStoreError::NotFound(id) => WebhookError::OrderNotFound(id.to_string()),
            OrderStoreError::Store(e) => WebhookError::Storage(e),
        }
    }
}
