//! Checkout orchestration for the shop.
//!
//! This crate drives order creation as a saga over independent stores
//! (inventory, coupons, orders) plus an external payment provider, with
//! compensating actions on failure:
//! 1. Reserve stock for every selected cart line
//! 2. Validate and consume the coupon
//! 3. Persist the order record
//! 4. Open a PIX payment intent
//!
//! A failed step releases the stock reserved so far, in reverse order.
//! Once the order record exists no compensation runs; payment can be
//! retried against the created order.
//!
//! The flip side lives in [`WebhookReconciler`]: provider notifications
//! confirm or cancel the payment, cancellations restoring the reserved
//! stock.

pub mod error;
pub mod pricing;
pub mod reconciler;
pub mod saga;
pub mod services;
pub mod steps;

pub use error::{CheckoutError, WebhookError};
pub use pricing::{PricingPolicy, Quote};
pub use reconciler::{PixNotification, ReconcileOutcome, WebhookReconciler};
pub use saga::{CartLine, CheckoutReceipt, CheckoutRequest, CheckoutSaga};
pub use services::{
    DEFAULT_EXPIRY_SECS, GatewayError, InMemoryGateway, InMemoryNotifier, LogNotifier, NotifyError,
    OrderNotifier, PaymentGateway, PaymentIntent, PaymentRequest, PixClient, WebhookAuthenticity,
};
