//! Payment gateway trait and in-memory implementation.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use domain::{Money, OrderId};
use serde_json::Value;
use thiserror::Error;

/// Default lifetime of a payment intent, in seconds.
pub const DEFAULT_EXPIRY_SECS: u64 = 1800;

/// Errors returned by payment gateway implementations.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The provider could not be reached.
    #[error("Payment provider unavailable: {0}")]
    Unavailable(String),

    /// The provider refused to open the intent.
    #[error("Payment provider rejected the request: {0}")]
    Rejected(String),
}

/// A request to open a payment intent for an order.
#[derive(Debug, Clone)]
pub struct PaymentRequest {
    /// Amount to collect.
    pub amount: Money,
    /// The order the intent pays for.
    pub order_id: OrderId,
    /// Seconds until the intent expires.
    pub expires_in_secs: u64,
}

impl PaymentRequest {
    /// Creates a request with the default expiry.
    pub fn new(amount: Money, order_id: OrderId) -> Self {
        Self {
            amount,
            order_id,
            expires_in_secs: DEFAULT_EXPIRY_SECS,
        }
    }
}

/// A payment intent opened with the provider.
#[derive(Debug, Clone)]
pub struct PaymentIntent {
    /// Provider-assigned payment identifier.
    pub provider_payment_id: String,
    /// Raw provider response, stored on the order and returned to the
    /// storefront for rendering (QR code and friends).
    pub payload: Value,
}

/// Trait for payment provider operations.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Opens a payment intent for the given request.
    async fn initiate(&self, request: PaymentRequest) -> Result<PaymentIntent, GatewayError>;

    /// Checks a webhook signature against the configured authenticity
    /// scheme.
    fn verify_notification(&self, signature: Option<&str>) -> bool;
}

#[derive(Debug, Default)]
struct InMemoryGatewayState {
    intents: Vec<(OrderId, Money)>,
    next_id: u32,
    fail_on_initiate: bool,
    reject_signature: bool,
}

/// In-memory payment gateway for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryGateway {
    state: Arc<RwLock<InMemoryGatewayState>>,
}

impl InMemoryGateway {
    /// Creates a new in-memory gateway.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the gateway to fail on the next initiate call.
    pub fn set_fail_on_initiate(&self, fail: bool) {
        self.state.write().unwrap().fail_on_initiate = fail;
    }

    /// Configures the gateway to reject all webhook signatures.
    pub fn set_reject_signature(&self, reject: bool) {
        self.state.write().unwrap().reject_signature = reject;
    }

    /// Returns the number of intents opened.
    pub fn intent_count(&self) -> usize {
        self.state.read().unwrap().intents.len()
    }

    /// Returns the order and amount of the most recent intent.
    pub fn last_intent(&self) -> Option<(OrderId, Money)> {
        self.state.read().unwrap().intents.last().copied()
    }
}

#[async_trait]
impl PaymentGateway for InMemoryGateway {
    async fn initiate(&self, request: PaymentRequest) -> Result<PaymentIntent, GatewayError> {
        let mut state = self.state.write().unwrap();

        if state.fail_on_initiate {
            return Err(GatewayError::Unavailable(
                "payment provider down".to_string(),
            ));
        }

        state.next_id += 1;
        let provider_payment_id = format!("PAY-{:04}", state.next_id);
        state.intents.push((request.order_id, request.amount));

        let payload = serde_json::json!({
            "pixId": provider_payment_id,
            "amount": request.amount.cents(),
            "qr": format!("PIX-QR-{provider_payment_id}"),
        });

        Ok(PaymentIntent {
            provider_payment_id,
            payload,
        })
    }

    fn verify_notification(&self, _signature: Option<&str>) -> bool {
        !self.state.read().unwrap().reject_signature
    }
}
