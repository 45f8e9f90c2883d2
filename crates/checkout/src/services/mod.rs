//! External service traits used by the checkout saga and reconciler.

pub mod gateway;
pub mod notifier;
pub mod pix;

pub use gateway::{
    DEFAULT_EXPIRY_SECS, GatewayError, InMemoryGateway, PaymentGateway, PaymentIntent,
    PaymentRequest,
};
pub use notifier::{InMemoryNotifier, LogNotifier, NotifyError, OrderNotifier};
pub use pix::{PixClient, WebhookAuthenticity};
