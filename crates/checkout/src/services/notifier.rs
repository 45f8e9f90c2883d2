//! Order notification trait and implementations.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use domain::{Order, OrderId};
use thiserror::Error;

/// Errors returned by notifier implementations.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The notification channel failed.
    #[error("Notification failed: {0}")]
    Delivery(String),
}

/// Trait for post-confirmation notifications.
///
/// Deliveries are fire-and-forget from the caller's perspective;
/// failures are logged, never escalated.
#[async_trait]
pub trait OrderNotifier: Send + Sync {
    /// Notifies the recipient that an order's payment was confirmed.
    async fn order_confirmed(&self, recipient: &str, order: &Order) -> Result<(), NotifyError>;
}

/// Notifier that writes confirmations to the log only.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl OrderNotifier for LogNotifier {
    async fn order_confirmed(&self, recipient: &str, order: &Order) -> Result<(), NotifyError> {
        tracing::info!(
            recipient,
            order_id = %order.id,
            total = %order.total,
            "order confirmed notification"
        );
        Ok(())
    }
}

#[derive(Debug, Default)]
struct InMemoryNotifierState {
    sent: Vec<(String, OrderId)>,
    fail_on_send: bool,
}

/// In-memory notifier for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryNotifier {
    state: Arc<RwLock<InMemoryNotifierState>>,
}

impl InMemoryNotifier {
    /// Creates a new in-memory notifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the notifier to fail on the next send.
    pub fn set_fail_on_send(&self, fail: bool) {
        self.state.write().unwrap().fail_on_send = fail;
    }

    /// Returns the number of notifications delivered.
    pub fn sent_count(&self) -> usize {
        self.state.read().unwrap().sent.len()
    }

    /// Returns the recipient of the most recent notification.
    pub fn last_recipient(&self) -> Option<String> {
        self.state
            .read()
            .unwrap()
            .sent
            .last()
            .map(|(recipient, _)| recipient.clone())
    }
}

#[async_trait]
impl OrderNotifier for InMemoryNotifier {
    async fn order_confirmed(&self, recipient: &str, order: &Order) -> Result<(), NotifyError> {
        let mut state = self.state.write().unwrap();

        if state.fail_on_send {
            return Err(NotifyError::Delivery("smtp unreachable".to_string()));
        }

        state.sent.push((recipient.to_string(), order.id));
        Ok(())
    }
}
