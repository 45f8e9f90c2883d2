//! Order store trait.

use async_trait::async_trait;
use domain::{Order, OrderDraft, OrderId, OrderStatus, PaymentPatch};
use thiserror::Error;

use crate::error::StoreError;

/// Errors from order storage operations.
#[derive(Debug, Error)]
pub enum OrderStoreError {
    /// No order exists with the given id.
    #[error("Order not found: {0}")]
    NotFound(OrderId),

    /// No order carries the given provider payment identifier.
    #[error("No order for provider payment id {0}")]
    NoOrderForPayment(String),

    /// The backing store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<sqlx::Error> for OrderStoreError {
    fn from(e: sqlx::Error) -> Self {
        Self::Store(StoreError::Database(e))
    }
}

/// Durable storage for order records.
///
/// Orders are created once and never deleted; afterwards only the
/// payment sub-record and the status change. Updates are single
/// conditional writes keyed by order id, safe under the (rare) case of
/// two writers touching the same order.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persists a draft, assigning the order id and creation timestamp.
    ///
    /// The stored order starts at status `created` with a pending PIX
    /// payment record.
    async fn create(&self, draft: OrderDraft) -> Result<Order, OrderStoreError>;

    /// Fetches an order by id.
    async fn get(&self, id: OrderId) -> Result<Order, OrderStoreError>;

    /// Merges a payment patch into the order's payment sub-record.
    ///
    /// Fields unset in the patch keep their stored values.
    async fn update_payment(
        &self,
        id: OrderId,
        patch: PaymentPatch,
    ) -> Result<Order, OrderStoreError>;

    /// Replaces the order's overall status.
    async fn update_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, OrderStoreError>;

    /// Resolves the order a provider payment identifier belongs to.
    ///
    /// When several orders carry the same identifier the earliest
    /// created one wins, matching the lookup semantics webhook
    /// reconciliation has always relied on.
    async fn find_by_provider_payment_id(
        &self,
        provider_id: &str,
    ) -> Result<Order, OrderStoreError>;

    /// Returns the most recent orders, newest first.
    async fn list_recent(&self, limit: usize) -> Result<Vec<Order>, OrderStoreError>;
}
