//! Inventory ledger trait.

use async_trait::async_trait;
use domain::{ProductId, ProductSnapshot};
use thiserror::Error;

use crate::error::StoreError;

/// Errors from inventory operations.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// No product exists with the given id.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// The conditional decrement failed because stock is too low.
    #[error("Insufficient stock for {title}")]
    InsufficientStock { title: String },

    /// The backing store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<sqlx::Error> for InventoryError {
    fn from(e: sqlx::Error) -> Self {
        Self::Store(StoreError::Database(e))
    }
}

/// Reserves and restores product stock.
///
/// Implementations must perform each operation as a single atomic
/// conditional write: the `stock >= quantity` check and the decrement
/// are indivisible, so concurrent callers racing on the same product
/// are serialized by the store itself, never by in-process locks.
/// Stock never goes negative.
#[async_trait]
pub trait InventoryLedger: Send + Sync {
    /// Atomically checks `stock >= quantity` and decrements by `quantity`.
    ///
    /// On success returns the product snapshot (title, unit price) used
    /// to build the order line.
    async fn reserve(
        &self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<ProductSnapshot, InventoryError>;

    /// Atomically increments stock by `quantity`.
    ///
    /// Restoration is not deduplicated; callers must restore at most
    /// once per originally-reserved line.
    async fn restore(&self, product_id: ProductId, quantity: u32) -> Result<(), InventoryError>;
}
