//! Product catalog entities.

use serde::{Deserialize, Serialize};

use crate::ids::ProductId;
use crate::money::Money;

/// A product as held by the inventory store.
///
/// Stock is mutated only through the inventory ledger's reserve and
/// restore operations; it never goes negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    /// Unit price in minor currency units.
    pub price: Money,
    pub stock: u32,
}

impl Product {
    /// Creates a product with a fresh identifier.
    pub fn new(title: impl Into<String>, price: Money, stock: u32) -> Self {
        Self {
            id: ProductId::new(),
            title: title.into(),
            price,
            stock,
        }
    }
}

/// The slice of a product captured when stock is reserved.
///
/// Order lines are built from this snapshot, so the order keeps the
/// title and price as they were at checkout time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub id: ProductId,
    pub title: String,
    pub unit_price: Money,
}

impl From<&Product> for ProductSnapshot {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            title: product.title.clone(),
            unit_price: product.price,
        }
    }
}
