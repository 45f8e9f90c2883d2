//! The order entity and its constituent parts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::coupon::CouponApplied;
use crate::ids::{OrderId, ProductId, UserId};
use crate::money::Money;
use crate::payment::PaymentRecord;
use crate::status::OrderStatus;

/// A shipping address as supplied by the customer.
///
/// Free-form; the core validates nothing here beyond carrying it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub postal_code: String,
}

/// One line of an order, snapshotted at creation time.
///
/// Title and unit price are frozen copies of the product as it was at
/// checkout; later catalog edits do not reach back into the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: ProductId,
    pub title: String,
    pub unit_price: Money,
    pub quantity: u32,
}

impl LineItem {
    /// Returns the total for this line (unit price times quantity).
    pub fn total(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

/// Everything needed to persist a new order, before an identifier and
/// creation timestamp exist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDraft {
    pub user_id: UserId,
    pub items: Vec<LineItem>,
    pub address: Address,
    pub subtotal: Money,
    pub shipping: Money,
    pub total: Money,
    pub coupon: Option<CouponApplied>,
}

/// A durable order record.
///
/// Created once by the checkout saga; afterwards only the payment
/// sub-record and status change, driven by payment reconciliation and
/// the admin endpoint. Orders are never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub items: Vec<LineItem>,
    pub address: Address,
    pub subtotal: Money,
    pub shipping: Money,
    pub total: Money,
    pub coupon: Option<CouponApplied>,
    pub payment: PaymentRecord,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Materializes a draft into a full order record.
    ///
    /// Status starts at `Created` with a pending PIX payment record.
    pub fn from_draft(id: OrderId, draft: OrderDraft, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id: draft.user_id,
            items: draft.items,
            address: draft.address,
            subtotal: draft.subtotal,
            shipping: draft.shipping,
            total: draft.total,
            coupon: draft.coupon,
            payment: PaymentRecord::default(),
            status: OrderStatus::Created,
            created_at,
        }
    }
}
