//! Domain types for the checkout and payment reconciliation service.
//!
//! This crate holds the value objects and entities shared by every other
//! crate: typed identifiers, money, products, coupons, and the order
//! record with its status and payment-status state machines. Everything
//! here is plain data plus pure logic; storage and orchestration live in
//! the `store` and `checkout` crates.

pub mod coupon;
pub mod ids;
pub mod money;
pub mod order;
pub mod payment;
pub mod product;
pub mod status;

pub use coupon::{Coupon, CouponApplied, CouponCode, DiscountKind};
pub use ids::{OrderId, ProductId, UserId};
pub use money::Money;
pub use order::{Address, LineItem, Order, OrderDraft};
pub use payment::{PaymentMethod, PaymentPatch, PaymentRecord, PaymentStatus};
pub use product::{Product, ProductSnapshot};
pub use status::{OrderStatus, UnknownStatus};
