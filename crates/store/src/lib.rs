//! Storage backends for products, coupons, and orders.
//!
//! Three traits describe what the checkout core needs from storage:
//! [`InventoryLedger`] (atomic stock reserve/restore), [`CouponLedger`]
//! (validation and atomic use accounting), and [`OrderStore`] (durable
//! order records). Each has an in-memory implementation for tests and
//! local development and a PostgreSQL implementation for production.
//!
//! The stores are independent resources with no shared transaction;
//! cross-store consistency is the checkout saga's job.

pub mod coupons;
pub mod error;
pub mod inventory;
pub mod memory;
pub mod orders;
pub mod postgres;

pub use coupons::{CouponError, CouponLedger};
pub use error::StoreError;
pub use inventory::{InventoryError, InventoryLedger};
pub use memory::{InMemoryCoupons, InMemoryInventory, InMemoryOrders};
pub use orders::{OrderStore, OrderStoreError};
pub use postgres::{PostgresCoupons, PostgresInventory, PostgresOrders, run_migrations};
