//! In-memory storage backends.
//!
//! These back the test suites and serve as the default backend when no
//! database is configured. Every mutating operation holds a single
//! write guard for the whole check-and-mutate, so the atomic
//! conditional-write contracts hold under concurrent callers.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::Utc;
use domain::{
    Coupon, CouponCode, Order, OrderDraft, OrderId, OrderStatus, PaymentPatch, Product, ProductId,
    ProductSnapshot,
};

use crate::coupons::{CouponError, CouponLedger};
use crate::error::StoreError;
use crate::inventory::{InventoryError, InventoryLedger};
use crate::orders::{OrderStore, OrderStoreError};

#[derive(Debug, Default)]
struct InventoryState {
    products: HashMap<ProductId, Product>,
    fail_on_reserve: bool,
    fail_on_restore: bool,
}

/// In-memory inventory ledger.
#[derive(Debug, Clone, Default)]
pub struct InMemoryInventory {
    state: Arc<RwLock<InventoryState>>,
}

impl InMemoryInventory {
    /// Creates an empty inventory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a product, returning its id.
    pub fn seed_product(&self, product: Product) -> ProductId {
        let id = product.id;
        self.state.write().unwrap().products.insert(id, product);
        id
    }

    /// Returns the current stock of a product.
    pub fn stock_of(&self, product_id: ProductId) -> Option<u32> {
        self.state
            .read()
            .unwrap()
            .products
            .get(&product_id)
            .map(|p| p.stock)
    }

    /// Configures reserve calls to fail with a store error.
    pub fn set_fail_on_reserve(&self, fail: bool) {
        self.state.write().unwrap().fail_on_reserve = fail;
    }

    /// Configures restore calls to fail with a store error.
    pub fn set_fail_on_restore(&self, fail: bool) {
        self.state.write().unwrap().fail_on_restore = fail;
    }
}

#[async_trait]
impl InventoryLedger for InMemoryInventory {
    async fn reserve(
        &self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<ProductSnapshot, InventoryError> {
        let mut state = self.state.write().unwrap();

        if state.fail_on_reserve {
            return Err(StoreError::Unavailable("inventory store down".to_string()).into());
        }

        let product = state
            .products
            .get_mut(&product_id)
            .ok_or(InventoryError::ProductNotFound(product_id))?;

        if product.stock < quantity {
            return Err(InventoryError::InsufficientStock {
                title: product.title.clone(),
            });
        }

        product.stock -= quantity;
        Ok(ProductSnapshot::from(&*product))
    }

    async fn restore(&self, product_id: ProductId, quantity: u32) -> Result<(), InventoryError> {
        let mut state = self.state.write().unwrap();

        if state.fail_on_restore {
            return Err(StoreError::Unavailable("inventory store down".to_string()).into());
        }

        let product = state
            .products
            .get_mut(&product_id)
            .ok_or(InventoryError::ProductNotFound(product_id))?;

        product.stock += quantity;
        Ok(())
    }
}

#[derive(Debug, Default)]
struct CouponsState {
    coupons: HashMap<CouponCode, Coupon>,
}

/// In-memory coupon ledger.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCoupons {
    state: Arc<RwLock<CouponsState>>,
}

impl InMemoryCoupons {
    /// Creates an empty coupon ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a coupon.
    pub fn seed_coupon(&self, coupon: Coupon) {
        self.state
            .write()
            .unwrap()
            .coupons
            .insert(coupon.code.clone(), coupon);
    }

    /// Returns how many times a coupon has been used.
    pub fn uses_of(&self, code: &CouponCode) -> Option<u32> {
        self.state.read().unwrap().coupons.get(code).map(|c| c.used)
    }
}

#[async_trait]
impl CouponLedger for InMemoryCoupons {
    async fn validate(&self, code: &CouponCode) -> Result<Coupon, CouponError> {
        let state = self.state.read().unwrap();
        let coupon = state
            .coupons
            .get(code)
            .ok_or_else(|| CouponError::NotFound(code.clone()))?;

        if coupon.is_expired(Utc::now()) {
            return Err(CouponError::Expired(code.clone()));
        }
        if coupon.is_exhausted() {
            return Err(CouponError::Exhausted(code.clone()));
        }

        Ok(coupon.clone())
    }

    async fn consume(&self, code: &CouponCode) -> Result<(), CouponError> {
        let mut state = self.state.write().unwrap();
        let coupon = state
            .coupons
            .get_mut(code)
            .ok_or_else(|| CouponError::NotFound(code.clone()))?;

        // Re-check the cap under the write guard; the earlier validate
        // read is not trusted.
        if coupon.is_exhausted() {
            return Err(CouponError::Exhausted(code.clone()));
        }

        coupon.used += 1;
        Ok(())
    }
}

#[derive(Debug, Default)]
struct OrdersState {
    // Creation order, oldest first.
    orders: Vec<Order>,
    fail_on_create: bool,
}

/// In-memory order store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrders {
    state: Arc<RwLock<OrdersState>>,
}

impl InMemoryOrders {
    /// Creates an empty order store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored orders.
    pub fn order_count(&self) -> usize {
        self.state.read().unwrap().orders.len()
    }

    /// Configures create calls to fail with a store error.
    pub fn set_fail_on_create(&self, fail: bool) {
        self.state.write().unwrap().fail_on_create = fail;
    }
}

#[async_trait]
impl OrderStore for InMemoryOrders {
    async fn create(&self, draft: OrderDraft) -> Result<Order, OrderStoreError> {
        let mut state = self.state.write().unwrap();

        if state.fail_on_create {
            return Err(StoreError::Unavailable("order store down".to_string()).into());
        }

        let order = Order::from_draft(OrderId::new(), draft, Utc::now());
        state.orders.push(order.clone());
        Ok(order)
    }

    async fn get(&self, id: OrderId) -> Result<Order, OrderStoreError> {
        let state = self.state.read().unwrap();
        state
            .orders
            .iter()
            .find(|o| o.id == id)
            .cloned()
            .ok_or(OrderStoreError::NotFound(id))
    }

    async fn update_payment(
        &self,
        id: OrderId,
        patch: PaymentPatch,
    ) -> Result<Order, OrderStoreError> {
        let mut state = self.state.write().unwrap();
        let order = state
            .orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or(OrderStoreError::NotFound(id))?;

        order.payment.apply(patch);
        Ok(order.clone())
    }

    async fn update_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, OrderStoreError> {
        let mut state = self.state.write().unwrap();
        let order = state
            .orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or(OrderStoreError::NotFound(id))?;

        order.status = status;
        Ok(order.clone())
    }

    async fn find_by_provider_payment_id(
        &self,
        provider_id: &str,
    ) -> Result<Order, OrderStoreError> {
        let state = self.state.read().unwrap();
        // First match in creation order, i.e. the earliest created.
        state
            .orders
            .iter()
            .find(|o| o.payment.provider_payment_id.as_deref() == Some(provider_id))
            .cloned()
            .ok_or_else(|| OrderStoreError::NoOrderForPayment(provider_id.to_string()))
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<Order>, OrderStoreError> {
        let state = self.state.read().unwrap();
        Ok(state.orders.iter().rev().take(limit).cloned().collect())
    }
}
