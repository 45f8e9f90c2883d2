//! Checkout saga: stock reservation, coupon, order persistence, payment.

use domain::{
    Address, CouponApplied, CouponCode, LineItem, Money, OrderDraft, OrderId, OrderStatus,
    PaymentPatch, PaymentStatus, ProductId, UserId,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use store::{CouponLedger, InventoryLedger, OrderStore};

use crate::error::CheckoutError;
use crate::pricing::PricingPolicy;
use crate::services::gateway::{PaymentGateway, PaymentRequest};
use crate::steps;

/// One cart line in a checkout request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    /// The product to purchase.
    pub product_id: ProductId,
    /// Units requested.
    pub quantity: u32,
    /// Whether the line is selected for purchase. Carts keep deselected
    /// lines around; checkout skips them.
    #[serde(default = "default_checked")]
    pub checked: bool,
}

fn default_checked() -> bool {
    true
}

/// A checkout request as submitted by the storefront.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    /// Cart lines, selected or not, in cart order.
    #[serde(default)]
    pub items: Vec<CartLine>,
    /// Optional coupon code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coupon_code: Option<CouponCode>,
    /// Delivery address.
    pub address: Address,
}

/// The result of a successful checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutReceipt {
    /// The persisted order.
    pub order_id: OrderId,
    /// Provider payment payload for the storefront to render.
    pub payment: Value,
}

/// Drives a checkout through its four steps with compensation on
/// failure.
///
/// Forward order: reserve stock per line → validate and consume the
/// coupon → persist the order → open a payment intent. When a step
/// fails, stock reserved so far is released in reverse order. Once the
/// order record exists no compensation runs; a created order with a
/// failed payment intent stays on the books for retry.
pub struct CheckoutSaga<I, C, O, G>
where
    I: InventoryLedger,
    C: CouponLedger,
    O: OrderStore,
    G: PaymentGateway,
{
    inventory: I,
    coupons: C,
    orders: O,
    gateway: G,
    pricing: PricingPolicy,
}

impl<I, C, O, G> CheckoutSaga<I, C, O, G>
where
    I: InventoryLedger,
    C: CouponLedger,
    O: OrderStore,
    G: PaymentGateway,
{
    /// Creates a new checkout saga over the given backends.
    pub fn new(inventory: I, coupons: C, orders: O, gateway: G, pricing: PricingPolicy) -> Self {
        Self {
            inventory,
            coupons,
            orders,
            gateway,
            pricing,
        }
    }

    /// Executes a checkout for the given user.
    ///
    /// Returns the persisted order id and the provider payment payload
    /// on success.
    #[tracing::instrument(skip(self, request), fields(saga_type = steps::SAGA_TYPE))]
    pub async fn execute(
        &self,
        user_id: UserId,
        request: CheckoutRequest,
    ) -> Result<CheckoutReceipt, CheckoutError> {
        metrics::counter!("checkout_executions_total").increment(1);
        let saga_start = std::time::Instant::now();

        // 1. Select cart lines
        if request.items.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        let selected: Vec<&CartLine> = request.items.iter().filter(|line| line.checked).collect();
        if selected.is_empty() {
            return Err(CheckoutError::NoItemsSelected);
        }

        // 2. Step 1: reserve stock line by line, in cart order
        tracing::info!(
            step = steps::STEP_RESERVE_STOCK,
            lines = selected.len(),
            "saga step started"
        );
        let mut reserved: Vec<(ProductId, u32)> = Vec::with_capacity(selected.len());
        let mut items: Vec<LineItem> = Vec::with_capacity(selected.len());

        for line in &selected {
            match self.inventory.reserve(line.product_id, line.quantity).await {
                Ok(snapshot) => {
                    reserved.push((line.product_id, line.quantity));
                    items.push(LineItem {
                        product_id: snapshot.id,
                        title: snapshot.title,
                        unit_price: snapshot.unit_price,
                        quantity: line.quantity,
                    });
                }
                Err(e) => {
                    tracing::warn!(
                        step = steps::STEP_RESERVE_STOCK,
                        product_id = %line.product_id,
                        error = %e,
                        "saga step failed"
                    );
                    self.release_reserved(&reserved).await;
                    return self.fail(saga_start, e.into());
                }
            }
        }

        let subtotal: Money = items.iter().map(LineItem::total).sum();

        // 3. Step 2: validate and consume the coupon
        let mut coupon = None;
        if let Some(code) = &request.coupon_code {
            tracing::info!(step = steps::STEP_APPLY_COUPON, %code, "saga step started");

            let validated = match self.coupons.validate(code).await {
                Ok(c) => c,
                Err(e) => {
                    tracing::warn!(
                        step = steps::STEP_APPLY_COUPON,
                        %code,
                        error = %e,
                        "saga step failed"
                    );
                    self.release_reserved(&reserved).await;
                    return self.fail(saga_start, e.into());
                }
            };

            if let Err(e) = self.coupons.consume(code).await {
                tracing::warn!(
                    step = steps::STEP_APPLY_COUPON,
                    %code,
                    error = %e,
                    "saga step failed"
                );
                self.release_reserved(&reserved).await;
                return self.fail(saga_start, e.into());
            }

            coupon = Some(validated);
        }

        let quote = self.pricing.quote(subtotal, coupon.as_ref());
        let coupon_applied = coupon.map(|c| CouponApplied {
            code: c.code,
            discount: quote.discount,
        });

        // 4. Step 3: persist the order
        tracing::info!(
            step = steps::STEP_PERSIST_ORDER,
            subtotal = %quote.subtotal,
            total = %quote.total,
            "saga step started"
        );
        let draft = OrderDraft {
            user_id,
            items,
            address: request.address,
            subtotal: quote.subtotal,
            shipping: quote.shipping,
            total: quote.total,
            coupon: coupon_applied,
        };

        let order = match self.orders.create(draft).await {
            Ok(order) => order,
            Err(e) => {
                tracing::warn!(
                    step = steps::STEP_PERSIST_ORDER,
                    error = %e,
                    "saga step failed"
                );
                // A consumed coupon use is not returned.
                if let Some(code) = &request.coupon_code {
                    tracing::warn!(%code, "order persist failed after coupon was consumed");
                }
                self.release_reserved(&reserved).await;
                return self.fail(saga_start, e.into());
            }
        };

        // 5. Step 4: open the payment intent
        tracing::info!(
            step = steps::STEP_INITIATE_PAYMENT,
            order_id = %order.id,
            "saga step started"
        );
        let intent = match self
            .gateway
            .initiate(PaymentRequest::new(order.total, order.id))
            .await
        {
            Ok(intent) => intent,
            Err(e) => {
                // The order stands and stock stays reserved; payment can
                // be retried against the created order.
                tracing::warn!(
                    step = steps::STEP_INITIATE_PAYMENT,
                    order_id = %order.id,
                    error = %e,
                    "saga step failed"
                );
                return self.fail(saga_start, e.into());
            }
        };

        let patch = PaymentPatch {
            provider_payment_id: Some(intent.provider_payment_id.clone()),
            payload: Some(intent.payload.clone()),
            status: Some(PaymentStatus::Pending),
        };
        if let Err(e) = self.orders.update_payment(order.id, patch).await {
            return self.fail(saga_start, e.into());
        }
        let order = match self
            .orders
            .update_status(order.id, OrderStatus::AwaitingPayment)
            .await
        {
            Ok(order) => order,
            Err(e) => return self.fail(saga_start, e.into()),
        };

        // 6. Saga completed
        let duration = saga_start.elapsed().as_secs_f64();
        metrics::histogram!("checkout_duration_seconds").record(duration);
        metrics::counter!("checkout_completed").increment(1);
        tracing::info!(order_id = %order.id, total = %order.total, duration, "checkout completed");

        Ok(CheckoutReceipt {
            order_id: order.id,
            payment: intent.payload,
        })
    }

    /// Returns reserved stock in reverse reservation order.
    ///
    /// Compensation is best effort: a failed restore is logged and the
    /// remaining lines are still attempted.
    async fn release_reserved(&self, reserved: &[(ProductId, u32)]) {
        for (product_id, quantity) in reserved.iter().rev() {
            if let Err(e) = self.inventory.restore(*product_id, *quantity).await {
                tracing::warn!(
                    %product_id,
                    quantity,
                    error = %e,
                    "failed to restore reserved stock"
                );
            }
        }
    }

    /// Records a failed saga run and returns the error.
    fn fail(
        &self,
        saga_start: std::time::Instant,
        err: CheckoutError,
    ) -> Result<CheckoutReceipt, CheckoutError> {
        metrics::histogram!("checkout_duration_seconds").record(saga_start.elapsed().as_secs_f64());
        metrics::counter!("checkout_failed").increment(1);
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use domain::{Coupon, DiscountKind, Product};
    use store::{InMemoryCoupons, InMemoryInventory, InMemoryOrders};

    use crate::services::gateway::InMemoryGateway;

    fn setup() -> (
        CheckoutSaga<InMemoryInventory, InMemoryCoupons, InMemoryOrders, InMemoryGateway>,
        InMemoryInventory,
        InMemoryCoupons,
        InMemoryOrders,
        InMemoryGateway,
    ) {
        let inventory = InMemoryInventory::new();
        let coupons = InMemoryCoupons::new();
        let orders = InMemoryOrders::new();
        let gateway = InMemoryGateway::new();

        let saga = CheckoutSaga::new(
            inventory.clone(),
            coupons.clone(),
            orders.clone(),
            gateway.clone(),
            PricingPolicy::default(),
        );

        (saga, inventory, coupons, orders, gateway)
    }

    fn sample_address() -> Address {
        Address {
            street: "Rua das Flores, 123".to_string(),
            city: "São Paulo".to_string(),
            postal_code: "01310-100".to_string(),
        }
    }

    fn line(product_id: ProductId, quantity: u32) -> CartLine {
        CartLine {
            product_id,
            quantity,
            checked: true,
        }
    }

    fn request(items: Vec<CartLine>, coupon_code: Option<&str>) -> CheckoutRequest {
        CheckoutRequest {
            items,
            coupon_code: coupon_code.map(CouponCode::from),
            address: sample_address(),
        }
    }

    #[tokio::test]
    async fn test_happy_path() {
        let (saga, inventory, _, orders, gateway) = setup();
        let product_id =
            inventory.seed_product(Product::new("Widget", Money::from_cents(1000), 5));

        let receipt = saga
            .execute(UserId::new(), request(vec![line(product_id, 2)], None))
            .await
            .unwrap();

        // 2000 subtotal + 1500 flat shipping
        let order = orders.get(receipt.order_id).await.unwrap();
        assert_eq!(order.subtotal, Money::from_cents(2000));
        assert_eq!(order.shipping, Money::from_cents(1500));
        assert_eq!(order.total, Money::from_cents(3500));
        assert_eq!(order.status, OrderStatus::AwaitingPayment);
        assert_eq!(order.payment.status, PaymentStatus::Pending);
        assert!(order.payment.provider_payment_id.is_some());

        assert_eq!(inventory.stock_of(product_id), Some(3));
        assert_eq!(gateway.intent_count(), 1);
        assert_eq!(
            gateway.last_intent(),
            Some((receipt.order_id, Money::from_cents(3500)))
        );
        assert_eq!(receipt.payment["amount"], 3500);
    }

    #[tokio::test]
    async fn test_empty_cart() {
        let (saga, _, _, orders, _) = setup();

        let result = saga.execute(UserId::new(), request(vec![], None)).await;

        assert!(matches!(result, Err(CheckoutError::EmptyCart)));
        assert_eq!(orders.order_count(), 0);
    }

    #[tokio::test]
    async fn test_no_lines_selected() {
        let (saga, inventory, _, orders, _) = setup();
        let product_id =
            inventory.seed_product(Product::new("Widget", Money::from_cents(1000), 5));

        let mut unchecked = line(product_id, 1);
        unchecked.checked = false;

        let result = saga
            .execute(UserId::new(), request(vec![unchecked], None))
            .await;

        assert!(matches!(result, Err(CheckoutError::NoItemsSelected)));
        assert_eq!(inventory.stock_of(product_id), Some(5));
        assert_eq!(orders.order_count(), 0);
    }

    #[tokio::test]
    async fn test_deselected_lines_are_skipped() {
        let (saga, inventory, _, orders, _) = setup();
        let wanted = inventory.seed_product(Product::new("Widget", Money::from_cents(1000), 5));
        let parked = inventory.seed_product(Product::new("Gadget", Money::from_cents(2500), 5));

        let mut parked_line = line(parked, 1);
        parked_line.checked = false;

        let receipt = saga
            .execute(
                UserId::new(),
                request(vec![line(wanted, 1), parked_line], None),
            )
            .await
            .unwrap();

        let order = orders.get(receipt.order_id).await.unwrap();
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].title, "Widget");
        assert_eq!(inventory.stock_of(parked), Some(5));
    }

    #[tokio::test]
    async fn test_unknown_product() {
        let (saga, _, _, orders, _) = setup();
        let ghost = ProductId::new();

        let result = saga
            .execute(UserId::new(), request(vec![line(ghost, 1)], None))
            .await;

        assert!(matches!(result, Err(CheckoutError::InvalidProduct(id)) if id == ghost));
        assert_eq!(orders.order_count(), 0);
    }

    #[tokio::test]
    async fn test_insufficient_stock_restores_earlier_lines() {
        let (saga, inventory, _, orders, gateway) = setup();
        let plenty = inventory.seed_product(Product::new("Widget", Money::from_cents(1000), 5));
        let scarce = inventory.seed_product(Product::new("Gadget", Money::from_cents(2500), 1));

        let result = saga
            .execute(
                UserId::new(),
                request(vec![line(plenty, 2), line(scarce, 2)], None),
            )
            .await;

        assert!(
            matches!(result, Err(CheckoutError::InsufficientStock { ref title }) if title == "Gadget")
        );
        // First line was reserved, then released; second never committed.
        assert_eq!(inventory.stock_of(plenty), Some(5));
        assert_eq!(inventory.stock_of(scarce), Some(1));
        assert_eq!(orders.order_count(), 0);
        assert_eq!(gateway.intent_count(), 0);
    }

    #[tokio::test]
    async fn test_percent_coupon_applied() {
        let (saga, inventory, coupons, orders, _) = setup();
        let product_id =
            inventory.seed_product(Product::new("Monitor", Money::from_cents(10_000), 5));
        coupons.seed_coupon(Coupon {
            code: CouponCode::new("SAVE10"),
            kind: DiscountKind::Percent,
            value: 10,
            valid_until: None,
            max_uses: Some(5),
            used: 0,
        });

        let receipt = saga
            .execute(
                UserId::new(),
                request(vec![line(product_id, 2)], Some("SAVE10")),
            )
            .await
            .unwrap();

        // 20000 - 2000 = 18000, free shipping above 10000
        let order = orders.get(receipt.order_id).await.unwrap();
        assert_eq!(order.subtotal, Money::from_cents(20_000));
        assert_eq!(order.shipping, Money::zero());
        assert_eq!(order.total, Money::from_cents(18_000));

        let applied = order.coupon.unwrap();
        assert_eq!(applied.code.as_str(), "SAVE10");
        assert_eq!(applied.discount, Money::from_cents(2000));

        assert_eq!(coupons.uses_of(&CouponCode::new("SAVE10")), Some(1));
    }

    #[tokio::test]
    async fn test_invalid_coupon_releases_stock() {
        let (saga, inventory, _, orders, _) = setup();
        let product_id =
            inventory.seed_product(Product::new("Widget", Money::from_cents(1000), 5));

        let result = saga
            .execute(
                UserId::new(),
                request(vec![line(product_id, 2)], Some("NOPE")),
            )
            .await;

        assert!(matches!(result, Err(CheckoutError::InvalidCoupon(_))));
        assert_eq!(inventory.stock_of(product_id), Some(5));
        assert_eq!(orders.order_count(), 0);
    }

    #[tokio::test]
    async fn test_expired_coupon_releases_stock() {
        let (saga, inventory, coupons, orders, _) = setup();
        let product_id =
            inventory.seed_product(Product::new("Widget", Money::from_cents(1000), 5));
        coupons.seed_coupon(Coupon {
            code: CouponCode::new("OLD"),
            kind: DiscountKind::Percent,
            value: 10,
            valid_until: Some(Utc::now() - Duration::days(1)),
            max_uses: None,
            used: 0,
        });

        let result = saga
            .execute(
                UserId::new(),
                request(vec![line(product_id, 2)], Some("OLD")),
            )
            .await;

        assert!(matches!(result, Err(CheckoutError::ExpiredCoupon(_))));
        assert_eq!(inventory.stock_of(product_id), Some(5));
        assert_eq!(orders.order_count(), 0);
    }

    #[tokio::test]
    async fn test_exhausted_coupon_releases_stock() {
        let (saga, inventory, coupons, orders, _) = setup();
        let product_id =
            inventory.seed_product(Product::new("Widget", Money::from_cents(1000), 5));
        coupons.seed_coupon(Coupon {
            code: CouponCode::new("GONE"),
            kind: DiscountKind::Flat,
            value: 500,
            valid_until: None,
            max_uses: Some(1),
            used: 1,
        });

        let result = saga
            .execute(
                UserId::new(),
                request(vec![line(product_id, 2)], Some("GONE")),
            )
            .await;

        assert!(matches!(result, Err(CheckoutError::CouponExhausted(_))));
        assert_eq!(inventory.stock_of(product_id), Some(5));
        assert_eq!(orders.order_count(), 0);
    }

    #[tokio::test]
    async fn test_persist_failure_restores_stock_but_not_coupon() {
        let (saga, inventory, coupons, orders, gateway) = setup();
        let product_id =
            inventory.seed_product(Product::new("Widget", Money::from_cents(1000), 5));
        coupons.seed_coupon(Coupon {
            code: CouponCode::new("SAVE10"),
            kind: DiscountKind::Percent,
            value: 10,
            valid_until: None,
            max_uses: Some(5),
            used: 0,
        });
        orders.set_fail_on_create(true);

        let result = saga
            .execute(
                UserId::new(),
                request(vec![line(product_id, 2)], Some("SAVE10")),
            )
            .await;

        assert!(matches!(result, Err(CheckoutError::Storage(_))));
        assert_eq!(inventory.stock_of(product_id), Some(5));
        // The consumed use stays consumed.
        assert_eq!(coupons.uses_of(&CouponCode::new("SAVE10")), Some(1));
        assert_eq!(orders.order_count(), 0);
        assert_eq!(gateway.intent_count(), 0);
    }

    #[tokio::test]
    async fn test_gateway_failure_leaves_order_created() {
        let (saga, inventory, _, orders, gateway) = setup();
        let product_id =
            inventory.seed_product(Product::new("Widget", Money::from_cents(1000), 5));
        gateway.set_fail_on_initiate(true);

        let result = saga
            .execute(UserId::new(), request(vec![line(product_id, 2)], None))
            .await;

        assert!(matches!(result, Err(CheckoutError::Gateway(_))));
        // No compensation past the persist step: the order exists and
        // the stock stays reserved.
        assert_eq!(orders.order_count(), 1);
        let recent = orders.list_recent(1).await.unwrap();
        let order = &recent[0];
        assert_eq!(order.status, OrderStatus::Created);
        assert_eq!(order.payment.status, PaymentStatus::Pending);
        assert!(order.payment.provider_payment_id.is_none());
        assert_eq!(inventory.stock_of(product_id), Some(3));
    }
}
