//! Webhook reconciler: maps provider payment notifications onto orders.

use domain::{Order, OrderId, OrderStatus, PaymentPatch, PaymentStatus};
use serde::{Deserialize, Serialize};
use store::{InventoryLedger, OrderStore};

use crate::error::WebhookError;
use crate::services::gateway::PaymentGateway;
use crate::services::notifier::OrderNotifier;

/// A payment notification as delivered by the provider webhook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PixNotification {
    /// Provider payment id the notification refers to.
    #[serde(rename = "pixId", default, skip_serializing_if = "Option::is_none")]
    pub pix_id: Option<String>,
    /// Provider-reported payment status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// What a notification did to its order, if anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Payment confirmed; the order is paid.
    Confirmed(OrderId),
    /// Payment canceled; stock restored and the order canceled.
    Canceled(OrderId),
    /// The order's payment was already settled; nothing changed.
    AlreadySettled(OrderId),
    /// Unrecognized provider status; nothing changed.
    Ignored,
}

/// Normalized form of the provider's status strings.
enum PaymentSignal {
    Confirmed,
    Canceled,
}

impl PaymentSignal {
    /// Providers report confirmation under several names.
    fn from_provider_status(status: &str) -> Option<Self> {
        match status {
            "confirmed" | "confirmed_payment" | "paid" => Some(Self::Confirmed),
            "canceled" => Some(Self::Canceled),
            _ => None,
        }
    }
}

/// Applies provider payment notifications to orders.
///
/// Confirmations move the order to `paid` and notify the shop admin;
/// cancellations restore the reserved stock and move the order to
/// `canceled`. Redelivered notifications for an already-settled payment
/// are acknowledged without touching anything.
pub struct WebhookReconciler<I, O, G, N>
where
    I: InventoryLedger,
    O: OrderStore,
    G: PaymentGateway,
    N: OrderNotifier,
{
    inventory: I,
    orders: O,
    gateway: G,
    notifier: N,
    admin_email: String,
}

impl<I, O, G, N> WebhookReconciler<I, O, G, N>
where
    I: InventoryLedger,
    O: OrderStore,
    G: PaymentGateway,
    N: OrderNotifier,
{
    /// Creates a new reconciler over the given backends.
    pub fn new(inventory: I, orders: O, gateway: G, notifier: N, admin_email: String) -> Self {
        Self {
            inventory,
            orders,
            gateway,
            notifier,
            admin_email,
        }
    }

    /// Processes one provider notification.
    ///
    /// The signature is checked before anything else; no order lookup
    /// happens for an unauthentic notification.
    #[tracing::instrument(skip(self, notification, signature))]
    pub async fn process(
        &self,
        notification: PixNotification,
        signature: Option<&str>,
    ) -> Result<ReconcileOutcome, WebhookError> {
        metrics::counter!("webhook_notifications_total").increment(1);

        if !self.gateway.verify_notification(signature) {
            metrics::counter!("webhook_rejected").increment(1);
            tracing::warn!("webhook signature rejected");
            return Err(WebhookError::Unauthorized);
        }

        let pix_id = match notification.pix_id.as_deref() {
            Some(id) if !id.is_empty() => id,
            _ => return Err(WebhookError::MissingPaymentId),
        };

        let order = self.orders.find_by_provider_payment_id(pix_id).await?;

        if order.payment.status.is_terminal() {
            tracing::info!(
                order_id = %order.id,
                payment_status = %order.payment.status,
                "payment already settled, acknowledging redelivery"
            );
            return Ok(ReconcileOutcome::AlreadySettled(order.id));
        }

        let signal = match notification
            .status
            .as_deref()
            .and_then(PaymentSignal::from_provider_status)
        {
            Some(signal) => signal,
            None => {
                tracing::debug!(
                    order_id = %order.id,
                    status = ?notification.status,
                    "ignoring unrecognized payment status"
                );
                return Ok(ReconcileOutcome::Ignored);
            }
        };

        match signal {
            PaymentSignal::Confirmed => self.confirm(order).await,
            PaymentSignal::Canceled => self.cancel(order).await,
        }
    }

    async fn confirm(&self, order: Order) -> Result<ReconcileOutcome, WebhookError> {
        let order_id = order.id;

        self.orders
            .update_payment(order_id, PaymentPatch::status(PaymentStatus::Confirmed))
            .await?;
        let order = self.orders.update_status(order_id, OrderStatus::Paid).await?;

        // Notification is fire-and-forget.
        if let Err(e) = self.notifier.order_confirmed(&self.admin_email, &order).await {
            tracing::warn!(order_id = %order_id, error = %e, "admin notification failed");
        }

        metrics::counter!("webhook_confirmed").increment(1);
        tracing::info!(order_id = %order_id, "payment confirmed");
        Ok(ReconcileOutcome::Confirmed(order_id))
    }

    async fn cancel(&self, order: Order) -> Result<ReconcileOutcome, WebhookError> {
        let order_id = order.id;

        // Stock first; a failed restore is logged and the remaining
        // lines are still attempted.
        for item in &order.items {
            if let Err(e) = self
                .inventory
                .restore(item.product_id, item.quantity)
                .await
            {
                tracing::warn!(
                    order_id = %order_id,
                    product_id = %item.product_id,
                    error = %e,
                    "failed to restore stock for canceled order"
                );
            }
        }

        self.orders
            .update_payment(order_id, PaymentPatch::status(PaymentStatus::Canceled))
            .await?;
        self.orders
            .update_status(order_id, OrderStatus::Canceled)
            .await?;

        metrics::counter!("webhook_canceled").increment(1);
        tracing::info!(order_id = %order_id, "payment canceled, stock restored");
        Ok(ReconcileOutcome::Canceled(order_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{Address, Money, Product, UserId};
    use store::{InMemoryCoupons, InMemoryInventory, InMemoryOrders};

    use crate::pricing::PricingPolicy;
    use crate::saga::{CartLine, CheckoutRequest, CheckoutSaga};
    use crate::services::gateway::InMemoryGateway;
    use crate::services::notifier::InMemoryNotifier;

    struct Fixture {
        reconciler: WebhookReconciler<
            InMemoryInventory,
            InMemoryOrders,
            InMemoryGateway,
            InMemoryNotifier,
        >,
        inventory: InMemoryInventory,
        orders: InMemoryOrders,
        gateway: InMemoryGateway,
        notifier: InMemoryNotifier,
        product_id: domain::ProductId,
        order_id: OrderId,
        pix_id: String,
    }

    /// Runs a checkout for two units of a five-unit product, returning
    /// the reconciler wired to the same backends.
    async fn checked_out_fixture() -> Fixture {
        let inventory = InMemoryInventory::new();
        let coupons = InMemoryCoupons::new();
        let orders = InMemoryOrders::new();
        let gateway = InMemoryGateway::new();
        let notifier = InMemoryNotifier::new();

        let product_id =
            inventory.seed_product(Product::new("Widget", Money::from_cents(1000), 5));

        let saga = CheckoutSaga::new(
            inventory.clone(),
            coupons,
            orders.clone(),
            gateway.clone(),
            PricingPolicy::default(),
        );
        let receipt = saga
            .execute(
                UserId::new(),
                CheckoutRequest {
                    items: vec![CartLine {
                        product_id,
                        quantity: 2,
                        checked: true,
                    }],
                    coupon_code: None,
                    address: Address {
                        street: "Rua das Flores, 123".to_string(),
                        city: "São Paulo".to_string(),
                        postal_code: "01310-100".to_string(),
                    },
                },
            )
            .await
            .unwrap();

        let order = orders.get(receipt.order_id).await.unwrap();
        let pix_id = order.payment.provider_payment_id.unwrap();

        let reconciler = WebhookReconciler::new(
            inventory.clone(),
            orders.clone(),
            gateway.clone(),
            notifier.clone(),
            "admin@shop.example".to_string(),
        );

        Fixture {
            reconciler,
            inventory,
            orders,
            gateway,
            notifier,
            product_id,
            order_id: receipt.order_id,
            pix_id,
        }
    }

    fn notification(pix_id: &str, status: &str) -> PixNotification {
        PixNotification {
            pix_id: Some(pix_id.to_string()),
            status: Some(status.to_string()),
        }
    }

    #[tokio::test]
    async fn test_confirmation_marks_order_paid() {
        let f = checked_out_fixture().await;

        let outcome = f
            .reconciler
            .process(notification(&f.pix_id, "confirmed"), None)
            .await
            .unwrap();

        assert_eq!(outcome, ReconcileOutcome::Confirmed(f.order_id));

        let order = f.orders.get(f.order_id).await.unwrap();
        assert_eq!(order.status, OrderStatus::Paid);
        assert_eq!(order.payment.status, PaymentStatus::Confirmed);

        // Stock stays sold.
        assert_eq!(f.inventory.stock_of(f.product_id), Some(3));

        assert_eq!(f.notifier.sent_count(), 1);
        assert_eq!(
            f.notifier.last_recipient().as_deref(),
            Some("admin@shop.example")
        );
    }

    #[tokio::test]
    async fn test_provider_status_synonyms_confirm() {
        for status in ["confirmed_payment", "paid"] {
            let f = checked_out_fixture().await;
            let outcome = f
                .reconciler
                .process(notification(&f.pix_id, status), None)
                .await
                .unwrap();
            assert_eq!(outcome, ReconcileOutcome::Confirmed(f.order_id));
        }
    }

    #[tokio::test]
    async fn test_cancellation_restores_stock() {
        let f = checked_out_fixture().await;

        let outcome = f
            .reconciler
            .process(notification(&f.pix_id, "canceled"), None)
            .await
            .unwrap();

        assert_eq!(outcome, ReconcileOutcome::Canceled(f.order_id));

        let order = f.orders.get(f.order_id).await.unwrap();
        assert_eq!(order.status, OrderStatus::Canceled);
        assert_eq!(order.payment.status, PaymentStatus::Canceled);

        assert_eq!(f.inventory.stock_of(f.product_id), Some(5));
        assert_eq!(f.notifier.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_redelivered_confirmation_is_idempotent() {
        let f = checked_out_fixture().await;

        f.reconciler
            .process(notification(&f.pix_id, "confirmed"), None)
            .await
            .unwrap();
        let outcome = f
            .reconciler
            .process(notification(&f.pix_id, "confirmed"), None)
            .await
            .unwrap();

        assert_eq!(outcome, ReconcileOutcome::AlreadySettled(f.order_id));

        let order = f.orders.get(f.order_id).await.unwrap();
        assert_eq!(order.status, OrderStatus::Paid);
        assert_eq!(f.notifier.sent_count(), 1);
    }

    #[tokio::test]
    async fn test_cancel_after_confirm_is_ignored() {
        let f = checked_out_fixture().await;

        f.reconciler
            .process(notification(&f.pix_id, "confirmed"), None)
            .await
            .unwrap();
        let outcome = f
            .reconciler
            .process(notification(&f.pix_id, "canceled"), None)
            .await
            .unwrap();

        assert_eq!(outcome, ReconcileOutcome::AlreadySettled(f.order_id));
        // No stock movement for the late cancellation.
        assert_eq!(f.inventory.stock_of(f.product_id), Some(3));
    }

    #[tokio::test]
    async fn test_rejected_signature() {
        let f = checked_out_fixture().await;
        f.gateway.set_reject_signature(true);

        let result = f
            .reconciler
            .process(notification(&f.pix_id, "confirmed"), Some("bad"))
            .await;

        assert!(matches!(result, Err(WebhookError::Unauthorized)));

        // Nothing was looked up or changed.
        let order = f.orders.get(f.order_id).await.unwrap();
        assert_eq!(order.status, OrderStatus::AwaitingPayment);
    }

    #[tokio::test]
    async fn test_missing_payment_id() {
        let f = checked_out_fixture().await;

        let result = f
            .reconciler
            .process(
                PixNotification {
                    pix_id: None,
                    status: Some("confirmed".to_string()),
                },
                None,
            )
            .await;
        assert!(matches!(result, Err(WebhookError::MissingPaymentId)));

        let result = f
            .reconciler
            .process(notification("", "confirmed"), None)
            .await;
        assert!(matches!(result, Err(WebhookError::MissingPaymentId)));
    }

    #[tokio::test]
    async fn test_unknown_payment_id() {
        let f = checked_out_fixture().await;

        let result = f
            .reconciler
            .process(notification("PIX-UNKNOWN", "confirmed"), None)
            .await;

        assert!(matches!(result, Err(WebhookError::OrderNotFound(ref id)) if id == "PIX-UNKNOWN"));
    }

    #[tokio::test]
    async fn test_unrecognized_status_is_acknowledged_untouched() {
        let f = checked_out_fixture().await;

        let outcome = f
            .reconciler
            .process(notification(&f.pix_id, "processing"), None)
            .await
            .unwrap();

        assert_eq!(outcome, ReconcileOutcome::Ignored);

        let order = f.orders.get(f.order_id).await.unwrap();
        assert_eq!(order.status, OrderStatus::AwaitingPayment);
        assert_eq!(order.payment.status, PaymentStatus::Pending);
    }

    #[tokio::test]
    async fn test_notifier_failure_does_not_block_confirmation() {
        let f = checked_out_fixture().await;
        f.notifier.set_fail_on_send(true);

        let outcome = f
            .reconciler
            .process(notification(&f.pix_id, "confirmed"), None)
            .await
            .unwrap();

        assert_eq!(outcome, ReconcileOutcome::Confirmed(f.order_id));
        let order = f.orders.get(f.order_id).await.unwrap();
        assert_eq!(order.status, OrderStatus::Paid);
    }

    #[tokio::test]
    async fn test_restore_failure_does_not_block_cancellation() {
        let f = checked_out_fixture().await;
        f.inventory.set_fail_on_restore(true);

        let outcome = f
            .reconciler
            .process(notification(&f.pix_id, "canceled"), None)
            .await
            .unwrap();

        assert_eq!(outcome, ReconcileOutcome::Canceled(f.order_id));
        let order = f.orders.get(f.order_id).await.unwrap();
        assert_eq!(order.status, OrderStatus::Canceled);
        // The restore itself was lost.
        assert_eq!(f.inventory.stock_of(f.product_id), Some(3));
    }
}
