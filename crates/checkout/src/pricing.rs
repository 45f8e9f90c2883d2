//! Cart pricing: discount application and shipping.

use domain::{Coupon, Money};

/// Shipping charges applied at checkout.
#[derive(Debug, Clone)]
pub struct PricingPolicy {
    /// Flat shipping charge for orders below the free-shipping threshold.
    pub shipping_flat: Money,
    /// Discounted subtotals at or above this amount ship free.
    pub free_shipping_over: Money,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            shipping_flat: Money::from_cents(1500),
            free_shipping_over: Money::from_cents(10_000),
        }
    }
}

/// The priced breakdown of a cart: the numbers that land on the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quote {
    /// Sum of line totals before any discount.
    pub subtotal: Money,
    /// Discount granted by the coupon, as computed (not clamped).
    pub discount: Money,
    /// Shipping charge.
    pub shipping: Money,
    /// Amount to collect: `max(0, subtotal - discount) + shipping`.
    pub total: Money,
}

impl PricingPolicy {
    /// Prices a cart subtotal under an optional coupon.
    ///
    /// The discounted subtotal is floored at zero. Free shipping is
    /// decided on the discounted subtotal, not the raw one.
    pub fn quote(&self, subtotal: Money, coupon: Option<&Coupon>) -> Quote {
        let discount = coupon.map_or(Money::zero(), |c| c.discount_for(subtotal));
        let discounted = (subtotal - discount).floor_at_zero();
        let shipping = if discounted >= self.free_shipping_over {
            Money::zero()
        } else {
            self.shipping_flat
        };
        Quote {
            subtotal,
            discount,
            shipping,
            total: discounted + shipping,
        }
    }
}
