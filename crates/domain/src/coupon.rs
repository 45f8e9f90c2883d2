//! Coupons and discount computation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

/// A coupon code as typed by the customer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CouponCode(String);

impl CouponCode {
    /// Creates a coupon code from a string.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CouponCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for CouponCode {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for CouponCode {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for CouponCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// How a coupon's value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountKind {
    /// `value` is a percentage of the subtotal.
    Percent,
    /// `value` is a fixed amount in cents.
    Flat,
}

/// A discount coupon with optional expiry and usage cap.
///
/// `used` never exceeds `max_uses` when the cap is set; the coupon
/// ledger enforces this with an atomic conditional increment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coupon {
    pub code: CouponCode,
    pub kind: DiscountKind,
    /// Percentage points for `Percent`, cents for `Flat`.
    pub value: i64,
    pub valid_until: Option<DateTime<Utc>>,
    pub max_uses: Option<u32>,
    pub used: u32,
}

impl Coupon {
    /// Returns true if the coupon's expiry has passed.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.valid_until.is_some_and(|until| until < now)
    }

    /// Returns true if every permitted use has been consumed.
    pub fn is_exhausted(&self) -> bool {
        self.max_uses.is_some_and(|max| self.used >= max)
    }

    /// Computes the discount this coupon grants on a subtotal.
    ///
    /// Percentage discounts round half-up to whole cents. The result is
    /// not capped here; the pricing layer floors the discounted subtotal
    /// at zero.
    pub fn discount_for(&self, subtotal: Money) -> Money {
        match self.kind {
            DiscountKind::Percent => subtotal.percent(self.value),
            DiscountKind::Flat => Money::from_cents(self.value),
        }
    }
}

/// The coupon summary recorded on an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CouponApplied {
    pub code: CouponCode,
    pub discount: Money,
}
