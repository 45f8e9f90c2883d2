//! Coupon ledger trait.

use async_trait::async_trait;
use domain::{Coupon, CouponCode};
use thiserror::Error;

use crate::error::StoreError;

/// Errors from coupon operations.
#[derive(Debug, Error)]
pub enum CouponError {
    /// No coupon exists with the given code.
    #[error("Coupon not found: {0}")]
    NotFound(CouponCode),

    /// The coupon's expiry timestamp has passed.
    #[error("Coupon expired: {0}")]
    Expired(CouponCode),

    /// Every permitted use has already been consumed.
    #[error("Coupon has no uses left: {0}")]
    Exhausted(CouponCode),

    /// The backing store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<sqlx::Error> for CouponError {
    fn from(e: sqlx::Error) -> Self {
        Self::Store(StoreError::Database(e))
    }
}

/// Validates coupons and accounts for their uses.
///
/// `consume` re-checks the max-uses bound at increment time as one
/// atomic conditional write. Two checkouts racing on the last use of a
/// code both pass `validate`, but only one wins `consume`; the loser
/// observes `Exhausted`.
#[async_trait]
pub trait CouponLedger: Send + Sync {
    /// Checks that a coupon exists, has not expired, and has uses left.
    ///
    /// The returned view carries the discount parameters; it is a read,
    /// not a claim on a use.
    async fn validate(&self, code: &CouponCode) -> Result<Coupon, CouponError>;

    /// Atomically increments the use counter, re-checking the cap.
    async fn consume(&self, code: &CouponCode) -> Result<(), CouponError>;
}
