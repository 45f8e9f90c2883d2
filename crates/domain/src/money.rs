//! Money represented in integer minor-currency units.

use serde::{Deserialize, Serialize};

/// A money amount in cents, avoiding floating point arithmetic.
///
/// All prices, discounts, and totals in the system are carried as this
/// type. Negative amounts are representable (intermediate discount
/// arithmetic can dip below zero) but never persisted on an order; the
/// pricing layer floors totals at zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money {
    cents: i64,
}

impl Money {
    /// Creates a money amount from cents.
    pub fn from_cents(cents: i64) -> Self {
        Self { cents }
    }

    /// Returns zero money.
    pub fn zero() -> Self {
        Self { cents: 0 }
    }

    /// Returns the amount in cents.
    pub fn cents(&self) -> i64 {
        self.cents
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.cents == 0
    }

    /// Returns true if the amount is negative.
    pub fn is_negative(&self) -> bool {
        self.cents < 0
    }

    /// Multiplies by a quantity.
    pub fn multiply(&self, quantity: u32) -> Money {
        Money {
            cents: self.cents * quantity as i64,
        }
    }

    /// Returns `max(0, self)`.
    pub fn floor_at_zero(&self) -> Money {
        Money {
            cents: self.cents.max(0),
        }
    }

    /// Applies a percentage with half-up integer rounding.
    ///
    /// `Money::from_cents(2005).percent(10)` is 201 cents: a fractional
    /// half-cent rounds up, the store-wide discount rounding rule.
    pub fn percent(&self, value: i64) -> Money {
        Money {
            cents: (self.cents * value + 50).div_euclid(100),
        }
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.cents < 0 {
            write!(f, "-R${}.{:02}", (self.cents / 100).abs(), self.cents.abs() % 100)
        } else {
            write!(f, "R${}.{:02}", self.cents / 100, self.cents % 100)
        }
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money {
            cents: self.cents + rhs.cents,
        }
    }
}

impl std::ops::Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Self) -> Self::Output {
        Money {
            cents: self.cents - rhs.cents,
        }
    }
}

impl std::ops::AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.cents += rhs.cents;
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1234);
        assert_eq!(money.cents(), 1234);
        assert!(!money.is_zero());
        assert!(!money.is_negative());
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1234).to_string(), "R$12.34");
        assert_eq!(Money::from_cents(100).to_string(), "R$1.00");
        assert_eq!(Money::from_cents(5).to_string(), "R$0.05");
        assert_eq!(Money::from_cents(-1234).to_string(), "-R$12.34");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!(a.multiply(3).cents(), 3000);
    }

    #[test]
    fn test_sum() {
        let total: Money = [100, 200, 300].into_iter().map(Money::from_cents).sum();
        assert_eq!(total.cents(), 600);
    }

    #[test]
    fn test_percent_rounds_half_up() {
        // 10% of 2005 = 200.5, rounds to 201.
        assert_eq!(Money::from_cents(2005).percent(10).cents(), 201);
        // 10% of 2004 = 200.4, rounds to 200.
        assert_eq!(Money::from_cents(2004).percent(10).cents(), 200);
        assert_eq!(Money::from_cents(10000).percent(15).cents(), 1500);
    }

    #[test]
    fn test_floor_at_zero() {
        assert_eq!(Money::from_cents(-500).floor_at_zero().cents(), 0);
        assert_eq!(Money::from_cents(500).floor_at_zero().cents(), 500);
    }

    #[test]
    fn test_add_assign() {
        let mut money = Money::from_cents(100);
        money += Money::from_cents(50);
        assert_eq!(money.cents(), 150);
    }

    #[test]
    fn test_serde_transparent() {
        let money = Money::from_cents(2500);
        assert_eq!(serde_json::to_string(&money).unwrap(), "2500");
        let back: Money = serde_json::from_str("2500").unwrap();
        assert_eq!(back, money);
    }
}
