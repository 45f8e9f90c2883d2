//! Order status state machine.

use serde::{Deserialize, Serialize};

/// The overall status of an order.
///
/// Status transitions:
/// ```text
/// Created ──► AwaitingPayment ──┬──► Paid
///                               └──► Canceled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Persisted, no payment attached yet.
    #[default]
    Created,

    /// Payment intent issued, waiting for the provider's notification.
    AwaitingPayment,

    /// Payment confirmed (terminal state).
    Paid,

    /// Payment canceled or order voided (terminal state).
    Canceled,
}

impl OrderStatus {
    /// Returns true if a payment intent can be attached in this status.
    pub fn can_await_payment(&self) -> bool {
        matches!(self, OrderStatus::Created)
    }

    /// Returns true if the order can be marked paid in this status.
    pub fn can_mark_paid(&self) -> bool {
        matches!(self, OrderStatus::Created | OrderStatus::AwaitingPayment)
    }

    /// Returns true if the order can be canceled in this status.
    pub fn can_cancel(&self) -> bool {
        matches!(self, OrderStatus::Created | OrderStatus::AwaitingPayment)
    }

    /// Returns true if this is a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Paid | OrderStatus::Canceled)
    }

    /// Returns the status name as persisted and exposed over the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Created => "created",
            OrderStatus::AwaitingPayment => "awaiting_payment",
            OrderStatus::Paid => "paid",
            OrderStatus::Canceled => "canceled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(OrderStatus::Created),
            "awaiting_payment" => Ok(OrderStatus::AwaitingPayment),
            "paid" => Ok(OrderStatus::Paid),
            "canceled" => Ok(OrderStatus::Canceled),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// Error returned when parsing a status string outside the closed set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus(pub String);

impl std::fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown order status: {}", self.0)
    }
}

impl std::error::Error for UnknownStatus {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_status_is_created() {
        assert_eq!(OrderStatus::default(), OrderStatus::Created);
    }

    #[test]
    fn test_created_can_await_payment() {
        assert!(OrderStatus::Created.can_await_payment());
        assert!(!OrderStatus::AwaitingPayment.can_await_payment());
        assert!(!OrderStatus::Paid.can_await_payment());
        assert!(!OrderStatus::Canceled.can_await_payment());
    }

    #[test]
    fn test_can_mark_paid_before_terminal() {
        assert!(OrderStatus::Created.can_mark_paid());
        assert!(OrderStatus::AwaitingPayment.can_mark_paid());
        assert!(!OrderStatus::Paid.can_mark_paid());
        assert!(!OrderStatus::Canceled.can_mark_paid());
    }

    #[test]
    fn test_can_cancel_before_terminal() {
        assert!(OrderStatus::Created.can_cancel());
        assert!(OrderStatus::AwaitingPayment.can_cancel());
        assert!(!OrderStatus::Paid.can_cancel());
        assert!(!OrderStatus::Canceled.can_cancel());
    }

    #[test]
    fn test_terminal_states() {
        assert!(!OrderStatus::Created.is_terminal());
        assert!(!OrderStatus::AwaitingPayment.is_terminal());
        assert!(OrderStatus::Paid.is_terminal());
        assert!(OrderStatus::Canceled.is_terminal());
    }

    #[test]
    fn test_wire_format_is_snake_case() {
        assert_eq!(serde_json::to_string(&OrderStatus::AwaitingPayment).unwrap(), "\"awaiting_payment\"");
        let back: OrderStatus = serde_json::from_str("\"paid\"").unwrap();
        assert_eq!(back, OrderStatus::Paid);
    }

    #[test]
    fn test_parse_roundtrip() {
        for status in [
            OrderStatus::Created,
            OrderStatus::AwaitingPayment,
            OrderStatus::Paid,
            OrderStatus::Canceled,
        ] {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert!("shipped".parse::<OrderStatus>().is_err());
    }
}
