//! Payment sub-record of an order.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Supported payment methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Pix,
}

/// The state of a payment attached to an order.
///
/// ```text
/// Pending ──┬──► Confirmed
///           └──► Canceled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// Awaiting the provider's notification.
    #[default]
    Pending,

    /// The provider reported a completed payment (terminal).
    Confirmed,

    /// The provider reported a cancellation (terminal).
    Canceled,
}

impl PaymentStatus {
    /// Returns true if no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PaymentStatus::Confirmed | PaymentStatus::Canceled)
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Confirmed => "confirmed",
            PaymentStatus::Canceled => "canceled",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The payment sub-record persisted on an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub method: PaymentMethod,
    /// Identifier assigned by the payment provider, once known.
    pub provider_payment_id: Option<String>,
    /// Raw provider payload, kept verbatim for audit and support.
    pub payload: Option<Value>,
    pub status: PaymentStatus,
}

impl PaymentRecord {
    /// The initial record attached when an order is created.
    pub fn pending(method: PaymentMethod) -> Self {
        Self {
            method,
            provider_payment_id: None,
            payload: None,
            status: PaymentStatus::Pending,
        }
    }

    /// Merges a patch into this record, preserving unset fields.
    pub fn apply(&mut self, patch: PaymentPatch) {
        if let Some(id) = patch.provider_payment_id {
            self.provider_payment_id = Some(id);
        }
        if let Some(payload) = patch.payload {
            self.payload = Some(payload);
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
    }
}

impl Default for PaymentRecord {
    fn default() -> Self {
        Self::pending(PaymentMethod::Pix)
    }
}

/// A partial update to an order's payment record.
///
/// `None` fields are left untouched by [`PaymentRecord::apply`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_payment_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<PaymentStatus>,
}

impl PaymentPatch {
    /// A patch that only changes the payment status.
    pub fn status(status: PaymentStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}
