//! Checkout saga constants.

/// The saga type identifier for checkout.
pub const SAGA_TYPE: &str = "Checkout";

/// Step name: Reserve stock for every selected cart line.
pub const STEP_RESERVE_STOCK: &str = "reserve_stock";

/// Step name: Validate and consume the coupon.
pub const STEP_APPLY_COUPON: &str = "apply_coupon";

/// Step name: Persist the order record.
pub const STEP_PERSIST_ORDER: &str = "persist_order";

/// Step name: Open a payment intent with the provider.
pub const STEP_INITIATE_PAYMENT: &str = "initiate_payment";
