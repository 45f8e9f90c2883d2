//! Checkout endpoint and shared application state.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use checkout::{
    CheckoutReceipt, CheckoutRequest, CheckoutSaga, OrderNotifier, PaymentGateway,
    WebhookReconciler,
};
use store::{CouponLedger, InventoryLedger, OrderStore};

use crate::auth::AuthUser;
use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<I, C, O, G, N>
where
    I: InventoryLedger,
    C: CouponLedger,
    O: OrderStore,
    G: PaymentGateway,
    N: OrderNotifier,
{
    pub saga: CheckoutSaga<I, C, O, G>,
    pub reconciler: WebhookReconciler<I, O, G, N>,
    pub orders: O,
}

/// POST /checkout — run the checkout saga for the authenticated user.
#[tracing::instrument(skip(state, user, req), fields(user_id = %user.user_id))]
pub async fn create<I, C, O, G, N>(
    State(state): State<Arc<AppState<I, C, O, G, N>>>,
    user: AuthUser,
    Json(req): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<CheckoutReceipt>), ApiError>
where
    I: InventoryLedger,
    C: CouponLedger,
    O: OrderStore,
    G: PaymentGateway,
    N: OrderNotifier,
{
    let receipt = state.saga.execute(user.user_id, req).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}
