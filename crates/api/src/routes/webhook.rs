//! PIX payment webhook endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use checkout::{OrderNotifier, PaymentGateway, PixNotification};
use serde_json::{Value, json};
use store::{CouponLedger, InventoryLedger, OrderStore};

use crate::error::ApiError;
use crate::routes::checkout::AppState;

/// POST /webhook/pix — apply a provider payment notification.
///
/// Responds `{ok: true}` for every accepted outcome, including
/// idempotent redeliveries and unrecognized statuses. The caller is the
/// provider's delivery machinery, so errors are bare status codes.
#[tracing::instrument(skip(state, headers, notification))]
pub async fn pix<I, C, O, G, N>(
    State(state): State<Arc<AppState<I, C, O, G, N>>>,
    headers: HeaderMap,
    Json(notification): Json<PixNotification>,
) -> Result<Json<Value>, ApiError>
where
    I: InventoryLedger,
    C: CouponLedger,
    O: OrderStore,
    G: PaymentGateway,
    N: OrderNotifier,
{
    let signature = headers
        .get("x-webhook-signature")
        .and_then(|v| v.to_str().ok());

    state.reconciler.process(notification, signature).await?;
    Ok(Json(json!({ "ok": true })))
}
