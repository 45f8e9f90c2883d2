//! Admin order endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use checkout::{OrderNotifier, PaymentGateway};
use domain::{Order, OrderId, OrderStatus};
use serde::Deserialize;
use store::{CouponLedger, InventoryLedger, OrderStore};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::routes::checkout::AppState;

const ADMIN_LIST_LIMIT: usize = 200;

/// GET /admin/orders — newest orders first, capped at a page of 200.
pub async fn list<I, C, O, G, N>(
    State(state): State<Arc<AppState<I, C, O, G, N>>>,
    user: AuthUser,
) -> Result<Json<Vec<Order>>, ApiError>
where
    I: InventoryLedger,
    C: CouponLedger,
    O: OrderStore,
    G: PaymentGateway,
    N: OrderNotifier,
{
    user.require_admin()?;
    let orders = state.orders.list_recent(ADMIN_LIST_LIMIT).await?;
    Ok(Json(orders))
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

/// PUT /admin/orders/{id}/status — set an order's status by hand.
pub async fn update_status<I, C, O, G, N>(
    State(state): State<Arc<AppState<I, C, O, G, N>>>,
    user: AuthUser,
    Path(order_id): Path<OrderId>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<Order>, ApiError>
where
    I: InventoryLedger,
    C: CouponLedger,
    O: OrderStore,
    G: PaymentGateway,
    N: OrderNotifier,
{
    user.require_admin()?;
    let status = req
        .status
        .parse::<OrderStatus>()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let order = state.orders.update_status(order_id, status).await?;
    Ok(Json(order))
}
