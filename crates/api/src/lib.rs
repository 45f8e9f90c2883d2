//! HTTP API server for the shop checkout service.
//!
//! Provides the storefront checkout endpoint, the PIX payment webhook
//! and admin order management, with structured logging (tracing) and
//! Prometheus metrics.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use checkout::{CheckoutSaga, OrderNotifier, PaymentGateway, WebhookReconciler};
use metrics_exporter_prometheus::PrometheusHandle;
use store::{CouponLedger, InventoryLedger, OrderStore};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use routes::checkout::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<I, C, O, G, N>(
    state: Arc<AppState<I, C, O, G, N>>,
    metrics_handle: PrometheusHandle,
) -> Router
where
    I: InventoryLedger + 'static,
    C: CouponLedger + 'static,
    O: OrderStore + 'static,
    G: PaymentGateway + 'static,
    N: OrderNotifier + 'static,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/checkout", post(routes::checkout::create::<I, C, O, G, N>))
        .route("/webhook/pix", post(routes::webhook::pix::<I, C, O, G, N>))
        .route("/admin/orders", get(routes::admin::list::<I, C, O, G, N>))
        .route(
            "/admin/orders/{id}/status",
            put(routes::admin::update_status::<I, C, O, G, N>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Wires the stores and payment services into shared application state.
///
/// The saga and the reconciler each hold their own handle to the
/// inventory and order stores; the admin routes read orders directly.
pub fn create_state<I, C, O, G, N>(
    inventory: I,
    coupons: C,
    orders: O,
    gateway: G,
    notifier: N,
    config: &Config,
) -> Arc<AppState<I, C, O, G, N>>
where
    I: InventoryLedger + Clone,
    C: CouponLedger,
    O: OrderStore + Clone,
    G: PaymentGateway + Clone,
    N: OrderNotifier,
{
    let saga = CheckoutSaga::new(
        inventory.clone(),
        coupons,
        orders.clone(),
        gateway.clone(),
        config.pricing(),
    );
    let reconciler = WebhookReconciler::new(
        inventory,
        orders.clone(),
        gateway,
        notifier,
        config.admin_email.clone(),
    );

    Arc::new(AppState {
        saga,
        reconciler,
        orders,
    })
}
