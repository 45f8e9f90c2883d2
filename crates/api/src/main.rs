//! API server entry point.

use api::config::Config;
use checkout::{LogNotifier, PixClient};
use sqlx::postgres::PgPoolOptions;
use store::{
    InMemoryCoupons, InMemoryInventory, InMemoryOrders, PostgresCoupons, PostgresInventory,
    PostgresOrders,
};
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    // 1. Initialize tracing
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Install Prometheus metrics recorder
    let prometheus_builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    let metrics_handle = prometheus_builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Payment gateway: real provider calls when EFI_API_KEY is set,
    //    mock intents otherwise.
    let gateway = PixClient::new(
        config.efi_api_base.clone(),
        config.efi_api_key.clone(),
        config.authenticity(),
    )
    .expect("failed to build payment gateway client");

    // 4. Wire stores and build the application
    let app = match &config.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .connect(url)
                .await
                .expect("failed to connect to Postgres");
            store::run_migrations(&pool)
                .await
                .expect("failed to run migrations");
            tracing::info!("using Postgres-backed stores");

            let state = api::create_state(
                PostgresInventory::new(pool.clone()),
                PostgresCoupons::new(pool.clone()),
                PostgresOrders::new(pool),
                gateway,
                LogNotifier,
                &config,
            );
            api::create_app(state, metrics_handle)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory stores");
            let state = api::create_state(
                InMemoryInventory::new(),
                InMemoryCoupons::new(),
                InMemoryOrders::new(),
                gateway,
                LogNotifier,
                &config,
            );
            api::create_app(state, metrics_handle)
        }
    };

    // 5. Start server
    let addr = config.addr();
    tracing::info!(%addr, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("server shut down gracefully");
}
