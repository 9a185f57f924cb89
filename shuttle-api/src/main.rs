use anyhow::Context;
use shuttle_api::{app, worker, AppState};
use shuttle_core::SystemClock;
use shuttle_order::MockPaymentProvider;
use shuttle_store::{Config, InMemoryTripCatalog};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shuttle_api=debug,shuttle_order=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("failed to load config")?;
    tracing::info!("Starting shuttle booking API on port {}", config.server.port);

    let catalog = InMemoryTripCatalog::load(&config.catalog.trips_file)
        .with_context(|| format!("failed to load trips from {}", config.catalog.trips_file))?;
    tracing::info!(trips = catalog.len(), "trip catalog loaded");

    let provider = MockPaymentProvider::new(config.payment.callback_base_url.clone());
    let state = AppState::build(&config, Arc::new(catalog), Arc::new(provider), Arc::new(SystemClock)).await?;

    let sweeper = tokio::spawn(worker::run_hold_sweeper(
        state.clone(),
        Duration::from_secs(config.business_rules.sweep_interval_seconds),
    ));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    sweeper.abort();
    tracing::info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
