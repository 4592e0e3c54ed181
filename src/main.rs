use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rocket_telemetry::api::{self, AppState};
use rocket_telemetry::config;
use rocket_telemetry::pipeline::{Sequencer, WorkerPool};
use rocket_telemetry::storage::event_log::EventLog;
use rocket_telemetry::storage::memory::InMemoryEventLog;
use rocket_telemetry::storage::rockets::RocketStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = config::settings::Config::from_env();
    info!(?config, "loaded config");

    // 1. Storage
    let log: Arc<dyn EventLog> = Arc::new(InMemoryEventLog::new());
    let rockets = Arc::new(RocketStore::new(log.clone()));

    // 2. Pipeline
    let sequencer = Arc::new(Sequencer::new(rockets.clone()));
    let pool = Arc::new(WorkerPool::new(
        sequencer.clone(),
        config.worker_count,
        config.queue_capacity,
    ));
    pool.start().await;

    // 3. HTTP API
    let state = AppState {
        pool: pool.clone(),
        sequencer,
        rockets,
        log,
    };
    let app = api::router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Stop workers only after the listener has drained.
    pool.shutdown();
    pool.wait().await;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for shutdown signal");
        return;
    }
    info!("shutdown signal received");
}
