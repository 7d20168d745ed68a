use anyhow::Result;
use std::time::Duration;
use tokio::signal;
use tracing::info;

use eventgate_api::app::create_app;
use eventgate_api::config::Config;
use eventgate_api::jobs::{CleanupCodesJob, JobScheduler, PoolMetricsJob};
use eventgate_api::middleware::{init_logging, init_metrics};

/// Job-drain deadline once the server stops accepting connections.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::load()?;

    // Initialize logging
    init_logging(&config.logging);

    info!("Starting EventGate API v{}", env!("CARGO_PKG_VERSION"));

    // Install the Prometheus recorder before anything records
    init_metrics();

    // Create database pool
    let pool = persistence::db::create_pool(&config.database.pool_config()).await?;

    // Run migrations
    info!("Running database migrations...");
    sqlx::migrate!("../persistence/src/migrations")
        .run(&pool)
        .await?;
    info!("Migrations completed");

    // Start background jobs
    let mut scheduler = JobScheduler::new();
    scheduler.register(CleanupCodesJob::new(pool.clone()));
    scheduler.register(PoolMetricsJob::new(pool.clone()));
    scheduler.start();

    // Build application
    let app = create_app(config.clone(), pool);

    // Start server
    let addr = config.socket_addr();
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Drain background jobs after the listener closes
    scheduler.shutdown();
    scheduler.wait_for_shutdown(SHUTDOWN_TIMEOUT).await;

    info!("Server stopped");

    Ok(())
}

/// Resolves on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, draining connections");
}
