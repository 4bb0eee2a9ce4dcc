//! Rental Cache - ops server
//!
//! Runs the cache with its background tasks and exposes the local ops API.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rental_cache::api::{create_router, AppState};
use rental_cache::tasks::{self, BackgroundTasks};
use rental_cache::{Cache, Config, SnapshotPersistence};

/// Main entry point for the cache server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the cache and restore the last snapshot, if any
/// 4. Start the expiry reaper and the snapshot timer
/// 5. Serve the ops API until SIGINT/SIGTERM
/// 6. Stop the timers and write a final snapshot
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rental_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Rental Cache");

    let config = Config::from_env();
    info!(
        max_size = config.max_size,
        default_ttl_secs = config.default_ttl.as_secs(),
        cleanup_interval_secs = config.cleanup_interval.as_secs(),
        persistence = config.enable_persistence,
        port = config.server_port,
        "Configuration loaded"
    );

    let cache: Cache<serde_json::Value> = Cache::from_config(&config);
    let persistence = SnapshotPersistence::from_config(&config).map(Arc::new);
    if let Some(persistence) = &persistence {
        let outcome = persistence.load_into(&cache).await;
        info!(?outcome, entries = cache.len(), "Cache warm start finished");
    }

    let background = BackgroundTasks::spawn(&cache, config.cleanup_interval, persistence.clone());
    info!("Background tasks started");

    let app = create_router(AppState::new(cache.clone(), persistence.clone()));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tasks::shutdown(&cache, background, persistence.as_deref()).await;
    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!(error = %err, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
