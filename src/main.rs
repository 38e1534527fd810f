//! cachecast - a network-accessible in-memory cache with change notifications
//!
//! Bounded LFU cache with TTL expiration, served over a line-delimited JSON
//! protocol with server-pushed change events.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cachecast::events::spawn_dispatcher;
use cachecast::server::{serve, AppState};
use cachecast::tasks::spawn_cleanup_task;
use cachecast::Config;

/// Main entry point for the cachecast server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables (fatal on bad capacity)
/// 3. Create the cache engine, event queue, and subscription registry
/// 4. Start the event dispatcher and the TTL cleanup task
/// 5. Bind the TCP listener on the configured port (fatal on failure)
/// 6. Accept connections until SIGINT/SIGTERM
/// 7. Raise the shutdown flag and drain within a bounded time
#[tokio::main]
async fn main() {
    // Initialize tracing subscriber with env filter
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cachecast=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting cachecast server");

    let config = Config::from_env();
    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        std::process::exit(1);
    }
    info!(
        "Configuration loaded: port={}, max_items={}, cleanup_interval={}s",
        config.port, config.max_items, config.cleanup_interval
    );

    let (state, event_rx) = match AppState::from_config(&config) {
        Ok(wired) => wired,
        Err(e) => {
            error!("Failed to initialize cache: {}", e);
            std::process::exit(1);
        }
    };
    info!("Cache engine initialized");

    let dispatcher_handle = spawn_dispatcher(state.registry.clone(), event_rx);
    info!("Event dispatcher started");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let cleanup_handle =
        spawn_cleanup_task(state.cache.clone(), config.cleanup_interval, shutdown_rx.clone());
    info!("Background cleanup task started");

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    info!("Server listening on {}", addr);

    let server_handle = tokio::spawn(serve(listener, state, shutdown_rx));

    shutdown_signal().await;

    // Stop accepting, unblock sessions and the sweep timer
    let _ = shutdown_tx.send(true);

    let drain = async {
        let _ = server_handle.await;
        let _ = cleanup_handle.await;
    };
    if tokio::time::timeout(Duration::from_secs(5), drain).await.is_err() {
        warn!("Shutdown drain timed out");
    }
    dispatcher_handle.abort();

    info!("Server shutdown complete");
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
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
