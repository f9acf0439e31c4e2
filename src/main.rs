//! Tiered Cache server
//!
//! Serves a two-tier (memory + disk) cache over HTTP.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tiered_cache::api::create_router;
use tiered_cache::{spawn_pressure_task, AppState, Config};

/// Main entry point for the tiered cache server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Open the cache (rebuilding the disk index) and apply limits
/// 4. Start the memory pressure signal bridge
/// 5. Serve the router until SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tiered_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting tiered cache server");

    let config = Config::from_env();
    info!(
        "Configuration loaded: name={}, root={}, max_cost={:?}, max_disk_bytes={:?}, port={}",
        config.cache_name,
        config.cache_root.display(),
        config.max_cost,
        config.max_disk_bytes,
        config.server_port
    );

    let state = AppState::from_config(&config).context("failed to open cache")?;
    info!(
        "Cache ready with {} entries on disk ({} bytes)",
        state.cache.disk().len(),
        state.cache.disk().byte_count()
    );

    let pressure_handle = spawn_pressure_task(state.pressure.clone());

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(pressure_handle))
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM), then stops the pressure bridge.
async fn shutdown_signal(pressure_handle: tokio::task::JoinHandle<()>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
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

    pressure_handle.abort();
    warn!("Pressure bridge aborted");
}
