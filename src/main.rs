//! Worker Cache - A multi-strategy HTTP caching layer
//!
//! Runs the caching worker as a local reverse proxy in front of an upstream
//! origin.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use worker_cache::api::create_router;
use worker_cache::{spawn_control_task, AppState, Config, Worker};

/// Control messages buffered before senders wait.
const CONTROL_CAPACITY: usize = 64;

/// Main entry point for the caching proxy.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the worker and pre-warm its static partition
/// 4. Activate it, sweeping partitions of older cache versions
/// 5. Start the control channel
/// 6. Serve the proxy on the configured port
/// 7. On SIGINT/SIGTERM, drain background refreshes and retire the worker
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "worker_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Worker Cache proxy");

    let config = Config::from_env();
    info!(
        "Configuration loaded: version={}, upstream={}, port={}, precache={} urls, quota={:?}",
        config.cache_version,
        config.upstream_url,
        config.server_port,
        config.precache_manifest.len(),
        config.storage_quota_bytes
    );

    let worker = Arc::new(Worker::from_config(&config).context("failed to build worker")?);

    let report = worker.install().await.context("install failed")?;
    if !report.failed.is_empty() {
        warn!("Pre-warm incomplete: {:?}", report.failed);
    }
    worker.activate().await.context("activation failed")?;

    let (control, control_task) = spawn_control_task(worker.clone(), CONTROL_CAPACITY);
    info!("Control channel started");

    let app = create_router(AppState::new(worker.clone(), control));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    worker.revalidator().wait_idle().await;
    worker.retire().await;
    control_task.abort();

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
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
}
