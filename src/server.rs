//! Server startup, shutdown, and background task spawning.
//!
//! `run_server` wires the registry, click worker, expiry sweeper, and router
//! together, binds the listener, and handles graceful shutdown.

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::jobs::{create_job_channel, Worker, WorkerConfig};
use crate::registry::{InMemoryRegistry, Registry};
use crate::routes;
use crate::services::LinkService;
use crate::state::AppState;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

/// Run the web server with the given configuration.
///
/// Spawns the click-recording worker and the expiry sweeper, serves requests
/// until a shutdown signal arrives, then drains the worker before returning.
pub async fn run_server(config: Config, addr: String) -> AppResult<()> {
    info!("Starting shortreg server...");

    let registry: Arc<dyn Registry> = Arc::new(InMemoryRegistry::new());

    // Click-recording worker
    let (job_sender, job_receiver) = create_job_channel();
    let worker = Worker::new(Arc::clone(&registry), job_receiver).with_config(WorkerConfig {
        geo_lookup_enabled: config.registry.geo_lookup_enabled,
        ..WorkerConfig::default()
    });
    let worker_handle = tokio::spawn(worker.run());

    // Periodic expiry sweeper
    let sweeper_handle = tokio::spawn(run_sweeper(
        Arc::clone(&registry),
        config.registry.sweep_interval_seconds,
    ));

    let links = LinkService::new(
        Arc::clone(&registry),
        job_sender,
        config.url.base_url.clone(),
        config.url.short_code_length,
        config.url.short_code_max_attempts,
        config.url.default_validity_minutes,
    );

    let state = Arc::new(AppState {
        links,
        registry,
        max_batch_size: config.url.max_batch_size,
        started_at: chrono::Utc::now(),
    });

    let app = routes::create_router(state, config.cors.allowed_origins, config.rate_limit);

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to bind to address {}: {}", addr, e)))?;

    info!("Server listening on {}", addr);
    info!("Base URL: {}", config.url.base_url);

    let shutdown_signal = create_shutdown_signal();

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await
        .map_err(|e| AppError::Internal(format!("Server error: {}", e)))?;

    // The sweeper loops forever; the worker drains once the last JobSender
    // (held by the router's state) is dropped by axum::serve returning
    sweeper_handle.abort();
    worker_handle.await.unwrap_or_else(|e| {
        if !e.is_cancelled() {
            error!("Worker task failed: {:?}", e);
        }
    });

    info!("Server shutdown complete");
    Ok(())
}

/// Remove expired mappings on a fixed interval.
async fn run_sweeper(registry: Arc<dyn Registry>, interval_seconds: u64) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_seconds));
    // First tick fires immediately; skip it so startup isn't a sweep
    interval.tick().await;

    loop {
        interval.tick().await;
        match registry.sweep_expired(chrono::Utc::now()).await {
            Ok(0) => debug!("Expiry sweep removed nothing"),
            Ok(removed) => info!("Expiry sweep removed {} mapping(s)", removed),
            Err(e) => error!("Expiry sweep failed: {}", e),
        }
    }
}

/// Create a future that resolves when a shutdown signal is received.
///
/// On Unix-like systems, this listens for both Ctrl+C (SIGINT) and SIGTERM.
/// On other platforms, it only listens for Ctrl+C.
///
/// # Panics
///
/// Panics if signal handler installation fails. This is intentional because
/// signal handler failures are unrecoverable system-level errors that indicate
/// the OS cannot deliver shutdown signals, making graceful shutdown impossible.
async fn create_shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(unix)]
    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    #[cfg(not(unix))]
    ctrl_c.await;
}
