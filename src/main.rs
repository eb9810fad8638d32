//! feedstash - feed crawler state
//!
//! Loads the link cache, runs startup maintenance and serves the admin API
//! until shut down. The binary does not crawl; crawls run through
//! `feedstash::crawler::Crawler` with collaborators supplied by the caller.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use feedstash::api::create_router;
use feedstash::crawler::maintenance;
use feedstash::notify::{LogNotifier, Notifier};
use feedstash::{spawn_flush_task, AppState, Config, PathCache};

/// Main entry point for the feedstash server.
///
/// # Startup Sequence
/// 1. Load configuration from environment variables
/// 2. Initialize tracing subscriber for logging
/// 3. Load the cache snapshot and run maintenance
/// 4. Start background flush task
/// 5. Serve the admin API on the configured port
/// 6. On SIGINT/SIGTERM stop the flush task and save once more
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env();

    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "feedstash=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_ansi(!config.no_color))
        .init();

    info!("Starting feedstash");
    info!(
        "Configuration loaded: snapshot={}, port={}, flush_interval={}s, dry_run={}, cache_only={}",
        config.snapshot_path().display(),
        config.server_port,
        config.flush_interval,
        config.dry_run,
        config.cache_only
    );

    let mut cache = PathCache::load(&config);
    let report = maintenance::run(&mut cache, &config);
    info!(
        "Cache ready with {} links (cleaned: {:?}, reset: {}, deduped: {:?})",
        cache.link_count(),
        report.cleaned,
        report.reset,
        report.deduped
    );

    let notifier: Arc<dyn Notifier> = Arc::new(LogNotifier);
    let state = AppState::from_config(&config, cache, notifier);

    let flush_handle = spawn_flush_task(state.cache.clone(), config.flush_interval);
    info!("Background flush task started");

    let app = create_router(state.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(flush_handle))
        .await
        .context("Server error")?;

    state
        .cache
        .write()
        .await
        .save()
        .context("Final snapshot save failed")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM), then stops the flush task.
async fn shutdown_signal(flush_handle: tokio::task::JoinHandle<()>) {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", err);
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
                error!("Failed to install SIGTERM handler: {}", err);
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

    flush_handle.abort();
    warn!("Flush task aborted");
}
