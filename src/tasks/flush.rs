//! Snapshot Flush Task
//!
//! Background task that periodically writes the cache to its snapshot.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::PathCache;

/// Spawns a background task that saves the cache every `flush_interval_secs`.
///
/// Each save holds the write lock for its whole duration. Failed saves are
/// logged by the cache and retried on the next tick. Abort the returned
/// handle on shutdown and save once more.
pub fn spawn_flush_task(cache: Arc<RwLock<PathCache>>, flush_interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(flush_interval_secs);

    tokio::spawn(async move {
        info!(
            "Starting snapshot flush task with interval of {} seconds",
            flush_interval_secs
        );

        loop {
            tokio::time::sleep(interval).await;

            let saved = {
                let mut cache_guard = cache.write().await;
                cache_guard.save().is_ok()
            };

            if saved {
                debug!("Snapshot flushed");
            }
        }
    })
}
