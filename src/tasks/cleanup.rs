//! Expiry Cleanup Task
//!
//! Background task that periodically removes expired cache files.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::FileCache;

/// Spawns a background task that runs `FileCache::clean` every interval.
///
/// Directory walks are blocking, so each pass runs on tokio's blocking pool.
/// A failed pass is logged and retried on the next tick.
///
/// # Arguments
/// * `cache` - Cache whose directory is cleaned
/// * `cleanup_interval_secs` - Interval in seconds between cleanup runs
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during shutdown.
///
/// # Example
/// ```ignore
/// let cleanup_handle = spawn_cleanup_task(FileCache::new(), 60);
/// // Later, during shutdown:
/// cleanup_handle.abort();
/// ```
pub fn spawn_cleanup_task(cache: FileCache, cleanup_interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(cleanup_interval_secs);

    tokio::spawn(async move {
        info!(
            "Starting expiry cleanup task for {} with interval of {} seconds",
            cache.config().cache_directory.display(),
            cleanup_interval_secs
        );

        loop {
            // Sleep for the configured interval
            tokio::time::sleep(interval).await;

            let pass = cache.clone();
            match tokio::task::spawn_blocking(move || pass.clean()).await {
                Ok(Ok(removed)) => debug!("Cleanup pass removed {} entries", removed),
                Ok(Err(e)) => warn!("Cleanup pass failed: {}", e),
                Err(e) => warn!("Cleanup pass panicked: {}", e),
            }
        }
    })
}
