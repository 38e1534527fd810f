//! TTL Cleanup Task
//!
//! Background task that periodically removes expired cache entries.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::CacheStore;

/// Spawns a background task that periodically sweeps expired entries.
///
/// The task sleeps for the configured interval, takes the engine's write
/// guard for the sweep (the engine emits one `ItemExpired` per removal),
/// and exits when the shutdown flag is raised.
///
/// # Arguments
/// * `cache` - Shared reference to the cache engine
/// * `cleanup_interval_secs` - Interval in seconds between sweeps
/// * `shutdown` - Raised once on graceful shutdown
pub fn spawn_cleanup_task(
    cache: Arc<RwLock<CacheStore>>,
    cleanup_interval_secs: u64,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    let interval = Duration::from_secs(cleanup_interval_secs);

    tokio::spawn(async move {
        info!(
            "Starting TTL cleanup task with interval of {} seconds",
            cleanup_interval_secs
        );

        loop {
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = shutdown.changed() => {
                    info!("TTL cleanup task stopping");
                    break;
                }
            }

            let (removed, stats) = {
                let mut cache_guard = cache.write().await;
                (cache_guard.cleanup_expired(), cache_guard.stats())
            };

            if removed > 0 {
                info!("TTL cleanup: removed {} expired entries", removed);
            } else {
                debug!("TTL cleanup: no expired entries found");
            }
            debug!(
                entries = stats.total_entries,
                hits = stats.hits,
                misses = stats.misses,
                evictions = stats.evictions,
                expirations = stats.expirations,
                "Cache statistics"
            );
        }
    })
}
