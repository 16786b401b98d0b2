//! Cache Sweep Task
//!
//! Background task that periodically removes expired cache entries, and a
//! handle that starts and stops it explicitly.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::cache::SharedCache;

/// Spawns a background task that sweeps `cache` every `interval`.
///
/// The first sweep runs immediately. Each pass holds the cache's write lock
/// for its whole duration, so it never interleaves with a lookup or a write.
///
/// # Arguments
/// * `cache` - Shared handle to the cache
/// * `interval` - Time between sweeps
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during shutdown.
pub fn spawn_sweep_task<T>(cache: SharedCache<T>, interval: Duration) -> JoinHandle<()>
where
    T: Clone + Send + Sync + 'static,
{
    tokio::spawn(async move {
        info!(interval_secs = interval.as_secs(), "Starting cache sweep task");

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let (outcome, remaining) = {
                let mut guard = cache.write().await;
                let outcome = guard.sweep();
                (outcome, guard.len())
            };

            if outcome.removed() > 0 {
                info!(
                    expired = outcome.expired,
                    evicted = outcome.evicted,
                    remaining,
                    "Cache sweep removed entries"
                );
            } else {
                debug!(remaining, "Cache sweep: nothing to remove");
            }
        }
    })
}

// == Cache Sweeper ==
/// Owns the sweep task for one cache.
///
/// Nothing runs until `start` is called. Dropping the sweeper stops the task.
#[derive(Debug)]
pub struct CacheSweeper<T> {
    cache: SharedCache<T>,
    interval: Duration,
    handle: Option<JoinHandle<()>>,
}

impl<T> CacheSweeper<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Creates a stopped sweeper for `cache`.
    pub fn new(cache: SharedCache<T>, interval: Duration) -> Self {
        Self {
            cache,
            interval,
            handle: None,
        }
    }

    // == Start ==
    /// Spawns the sweep task. Does nothing if it is already running.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self) {
        if self.is_running() {
            debug!("Cache sweeper already running");
            return;
        }
        self.handle = Some(spawn_sweep_task(self.cache.clone(), self.interval));
    }

    // == Stop ==
    /// Aborts the sweep task. Does nothing if it is not running.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            info!("Cache sweep task stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl<T> Drop for CacheSweeper<T> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::cache::{shared, ManualClock, TtlCache};
    use crate::config::CacheConfig;

    const TTL: Duration = Duration::from_secs(3600);
    const INTERVAL: Duration = Duration::from_secs(900);

    fn test_cache() -> (SharedCache<String>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let config = CacheConfig {
            ttl: TTL,
            sweep_interval: INTERVAL,
            max_entries: 100,
        };
        (shared(TtlCache::with_clock(config, clock.clone())), clock)
    }

    async fn fill(cache: &SharedCache<String>, count: usize) {
        let mut guard = cache.write().await;
        for i in 0..count {
            guard.set(format!("key{}", i), "value".to_string());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_runs_immediately_on_start() {
        let (cache, clock) = test_cache();
        fill(&cache, 5).await;
        clock.advance(TTL + Duration::from_secs(1));

        let mut sweeper = CacheSweeper::new(cache.clone(), INTERVAL);
        sweeper.start();
        tokio::time::sleep(Duration::from_millis(1)).await;

        assert!(cache.read().await.is_empty());
        sweeper.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_runs_periodically() {
        let (cache, clock) = test_cache();
        let mut sweeper = CacheSweeper::new(cache.clone(), INTERVAL);
        sweeper.start();
        tokio::time::sleep(Duration::from_millis(1)).await;

        fill(&cache, 3).await;
        clock.advance(TTL + Duration::from_secs(1));
        assert_eq!(cache.read().await.len(), 3, "nothing swept before the next tick");

        tokio::time::sleep(INTERVAL).await;

        assert!(cache.read().await.is_empty());
        assert_eq!(cache.read().await.stats().expirations, 3);
        sweeper.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_preserves_fresh_entries() {
        let (cache, clock) = test_cache();
        fill(&cache, 2).await;

        let mut sweeper = CacheSweeper::new(cache.clone(), INTERVAL);
        sweeper.start();

        clock.advance(INTERVAL);
        tokio::time::sleep(INTERVAL + Duration::from_millis(1)).await;

        let mut guard = cache.write().await;
        assert_eq!(guard.len(), 2);
        assert_eq!(guard.get("key0"), Some("value".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_is_idempotent() {
        let (cache, _clock) = test_cache();
        let mut sweeper = CacheSweeper::new(cache, INTERVAL);
        assert_eq!(sweeper.interval(), INTERVAL);

        sweeper.start();
        sweeper.start();
        assert!(sweeper.is_running());

        sweeper.stop();
        assert!(!sweeper.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stopped_sweeper_leaves_entries() {
        let (cache, clock) = test_cache();
        let mut sweeper = CacheSweeper::new(cache.clone(), INTERVAL);
        sweeper.start();
        tokio::time::sleep(Duration::from_millis(1)).await;
        sweeper.stop();

        fill(&cache, 4).await;
        clock.advance(TTL + Duration::from_secs(1));
        tokio::time::sleep(INTERVAL * 2).await;

        assert_eq!(cache.read().await.len(), 4);
    }

    #[tokio::test]
    async fn test_spawned_task_can_be_aborted() {
        let (cache, _clock) = test_cache();

        let handle = spawn_sweep_task(cache, Duration::from_secs(1));
        handle.abort();

        let result = handle.await;
        assert!(result.unwrap_err().is_cancelled());
    }

    #[tokio::test]
    async fn test_drop_aborts_task() {
        let (cache, _clock) = test_cache();
        let mut sweeper = CacheSweeper::new(cache.clone(), Duration::from_secs(1));
        sweeper.start();
        drop(sweeper);

        // The task held the only other clone of the cache handle
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(Arc::strong_count(&cache), 1);
    }
}
