//! Cache Module
//!
//! Provides an in-memory response cache with TTL expiry, periodic sweeping and
//! a size bound enforced by evicting the oldest writes.

mod clock;
mod entry;
mod stats;
mod store;


use std::sync::Arc;

use tokio::sync::RwLock;

// Re-export public types
pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::CacheEntry;
pub use stats::CacheStats;
pub use store::{SweepOutcome, TtlCache};

/// Cache handle shared between the API client, the gateway and the sweeper.
pub type SharedCache<T> = Arc<RwLock<TtlCache<T>>>;

/// Wraps a cache so it can be shared across tasks.
pub fn shared<T>(cache: TtlCache<T>) -> SharedCache<T> {
    Arc::new(RwLock::new(cache))
}
