//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with write timestamps.

use std::time::{Duration, Instant};

// == Cache Entry ==
/// A stored payload together with the instant it was written.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    /// The stored value
    pub value: T,
    /// Instant of the last write to this key
    pub stored_at: Instant,
    /// Global write counter at the time of the last write, breaks timestamp ties
    pub sequence: u64,
}

impl<T> CacheEntry<T> {
    // == Constructor ==
    /// Creates a new cache entry written at `now`.
    ///
    /// # Arguments
    /// * `value` - The value to store
    /// * `now` - Current instant from the cache's clock
    /// * `sequence` - Write sequence number assigned by the cache
    pub fn new(value: T, now: Instant, sequence: u64) -> Self {
        Self {
            value,
            stored_at: now,
            sequence,
        }
    }

    // == Age ==
    /// Returns how long ago the entry was written.
    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.stored_at)
    }

    // == Is Expired ==
    /// Checks if the entry has outlived `ttl`.
    ///
    /// Boundary condition: an entry whose age is exactly `ttl` is still fresh.
    /// It expires once its age is strictly greater than `ttl`.
    pub fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        self.age(now) > ttl
    }

    // == Time To Live ==
    /// Returns how much longer the entry stays fresh, zero once expired.
    pub fn ttl_remaining(&self, now: Instant, ttl: Duration) -> Duration {
        ttl.saturating_sub(self.age(now))
    }

    // == Eviction Order ==
    /// Key used to order entries oldest write first.
    pub(crate) fn eviction_rank(&self) -> (Instant, u64) {
        (self.stored_at, self.sequence)
    }
}
