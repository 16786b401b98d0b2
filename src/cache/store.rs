//! Cache Store Module
//!
//! TTL cache engine: HashMap storage with lazy and periodic expiry and a size
//! bound enforced by evicting the oldest writes.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tracing::debug;

use crate::cache::{CacheEntry, CacheStats, Clock, SystemClock};
use crate::config::CacheConfig;

// == Sweep Outcome ==
/// Number of entries a sweep pass removed, by reason.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepOutcome {
    /// Entries older than the TTL
    pub expired: usize,
    /// Entries evicted to get back under the size bound
    pub evicted: usize,
}

impl SweepOutcome {
    pub fn removed(&self) -> usize {
        self.expired + self.evicted
    }
}

// == TTL Cache ==
/// In-memory cache that never returns entries older than its TTL and never
/// holds more than `max_entries` entries once a write returns.
///
/// Eviction removes the entries with the oldest write timestamps. Reads do not
/// refresh an entry, so a frequently read key can still be evicted.
#[derive(Debug)]
pub struct TtlCache<T> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<T>>,
    /// TTL, sweep interval and capacity
    config: CacheConfig,
    /// Time source for write timestamps and expiry checks
    clock: Arc<dyn Clock>,
    /// Performance statistics
    stats: CacheStats,
    /// Monotonic write counter
    next_sequence: u64,
}

impl<T: Clone> TtlCache<T> {
    // == Constructor ==
    /// Creates a new cache reading time from the system clock.
    pub fn new(config: CacheConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Creates a new cache reading time from `clock`.
    pub fn with_clock(config: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: HashMap::with_capacity(config.max_entries.saturating_add(1)),
            config,
            clock,
            stats: CacheStats::new(),
            next_sequence: 0,
        }
    }

    // == Get ==
    /// Returns the value for `key` if it is present and not older than the TTL.
    ///
    /// A stale entry is removed on the spot and reported as absent. Lookups do
    /// not touch the entry's timestamp.
    pub fn get(&mut self, key: &str) -> Option<T> {
        let now = self.clock.now();
        let ttl = self.config.ttl;

        let entry = match self.entries.get(key) {
            None => {
                self.stats.record_miss();
                debug!(key, "cache miss");
                return None;
            }
            Some(entry) => entry,
        };

        if !entry.is_expired(now, ttl) {
            let value = entry.value.clone();
            let remaining_secs = entry.ttl_remaining(now, ttl).as_secs();
            self.stats.record_hit();
            debug!(key, remaining_secs, "cache hit");
            return Some(value);
        }

        self.entries.remove(key);
        self.stats.record_expirations(1);
        self.stats.record_miss();
        self.stats.set_total_entries(self.entries.len());
        debug!(key, "cache entry expired on lookup");
        None
    }

    // == Set ==
    /// Stores `value` under `key`, stamped with the current time.
    ///
    /// Overwriting replaces both the value and the timestamp. If the cache is
    /// over capacity afterwards, the oldest writes are evicted before returning.
    pub fn set(&mut self, key: impl Into<String>, value: T) {
        let now = self.clock.now();
        let sequence = self.next_sequence;
        self.next_sequence += 1;

        self.entries
            .insert(key.into(), CacheEntry::new(value, now, sequence));

        if self.entries.len() > self.config.max_entries {
            self.evict_oldest();
        }

        self.stats.set_total_entries(self.entries.len());
    }

    // == Sweep ==
    /// Removes every entry older than the TTL, then enforces the size bound.
    pub fn sweep(&mut self) -> SweepOutcome {
        let now = self.clock.now();
        let ttl = self.config.ttl;

        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now, ttl));
        let expired = before - self.entries.len();
        self.stats.record_expirations(expired);

        let evicted = if self.entries.len() > self.config.max_entries {
            self.evict_oldest()
        } else {
            0
        };

        self.stats.set_total_entries(self.entries.len());
        SweepOutcome { expired, evicted }
    }

    // == Evict Oldest ==
    /// Removes the oldest writes until the cache is back at `max_entries`.
    ///
    /// Returns the number of entries evicted.
    fn evict_oldest(&mut self) -> usize {
        let excess = self.entries.len().saturating_sub(self.config.max_entries);
        if excess == 0 {
            return 0;
        }

        let mut ranked: Vec<(String, (Instant, u64))> = self
            .entries
            .iter()
            .map(|(key, entry)| (key.clone(), entry.eviction_rank()))
            .collect();
        ranked.sort_by_key(|(_, rank)| *rank);

        for (key, _) in ranked.into_iter().take(excess) {
            self.entries.remove(&key);
            debug!(key = %key, "evicted oldest cache entry");
        }

        self.stats.record_evictions(excess);
        excess
    }
}

impl<T> TtlCache<T> {
    // == Invalidate ==
    /// Removes the entry for `key`. Returns true if there was one.
    pub fn invalidate(&mut self, key: &str) -> bool {
        let removed = self.entries.remove(key).is_some();
        self.stats.set_total_entries(self.entries.len());
        removed
    }

    /// Removes every entry whose key starts with `prefix`.
    ///
    /// Returns the number of entries removed.
    pub fn invalidate_prefix(&mut self, prefix: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| !key.starts_with(prefix));
        self.stats.set_total_entries(self.entries.len());
        before - self.entries.len()
    }

    // == Clear ==
    /// Removes every entry. Statistics counters are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.stats.set_total_entries(0);
    }

    /// Returns true if `key` is stored, fresh or not. Does not expire anything.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    // == Length ==
    /// Returns the current number of entries, including stale ones not yet swept.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
