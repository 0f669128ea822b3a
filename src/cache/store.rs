//! Cache Store Module
//!
//! Local cache engine combining HashMap storage with FIFO tracking and TTL expiration.

use std::collections::HashMap;
use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use crate::cache::{CacheEntry, CacheStats, FifoQueue};

// == Cache Store ==
/// Bounded key/value storage with FIFO eviction and TTL support.
///
/// Lookups never touch eviction order. After every [`CacheStore::set`] the
/// store holds at most `max_entries` entries.
#[derive(Debug)]
pub struct CacheStore {
    entries: HashMap<String, CacheEntry>,
    fifo: FifoQueue,
    stats: CacheStats,
    max_entries: usize,
    default_ttl: u64,
    /// Bumped by every `delete` and `clear`.
    generation: u64,
}

impl CacheStore {
    // == Constructor ==
    /// Creates a new CacheStore with specified capacity and default TTL.
    ///
    /// # Arguments
    /// * `max_entries` - Maximum number of entries the cache can hold
    /// * `default_ttl` - Default TTL in seconds for entries without explicit TTL
    pub fn new(max_entries: usize, default_ttl: u64) -> Self {
        Self {
            entries: HashMap::new(),
            fifo: FifoQueue::new(),
            stats: CacheStats::new(),
            max_entries,
            default_ttl,
            generation: 0,
        }
    }

    /// TTL applied when `set` gets no explicit value.
    pub fn default_ttl(&self) -> u64 {
        self.default_ttl
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Changes whenever a `delete` or `clear` runs, so a caller holding an
    /// older value knows removals happened since.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Resolves a per-call TTL; `None` and `Some(0)` both mean "use the default".
    pub fn effective_ttl(&self, ttl: Option<u64>) -> u64 {
        ttl.filter(|&t| t > 0).unwrap_or(self.default_ttl)
    }

    // == Set ==
    /// Stores a value, returning the key evicted to stay within capacity.
    ///
    /// An overwrite counts as delete-then-insert: the key becomes the newest
    /// entry and its TTL restarts.
    pub fn set(&mut self, key: String, value: Value, ttl: Option<u64>) -> Option<String> {
        let ttl = self.effective_ttl(ttl);
        self.entries.insert(key.clone(), CacheEntry::new(value, ttl));
        self.fifo.push(&key);

        let mut evicted = None;
        while self.entries.len() > self.max_entries {
            let Some(oldest) = self.fifo.pop_oldest() else {
                break;
            };
            self.entries.remove(&oldest);
            self.stats.record_eviction();
            debug!(key = %oldest, "evicted oldest entry");
            evicted = Some(oldest);
        }

        self.stats.set_total_entries(self.entries.len());
        evicted
    }

    // == Get ==
    /// Returns the value if present and not expired.
    ///
    /// Expired entries are removed on detection and count as a miss.
    pub fn get(&mut self, key: &str) -> Option<Value> {
        let Some(entry) = self.entries.get(key) else {
            self.stats.record_miss();
            return None;
        };

        if entry.is_expired() {
            self.remove_entry(key);
            self.stats.record_expiration();
            self.stats.record_miss();
            debug!(key, "entry expired");
            return None;
        }

        let value = entry.value.clone();
        self.stats.record_hit();
        Some(value)
    }

    // == Delete ==
    /// Removes an entry by key, reporting whether it was present.
    pub fn delete(&mut self, key: &str) -> bool {
        self.generation = self.generation.wrapping_add(1);
        let removed = self.remove_entry(key);
        self.stats.set_total_entries(self.entries.len());
        removed
    }

    // == Clear ==
    /// Drops every entry and returns how many there were.
    pub fn clear(&mut self) -> usize {
        let count = self.entries.len();
        self.generation = self.generation.wrapping_add(1);
        self.entries.clear();
        self.fifo.clear();
        self.stats.set_total_entries(0);
        count
    }

    // == Cleanup Expired ==
    /// Removes all expired entries from the cache.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let expired_keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();

        let count = expired_keys.len();

        for key in expired_keys {
            self.remove_entry(&key);
            self.stats.record_expiration();
        }

        self.stats.set_total_entries(self.entries.len());
        count
    }

    /// Remaining lifetime of a live entry.
    pub fn ttl_remaining(&self, key: &str) -> Option<Duration> {
        self.entries
            .get(key)
            .filter(|entry| !entry.is_expired())
            .map(CacheEntry::ttl_remaining)
    }

    /// True if an entry is held for `key`, expired or not.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Held keys from oldest to newest insertion.
    pub fn keys(&self) -> Vec<String> {
        self.fifo.iter().cloned().collect()
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    /// Counter access for the read-through layer.
    pub(crate) fn stats_mut(&mut self) -> &mut CacheStats {
        &mut self.stats
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn remove_entry(&mut self, key: &str) -> bool {
        if self.entries.remove(key).is_some() {
            self.fifo.remove(key);
            self.stats.set_total_entries(self.entries.len());
            true
        } else {
            false
        }
    }
}
