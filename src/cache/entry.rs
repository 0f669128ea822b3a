//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::Duration;

use serde_json::Value;
use tokio::time::Instant;

/// Longest lifetime an entry can have; larger TTLs are clamped to it.
pub const MAX_TTL: Duration = Duration::from_secs(86_400 * 365 * 30);

// == Cache Entry ==
/// A single cached value with its absolute expiry.
///
/// Times come from `tokio::time::Instant` so tests can pause and advance the clock.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The stored value
    pub value: Value,
    /// Creation instant
    pub created_at: Instant,
    /// Expiration instant (creation + TTL)
    pub expires_at: Instant,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new cache entry that lives for `ttl_seconds`, at most [`MAX_TTL`].
    pub fn new(value: Value, ttl_seconds: u64) -> Self {
        let now = Instant::now();
        let ttl = Duration::from_secs(ttl_seconds).min(MAX_TTL);
        Self {
            value,
            created_at: now,
            expires_at: now + ttl,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is live only while `now < expires_at`; at the expiry instant
    /// itself it is already expired.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    /// Expiry check against an explicit instant.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.expires_at
    }

    // == Time To Live ==
    /// Returns the remaining lifetime, zero once expired.
    pub fn ttl_remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }
}
