//! Cache Module
//!
//! Provides in-memory caching with TTL expiration, FIFO eviction and
//! read-through to a remote key/value store.

mod entry;
mod fifo;
mod read_through;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use fifo::FifoQueue;
pub use read_through::ReadThroughCache;
pub use stats::CacheStats;
pub use store::CacheStore;

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;
