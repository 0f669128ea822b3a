//! Read-through cache - a TTL-bounded FIFO cache over a remote key/value store
//!
//! [`ReadThroughCache`] serves reads from local memory and falls back to a
//! [`RemoteStore`] on miss. The `api` module is the matching store server.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod remote;
pub mod tasks;

pub use api::AppState;
pub use cache::{CacheStats, CacheStore, ReadThroughCache};
pub use config::Config;
pub use error::{CacheError, RemoteError};
pub use remote::{HttpRemoteStore, NoopRemote, RemoteStore};
pub use tasks::spawn_cleanup_task;
