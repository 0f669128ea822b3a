//! Remote Store Module
//!
//! The backing key/value store a [`crate::cache::ReadThroughCache`] reads
//! through to and writes through to.

mod http;

pub use http::HttpRemoteStore;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::RemoteResult;

/// Remote key/value store capability.
///
/// `get` answers `Ok(None)` when the store reports the key as absent.
#[async_trait]
pub trait RemoteStore: Send + Sync + 'static {
    async fn get(&self, key: &str) -> RemoteResult<Option<Value>>;

    async fn put(&self, key: &str, value: &Value, ttl_seconds: u64) -> RemoteResult<()>;

    async fn delete(&self, key: &str) -> RemoteResult<()>;

    /// Removes every key held by the remote.
    async fn clear(&self) -> RemoteResult<()>;
}

#[async_trait]
impl<T: RemoteStore + ?Sized> RemoteStore for Box<T> {
    async fn get(&self, key: &str) -> RemoteResult<Option<Value>> {
        (**self).get(key).await
    }

    async fn put(&self, key: &str, value: &Value, ttl_seconds: u64) -> RemoteResult<()> {
        (**self).put(key, value, ttl_seconds).await
    }

    async fn delete(&self, key: &str) -> RemoteResult<()> {
        (**self).delete(key).await
    }

    async fn clear(&self) -> RemoteResult<()> {
        (**self).clear().await
    }
}

/// Remote used when none is configured: reads miss, writes are acknowledged.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRemote;

#[async_trait]
impl RemoteStore for NoopRemote {
    async fn get(&self, _key: &str) -> RemoteResult<Option<Value>> {
        Ok(None)
    }

    async fn put(&self, _key: &str, _value: &Value, _ttl_seconds: u64) -> RemoteResult<()> {
        Ok(())
    }

    async fn delete(&self, _key: &str) -> RemoteResult<()> {
        Ok(())
    }

    async fn clear(&self) -> RemoteResult<()> {
        Ok(())
    }
}
