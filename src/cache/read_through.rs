//! Read-Through Cache Module
//!
//! Async cache front: local FIFO/TTL store first, remote key/value store on miss.

use std::future::Future;
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::cache::{CacheStats, CacheStore};
use crate::config::Config;
use crate::error::{CacheError, RemoteError, RemoteResult, Result};
use crate::remote::{HttpRemoteStore, NoopRemote, RemoteStore};

// == Read-Through Cache ==
/// TTL-bounded FIFO cache that falls back to a [`RemoteStore`] on miss.
///
/// Local state is authoritative and immediately consistent: every public
/// operation finishes its local mutation before returning. Remote writes
/// (`set`, `delete`, `clear`) run as detached tasks and are eventually
/// consistent, best effort; their failures are logged and counted in
/// [`CacheStats::remote_failures`], never returned. Two remote writes for the
/// same key may complete in either order.
///
/// Every remote call is bounded by the configured timeout. Must be used from
/// inside a tokio runtime.
pub struct ReadThroughCache<R: RemoteStore> {
    local: Arc<Mutex<CacheStore>>,
    remote: Arc<R>,
    remote_timeout: Duration,
    pending: StdMutex<JoinSet<()>>,
}

impl ReadThroughCache<Box<dyn RemoteStore>> {
    /// Builds a cache from configuration, talking HTTP when
    /// `remote_base_url` is set and running offline otherwise.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        let http = HttpRemoteStore::from_config(config)
            .map_err(|e| CacheError::InvalidConfig(e.to_string()))?;
        let remote: Box<dyn RemoteStore> = match http {
            Some(http) => Box::new(http),
            None => Box::new(NoopRemote),
        };
        Ok(Self::new(remote, config))
    }
}

impl<R: RemoteStore> ReadThroughCache<R> {
    // == Constructor ==
    /// Creates a cache with capacity and TTL taken from `config`.
    pub fn new(remote: R, config: &Config) -> Self {
        Self::with_store(
            remote,
            CacheStore::new(config.max_entries, config.default_ttl),
            config.remote_timeout(),
        )
    }

    /// Creates a cache around an existing local store.
    pub fn with_store(remote: R, store: CacheStore, remote_timeout: Duration) -> Self {
        Self {
            local: Arc::new(Mutex::new(store)),
            remote: Arc::new(remote),
            remote_timeout,
            pending: StdMutex::new(JoinSet::new()),
        }
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    // == Get ==
    /// Returns the live local value, or reads through to the remote.
    ///
    /// A remote hit is stored locally with the default TTL. Remote failures
    /// of any kind produce `None`.
    pub async fn get(&self, key: &str) -> Option<Value> {
        let (cached, generation) = {
            let mut local = self.local.lock().await;
            (local.get(key), local.generation())
        };
        if cached.is_some() {
            debug!(key, "local cache hit");
            return cached;
        }

        match bounded(self.remote_timeout, self.remote.get(key)).await {
            Ok(Some(value)) => {
                let mut local = self.local.lock().await;
                // A `set` that landed while the fetch was in flight wins
                if local.ttl_remaining(key).is_some() {
                    return local.get(key);
                }
                // A `delete` or `clear` ran meanwhile; the fetched value may be stale
                if local.generation() != generation {
                    debug!(key, "skipped read-through fill after concurrent removal");
                    return Some(value);
                }
                if let Some(evicted) = local.set(key.to_string(), value.clone(), None) {
                    debug!(key, evicted = %evicted, "read-through fill evicted oldest entry");
                }
                local.stats_mut().record_remote_fill();
                debug!(key, "filled from remote store");
                Some(value)
            }
            Ok(None) => {
                debug!(key, "remote store miss");
                None
            }
            Err(error) => {
                warn!(key, %error, "cache read-through failed");
                self.local.lock().await.stats_mut().record_remote_failure();
                None
            }
        }
    }

    /// Typed [`get`](Self::get); a value that does not deserialize into `T`
    /// is treated as a miss.
    pub async fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.get(key).await?;
        match serde_json::from_value(value) {
            Ok(typed) => Some(typed),
            Err(error) => {
                warn!(key, %error, "cached value has unexpected shape");
                None
            }
        }
    }

    // == Set ==
    /// Stores a value locally, then writes it through to the remote.
    ///
    /// `ttl` of `None` or `Some(0)` uses the default TTL.
    pub async fn set(&self, key: impl Into<String>, value: Value, ttl: Option<u64>) {
        let key = key.into();
        let ttl = {
            let mut local = self.local.lock().await;
            let ttl = local.effective_ttl(ttl);
            if let Some(evicted) = local.set(key.clone(), value.clone(), Some(ttl)) {
                debug!(key = %key, evicted = %evicted, "evicted oldest entry");
            }
            ttl
        };

        let remote = Arc::clone(&self.remote);
        let label = key.clone();
        self.spawn_remote("put", label, async move { remote.put(&key, &value, ttl).await });
    }

    // == Delete ==
    /// Removes the local entry if present, then deletes it remotely.
    pub async fn delete(&self, key: &str) {
        let removed = self.local.lock().await.delete(key);
        debug!(key, removed, "deleted local entry");

        let remote = Arc::clone(&self.remote);
        let key = key.to_string();
        let label = key.clone();
        self.spawn_remote("delete", label, async move { remote.delete(&key).await });
    }

    // == Clear ==
    /// Empties local state, then clears the remote.
    pub async fn clear(&self) {
        let removed = self.local.lock().await.clear();
        debug!(removed, "cleared local cache");

        let remote = Arc::clone(&self.remote);
        self.spawn_remote("clear", "*".to_string(), async move { remote.clear().await });
    }

    // == Flush ==
    /// Waits for every remote write issued so far.
    pub async fn flush(&self) {
        let mut pending = {
            let mut guard = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::take(&mut *guard)
        };
        while let Some(result) = pending.join_next().await {
            if let Err(error) = result {
                warn!(%error, "remote write task did not complete");
            }
        }
    }

    /// Number of remote writes not yet reaped.
    pub fn pending_writes(&self) -> usize {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub async fn len(&self) -> usize {
        self.local.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.local.lock().await.is_empty()
    }

    /// Locally held keys, oldest first.
    pub async fn keys(&self) -> Vec<String> {
        self.local.lock().await.keys()
    }

    pub async fn stats(&self) -> CacheStats {
        self.local.lock().await.stats()
    }

    fn spawn_remote<F>(&self, op: &'static str, key: String, call: F)
    where
        F: Future<Output = RemoteResult<()>> + Send + 'static,
    {
        let local = Arc::clone(&self.local);
        let limit = self.remote_timeout;
        let task = async move {
            match bounded(limit, call).await {
                Ok(()) => debug!(op, key = %key, "remote write acknowledged"),
                Err(error) => {
                    warn!(op, key = %key, %error, "remote write failed");
                    local.lock().await.stats_mut().record_remote_failure();
                }
            }
        };

        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        while let Some(result) = pending.try_join_next() {
            if let Err(error) = result {
                warn!(%error, "remote write task did not complete");
            }
        }
        pending.spawn(task);
    }
}

impl<R: RemoteStore> Drop for ReadThroughCache<R> {
    fn drop(&mut self) {
        // Unflushed writes keep running after the cache is gone
        self.pending
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .detach_all();
    }
}

async fn bounded<T, F>(limit: Duration, call: F) -> RemoteResult<T>
where
    F: Future<Output = RemoteResult<T>>,
{
    tokio::time::timeout(limit, call)
        .await
        .map_err(|_| RemoteError::Timeout(limit))?
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde::Deserialize;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// In-process remote that records every call.
    #[derive(Default)]
    struct ScriptedRemote {
        values: StdMutex<HashMap<String, Value>>,
        calls: StdMutex<Vec<String>>,
        failing: AtomicBool,
        delay: Option<Duration>,
    }

    impl ScriptedRemote {
        fn with_values(values: &[(&str, Value)]) -> Self {
            let remote = Self::default();
            for (key, value) in values {
                remote.values.lock().unwrap().insert(key.to_string(), value.clone());
            }
            remote
        }

        fn failing() -> Self {
            let remote = Self::default();
            remote.failing.store(true, Ordering::SeqCst);
            remote
        }

        fn slow(delay: Duration) -> Self {
            Self {
                delay: Some(delay),
                ..Self::default()
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn holds(&self, key: &str) -> bool {
            self.values.lock().unwrap().contains_key(key)
        }

        async fn enter(&self, call: String) -> RemoteResult<()> {
            self.calls.lock().unwrap().push(call);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.failing.load(Ordering::SeqCst) {
                return Err(RemoteError::Status {
                    status: 503,
                    body: "unavailable".to_string(),
                });
            }
            Ok(())
        }
    }

    #[async_trait]
    impl RemoteStore for ScriptedRemote {
        async fn get(&self, key: &str) -> RemoteResult<Option<Value>> {
            self.enter(format!("get:{key}")).await?;
            Ok(self.values.lock().unwrap().get(key).cloned())
        }

        async fn put(&self, key: &str, value: &Value, ttl_seconds: u64) -> RemoteResult<()> {
            self.enter(format!("put:{key}:{ttl_seconds}")).await?;
            self.values.lock().unwrap().insert(key.to_string(), value.clone());
            Ok(())
        }

        async fn delete(&self, key: &str) -> RemoteResult<()> {
            self.enter(format!("delete:{key}")).await?;
            self.values.lock().unwrap().remove(key);
            Ok(())
        }

        async fn clear(&self) -> RemoteResult<()> {
            self.enter("clear".to_string()).await?;
            self.values.lock().unwrap().clear();
            Ok(())
        }
    }

    fn cache_with(remote: ScriptedRemote, max_entries: usize, ttl: u64) -> ReadThroughCache<ScriptedRemote> {
        let config = Config {
            max_entries,
            default_ttl: ttl,
            remote_timeout_ms: 1_000,
            ..Config::default()
        };
        ReadThroughCache::new(remote, &config)
    }

    #[tokio::test(start_paused = true)]
    async fn test_ttl_expiry_with_unreachable_remote() {
        let cache = cache_with(ScriptedRemote::failing(), 10, 300);

        cache.set("k", json!("v"), Some(1)).await;
        assert_eq!(cache.get("k").await, Some(json!("v")));

        tokio::time::advance(Duration::from_millis(1100)).await;

        assert_eq!(cache.get("k").await, None);
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn test_capacity_scenario_evicts_first_inserted() {
        let cache = cache_with(ScriptedRemote::failing(), 2, 100);

        cache.set("a", json!(1), None).await;
        cache.set("b", json!(2), None).await;
        cache.set("c", json!(3), None).await;

        assert_eq!(cache.keys().await, ["b", "c"]);
        assert_eq!(cache.get("a").await, None);
        assert!(cache.remote().calls().contains(&"get:a".to_string()));
        assert_eq!(cache.get("b").await, Some(json!(2)));
        assert_eq!(cache.get("c").await, Some(json!(3)));
    }

    #[tokio::test]
    async fn test_evicted_key_is_read_back_from_remote() {
        let cache = cache_with(ScriptedRemote::default(), 2, 100);

        cache.set("a", json!(1), None).await;
        cache.set("b", json!(2), None).await;
        cache.set("c", json!(3), None).await;
        cache.flush().await;

        assert_eq!(cache.get("a").await, Some(json!(1)));
        // The refill pushed "b" out
        assert_eq!(cache.keys().await, ["c", "a"]);
    }

    #[tokio::test]
    async fn test_read_through_populates_local_state() {
        let remote = ScriptedRemote::with_values(&[("user:7", json!({"name": "lee"}))]);
        let cache = cache_with(remote, 10, 100);

        assert_eq!(cache.get("user:7").await, Some(json!({"name": "lee"})));

        // No further remote reads may succeed
        cache.remote().failing.store(true, Ordering::SeqCst);
        assert_eq!(cache.get("user:7").await, Some(json!({"name": "lee"})));

        let gets = cache
            .remote()
            .calls()
            .iter()
            .filter(|c| c.starts_with("get:"))
            .count();
        assert_eq!(gets, 1);
        let stats = cache.stats().await;
        assert_eq!(stats.remote_fills, 1);
        assert_eq!(stats.hits, 1);
    }

    #[tokio::test]
    async fn test_read_through_fill_is_not_written_back() {
        let remote = ScriptedRemote::with_values(&[("k", json!(1))]);
        let cache = cache_with(remote, 10, 100);

        cache.get("k").await;
        cache.flush().await;

        assert_eq!(cache.remote().calls(), ["get:k"]);
    }

    #[tokio::test]
    async fn test_remote_failure_on_read_is_a_miss() {
        let cache = cache_with(ScriptedRemote::failing(), 10, 100);

        assert_eq!(cache.get("anything").await, None);
        assert_eq!(cache.stats().await.remote_failures, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_remote_timeout_on_read_is_a_miss() {
        let cache = cache_with(ScriptedRemote::slow(Duration::from_secs(30)), 10, 100);

        let started = tokio::time::Instant::now();
        assert_eq!(cache.get("slow").await, None);
        assert!(started.elapsed() < Duration::from_secs(30));
        assert_eq!(cache.stats().await.remote_failures, 1);
    }

    async fn wait_for_remote_get(cache: &ReadThroughCache<ScriptedRemote>) {
        while !cache.remote().calls().iter().any(|c| c.starts_with("get:")) {
            tokio::task::yield_now().await;
        }
    }

    fn slow_remote_holding(key: &str, value: Value) -> ScriptedRemote {
        ScriptedRemote {
            delay: Some(Duration::from_millis(500)),
            ..ScriptedRemote::with_values(&[(key, value)])
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_during_read_through_is_not_undone() {
        let cache = Arc::new(cache_with(slow_remote_holding("k", json!(1)), 10, 100));

        let reader = {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move { cache.get("k").await })
        };
        wait_for_remote_get(&cache).await;

        cache.delete("k").await;
        reader.await.unwrap();
        cache.flush().await;

        assert!(cache.keys().await.is_empty());
        assert_eq!(cache.stats().await.remote_fills, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_during_read_through_is_not_undone() {
        let cache = Arc::new(cache_with(slow_remote_holding("k", json!(1)), 10, 100));

        let reader = {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move { cache.get("k").await })
        };
        wait_for_remote_get(&cache).await;

        cache.clear().await;
        reader.await.unwrap();
        cache.flush().await;

        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_delete_absent_key_is_noop() {
        let cache = cache_with(ScriptedRemote::default(), 10, 100);

        cache.delete("ghost").await;
        cache.flush().await;

        assert_eq!(cache.get("ghost").await, None);
        assert!(cache.remote().calls().contains(&"delete:ghost".to_string()));
    }

    #[tokio::test]
    async fn test_delete_removes_locally_and_remotely() {
        let cache = cache_with(ScriptedRemote::default(), 10, 100);

        cache.set("k", json!(1), None).await;
        cache.delete("k").await;
        cache.flush().await;

        assert!(!cache.remote().holds("k"));
        assert_eq!(cache.get("k").await, None);
    }

    #[tokio::test]
    async fn test_clear_empties_local_and_remote() {
        let cache = cache_with(ScriptedRemote::default(), 10, 100);

        cache.set("a", json!(1), None).await;
        cache.set("b", json!(2), None).await;
        cache.clear().await;
        cache.flush().await;

        assert!(cache.is_empty().await);
        assert_eq!(cache.get("a").await, None);
        assert_eq!(cache.get("b").await, None);
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn test_set_writes_through_with_effective_ttl() {
        let cache = cache_with(ScriptedRemote::default(), 10, 300);

        cache.set("a", json!(1), None).await;
        cache.set("b", json!(2), Some(60)).await;
        cache.set("c", json!(3), Some(0)).await;
        cache.flush().await;

        let mut calls = cache.remote().calls();
        calls.sort();
        assert_eq!(calls, ["put:a:300", "put:b:60", "put:c:300"]);
        assert_eq!(cache.pending_writes(), 0);
    }

    #[tokio::test]
    async fn test_failed_write_through_keeps_local_value() {
        let cache = cache_with(ScriptedRemote::failing(), 10, 300);

        cache.set("k", json!("local"), None).await;
        cache.flush().await;

        assert_eq!(cache.get("k").await, Some(json!("local")));
        assert_eq!(cache.stats().await.remote_failures, 1);
    }

    #[tokio::test]
    async fn test_overwrite_moves_key_to_newest() {
        let cache = cache_with(ScriptedRemote::failing(), 2, 100);

        cache.set("a", json!(1), None).await;
        cache.set("b", json!(2), None).await;
        cache.set("a", json!(10), None).await;
        cache.set("c", json!(3), None).await;

        assert_eq!(cache.keys().await, ["a", "c"]);
        assert_eq!(cache.get("a").await, Some(json!(10)));
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct User {
        id: u64,
        name: String,
    }

    #[tokio::test]
    async fn test_get_as_typed_value() {
        let cache = cache_with(ScriptedRemote::failing(), 10, 100);

        cache.set("user:1", json!({"id": 1, "name": "park"}), None).await;
        cache.set("broken", json!("not a user"), None).await;

        let user: Option<User> = cache.get_as("user:1").await;
        assert_eq!(
            user,
            Some(User {
                id: 1,
                name: "park".to_string()
            })
        );
        assert_eq!(cache.get_as::<User>("broken").await, None);
    }

    #[tokio::test]
    async fn test_concurrent_sets_respect_capacity() {
        let cache = Arc::new(cache_with(ScriptedRemote::default(), 8, 100));

        let mut handles = Vec::new();
        for i in 0..64 {
            let cache = Arc::clone(&cache);
            handles.push(tokio::spawn(async move {
                cache.set(format!("key{i}"), json!(i), None).await;
                assert!(cache.len().await <= 8);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        cache.flush().await;

        assert_eq!(cache.len().await, 8);
        assert_eq!(cache.stats().await.evictions, 56);
    }

    #[tokio::test]
    async fn test_from_config_offline() {
        let cache = ReadThroughCache::from_config(&Config::default()).unwrap();

        cache.set("k", json!(true), None).await;
        assert_eq!(cache.get("k").await, Some(json!(true)));
        assert_eq!(cache.get("missing").await, None);
        cache.flush().await;
        assert_eq!(cache.stats().await.remote_failures, 0);
    }

    #[test]
    fn test_from_config_rejects_invalid_config() {
        let config = Config {
            max_entries: 0,
            ..Config::default()
        };
        assert!(ReadThroughCache::from_config(&config).is_err());
    }
}
