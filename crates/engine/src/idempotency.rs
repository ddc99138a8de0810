//! Replay cache for client retries.
//!
//! Entries are keyed by `(caller, request path, idempotency key)` and evicted in
//! strict LRU order once the capacity is reached. There is no TTL: a key can
//! be replayed until enough newer keys push it out. The cache lives in this
//! process only.

use std::{
    future::Future,
    num::NonZeroUsize,
    sync::{Mutex, MutexGuard, PoisonError},
};

use lru::LruCache;
use serde::{Deserialize, Serialize};

pub const DEFAULT_IDEMPOTENCY_CAPACITY: usize = 200;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct IdempotencyKey {
    pub user_id: String,
    pub path: String,
    pub key: String,
}

impl IdempotencyKey {
    pub fn new(
        user_id: impl Into<String>,
        path: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            path: path.into(),
            key: key.into(),
        }
    }
}

/// A stored HTTP response, replayed byte for byte.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl CachedResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Whether a value came from the cache or from running the operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Replay<V> {
    Hit(V),
    Executed(V),
}

impl<V> Replay<V> {
    pub fn is_hit(&self) -> bool {
        matches!(self, Self::Hit(_))
    }

    pub fn into_inner(self) -> V {
        match self {
            Self::Hit(value) | Self::Executed(value) => value,
        }
    }
}

#[derive(Debug)]
pub struct IdempotencyCache<V> {
    entries: Mutex<LruCache<IdempotencyKey, V>>,
}

impl<V: Clone> Default for IdempotencyCache<V> {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_IDEMPOTENCY_CAPACITY)
    }
}

impl<V: Clone> IdempotencyCache<V> {
    /// A zero capacity is raised to one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<IdempotencyKey, V>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Look up and mark as most recently used.
    pub fn get(&self, key: &IdempotencyKey) -> Option<V> {
        self.lock().get(key).cloned()
    }

    pub fn put(&self, key: IdempotencyKey, value: V) {
        self.lock().put(key, value);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.lock().cap().get()
    }

    /// Return the cached value for `key`, or run `execute` and cache its
    /// result when `is_success` accepts it. The lock is not held while
    /// `execute` runs.
    pub async fn replay_or_execute<F, Fut>(
        &self,
        key: IdempotencyKey,
        is_success: impl FnOnce(&V) -> bool,
        execute: F,
    ) -> Replay<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        if let Some(hit) = self.get(&key) {
            tracing::debug!(
                user_id = %key.user_id,
                path = %key.path,
                key = %key.key,
                "idempotent replay"
            );
            return Replay::Hit(hit);
        }
        let value = execute().await;
        if is_success(&value) {
            self.put(key, value.clone());
        }
        Replay::Executed(value)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn key(k: &str) -> IdempotencyKey {
        IdempotencyKey::new("alice", "/spends", k)
    }

    #[test]
    fn evicts_least_recently_used() {
        let cache: IdempotencyCache<u32> = IdempotencyCache::with_capacity(2);
        cache.put(key("a"), 1);
        cache.put(key("b"), 2);
        assert_eq!(cache.get(&key("a")), Some(1));
        cache.put(key("c"), 3);
        assert_eq!(cache.get(&key("b")), None);
        assert_eq!(cache.get(&key("a")), Some(1));
        assert_eq!(cache.get(&key("c")), Some(3));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn same_key_on_another_path_is_distinct() {
        let cache: IdempotencyCache<u32> = IdempotencyCache::default();
        cache.put(IdempotencyKey::new("alice", "/spends", "k"), 1);
        assert_eq!(
            cache.get(&IdempotencyKey::new("alice", "/spends/transfer", "k")),
            None
        );
        assert_eq!(cache.capacity(), DEFAULT_IDEMPOTENCY_CAPACITY);
    }

    #[test]
    fn same_key_from_another_caller_is_distinct() {
        let cache: IdempotencyCache<u32> = IdempotencyCache::default();
        cache.put(IdempotencyKey::new("alice", "/spends", "k"), 1);
        assert_eq!(cache.get(&IdempotencyKey::new("bob", "/spends", "k")), None);
        assert_eq!(cache.get(&IdempotencyKey::new("alice", "/spends", "k")), Some(1));
    }

    #[tokio::test]
    async fn replays_without_running_twice() {
        let cache: IdempotencyCache<CachedResponse> = IdempotencyCache::with_capacity(4);
        let runs = AtomicUsize::new(0);
        let run = || async {
            runs.fetch_add(1, Ordering::SeqCst);
            CachedResponse {
                status: 201,
                headers: vec![("content-type".to_string(), "application/json".to_string())],
                body: b"{\"id\":1}".to_vec(),
            }
        };
        let first = cache
            .replay_or_execute(key("k1"), CachedResponse::is_success, run)
            .await;
        let second = cache
            .replay_or_execute(key("k1"), CachedResponse::is_success, run)
            .await;
        assert!(!first.is_hit());
        assert!(second.is_hit());
        assert_eq!(first.into_inner(), second.into_inner());
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let cache: IdempotencyCache<CachedResponse> = IdempotencyCache::with_capacity(4);
        let failed = cache
            .replay_or_execute(key("k2"), CachedResponse::is_success, || async {
                CachedResponse {
                    status: 422,
                    headers: Vec::new(),
                    body: Vec::new(),
                }
            })
            .await;
        assert!(!failed.is_hit());
        assert!(cache.is_empty());
    }
}
