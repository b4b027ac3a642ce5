//! The `CacheStore` trait plus the in-memory and no-op implementations.

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Error from a cache store operation.
///
/// Callers log these and carry on — a cache error is semantically a miss,
/// never a request failure.
#[derive(Debug, thiserror::Error)]
#[error("cache store error: {0}")]
pub struct CacheError(pub String);

/// Key/value store with per-entry TTL.
///
/// Keys are namespaced by domain prefix (`ai:cache:…`, `nutrition:…`) so
/// that [`delete_by_prefix`](CacheStore::delete_by_prefix) can clear one
/// domain without touching the others. Safe for concurrent access to
/// independent keys; concurrent writers to the same key are last-writer-wins.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Look up a key. `Ok(None)` is a miss; expired entries are misses.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Store a value under `key` for `ttl`, overwriting any existing entry.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;

    /// Delete every key starting with `prefix`; returns how many were removed.
    async fn delete_by_prefix(&self, prefix: &str) -> Result<u64, CacheError>;
}

// ─────────────────────────────────────────────
// NoopCache
// ─────────────────────────────────────────────

/// The "no cache configured" deployment mode: every read misses, every
/// write succeeds and is discarded.
pub struct NoopCache;

#[async_trait]
impl CacheStore for NoopCache {
    async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<(), CacheError> {
        Ok(())
    }

    async fn delete_by_prefix(&self, _prefix: &str) -> Result<u64, CacheError> {
        Ok(0)
    }
}

// ─────────────────────────────────────────────
// MemoryCache
// ─────────────────────────────────────────────

/// In-process cache with per-entry deadlines.
///
/// Used by tests and by single-instance deployments that want warm lookups
/// without a Redis. Expired entries are dropped lazily on read.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, MemoryEntry>>,
}

struct MemoryEntry {
    value: String,
    expires_at: Instant,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut entries = self.entries.lock().await;
        entries.insert(
            key.to_string(),
            MemoryEntry {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn delete_by_prefix(&self, prefix: &str) -> Result<u64, CacheError> {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        Ok((before - entries.len()) as u64)
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_set_get() {
        let cache = MemoryCache::new();
        cache
            .set("nutrition:global:apple:100", "{}", Duration::from_secs(60))
            .await
            .unwrap();

        let value = cache.get("nutrition:global:apple:100").await.unwrap();
        assert_eq!(value.as_deref(), Some("{}"));
    }

    #[tokio::test]
    async fn test_memory_miss() {
        let cache = MemoryCache::new();
        assert!(cache.get("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_memory_expiry() {
        let cache = MemoryCache::new();
        cache
            .set("k", "v", Duration::from_millis(20))
            .await
            .unwrap();
        assert!(cache.get("k").await.unwrap().is_some());

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(cache.get("k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_memory_overwrite_refreshes_value() {
        let cache = MemoryCache::new();
        cache.set("k", "old", Duration::from_secs(60)).await.unwrap();
        cache.set("k", "new", Duration::from_secs(60)).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap().as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn test_memory_delete_by_prefix_is_selective() {
        let cache = MemoryCache::new();
        cache.set("ai:cache:chat_response:1", "a", Duration::from_secs(60)).await.unwrap();
        cache.set("ai:cache:complex_query:2", "b", Duration::from_secs(60)).await.unwrap();
        cache.set("nutrition:global:apple:100", "c", Duration::from_secs(60)).await.unwrap();

        let deleted = cache.delete_by_prefix("ai:cache:").await.unwrap();
        assert_eq!(deleted, 2);

        assert!(cache.get("ai:cache:chat_response:1").await.unwrap().is_none());
        assert!(cache.get("nutrition:global:apple:100").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_noop_always_misses() {
        let cache = NoopCache;
        cache.set("k", "v", Duration::from_secs(60)).await.unwrap();
        assert!(cache.get("k").await.unwrap().is_none());
        assert_eq!(cache.delete_by_prefix("k").await.unwrap(), 0);
    }
}
