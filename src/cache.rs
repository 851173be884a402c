//! Response caching with per-entry TTL.
//!
//! The backing store is swappable behind [`CacheStore`]; the in-process
//! implementation here suffices for a single gateway instance, an external
//! shared store can implement the same trait. Store failures fail open: a
//! get error is a miss, a set error is dropped with a warning.

use crate::types::OperationKind;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Namespace prefix for every cache key.
pub const CACHE_KEY_PREFIX: &str = "llm_gateway:";

#[derive(Debug, Error)]
#[error("cache store error: {reason}")]
pub struct CacheStoreError {
    reason: String,
}

impl CacheStoreError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Key/value store with per-entry TTL.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Fetch a value. Absent and expired entries are both misses.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheStoreError>;

    /// Store a value with expiry = now + ttl, overwriting unconditionally.
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheStoreError>;
}

struct Entry {
    value: String,
    expires_at: Instant,
}

/// In-process cache store. Expired entries behave as absent and are purged
/// lazily on the read that finds them.
#[derive(Default)]
pub struct MemoryCacheStore {
    entries: RwLock<HashMap<String, Entry>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheStoreError> {
        let now = Instant::now();
        {
            let entries = self.entries.read();
            match entries.get(key) {
                None => return Ok(None),
                Some(entry) if entry.expires_at > now => return Ok(Some(entry.value.clone())),
                Some(_) => {}
            }
        }
        // Lazy purge; re-check under the write lock in case of a concurrent
        // overwrite with a fresh expiry.
        let mut entries = self.entries.write();
        if let Some(entry) = entries.get(key) {
            if entry.expires_at > now {
                return Ok(Some(entry.value.clone()));
            }
            entries.remove(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheStoreError> {
        let entry = Entry {
            value,
            expires_at: Instant::now() + ttl,
        };
        self.entries.write().insert(key.to_string(), entry);
        Ok(())
    }
}

/// Cache layer consulted by the route handlers around provider dispatch.
#[derive(Clone)]
pub struct ResponseCache {
    store: Arc<dyn CacheStore>,
    default_ttl: Duration,
}

impl ResponseCache {
    pub fn new(store: Arc<dyn CacheStore>, default_ttl: Duration) -> Self {
        Self { store, default_ttl }
    }

    pub fn in_memory(default_ttl: Duration) -> Self {
        Self::new(Arc::new(MemoryCacheStore::new()), default_ttl)
    }

    /// Deterministic key over the normalized request payload, model, and
    /// operation kind. serde_json orders map keys, so serialization of the
    /// payload is canonical.
    pub fn key(kind: OperationKind, model: &str, payload: &Value) -> String {
        let mut hasher = Sha256::new();
        hasher.update(model.as_bytes());
        hasher.update([0u8]);
        hasher.update(payload.to_string().as_bytes());
        let digest = hasher.finalize();
        format!("{CACHE_KEY_PREFIX}{}:{digest:x}", kind.as_str())
    }

    /// Fetch a cached value; store errors are misses.
    pub async fn get(&self, key: &str) -> Option<String> {
        match self.store.get(key).await {
            Ok(hit) => hit,
            Err(error) => {
                warn!(%error, "Cache read failed, treating as miss");
                None
            }
        }
    }

    /// Store a value; store errors are dropped.
    pub async fn set(&self, key: &str, value: String, ttl: Option<Duration>) {
        let ttl = ttl.unwrap_or(self.default_ttl);
        if let Err(error) = self.store.set(key, value, ttl).await {
            warn!(%error, "Cache write failed, continuing without caching");
        } else {
            debug!(key, "Cached response");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keys_are_deterministic_and_namespaced() {
        let payload = json!({"model": "llama2", "messages": []});
        let a = ResponseCache::key(OperationKind::Chat, "llama2", &payload);
        let b = ResponseCache::key(OperationKind::Chat, "llama2", &payload);
        assert_eq!(a, b);
        assert!(a.starts_with("llm_gateway:chat:"));
    }

    #[test]
    fn keys_differ_by_operation_model_and_payload() {
        let payload = json!({"input": ["a"]});
        let chat = ResponseCache::key(OperationKind::Chat, "llama2", &payload);
        let embedding = ResponseCache::key(OperationKind::Embedding, "llama2", &payload);
        let other_model = ResponseCache::key(OperationKind::Chat, "mistral", &payload);
        let other_payload = ResponseCache::key(OperationKind::Chat, "llama2", &json!({"input": ["b"]}));
        assert_ne!(chat, embedding);
        assert_ne!(chat, other_model);
        assert_ne!(chat, other_payload);
    }

    #[tokio::test(start_paused = true)]
    async fn set_then_get_returns_value_until_ttl_elapses() {
        let store = MemoryCacheStore::new();
        store
            .set("k", "v".to_string(), Duration::from_secs(60))
            .await
            .expect("set");

        assert_eq!(store.get("k").await.expect("get"), Some("v".to_string()));

        tokio::time::advance(Duration::from_secs(61)).await;
        assert_eq!(store.get("k").await.expect("get"), None);
        // Lazily purged on the expired read.
        assert!(store.entries.read().is_empty());
    }

    struct FailingStore;

    #[async_trait]
    impl CacheStore for FailingStore {
        async fn get(&self, _key: &str) -> Result<Option<String>, CacheStoreError> {
            Err(CacheStoreError::new("store offline"))
        }

        async fn set(&self, _key: &str, _value: String, _ttl: Duration) -> Result<(), CacheStoreError> {
            Err(CacheStoreError::new("store offline"))
        }
    }

    #[tokio::test]
    async fn store_errors_fail_open() {
        let cache = ResponseCache::new(Arc::new(FailingStore), Duration::from_secs(60));
        // A read error is a miss; a write error is dropped.
        assert_eq!(cache.get("k").await, None);
        cache.set("k", "v".to_string(), None).await;
    }

    #[tokio::test(start_paused = true)]
    async fn set_overwrites_unconditionally() {
        let store = MemoryCacheStore::new();
        store
            .set("k", "old".to_string(), Duration::from_secs(60))
            .await
            .expect("set");
        store
            .set("k", "new".to_string(), Duration::from_secs(60))
            .await
            .expect("set");
        assert_eq!(store.get("k").await.expect("get"), Some("new".to_string()));
    }
}
