//! Cache-aside layer shielding upstream providers.
//!
//! Keys are derived deterministically from the request payload: canonical
//! JSON (sorted keys, no whitespace) hashed with SHA-256 and prefixed with
//! a namespace tag. Concurrent misses on one key may both invoke the
//! compute function; provider calls are idempotent reads, so the extra
//! fetch is harmless and there is no single-flight machinery.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};
use sqlx::PgPool;

use wayfinder_db::queries::stores;

/// TTL for flight candidate lookups.
pub const FLIGHTS_TTL: Duration = Duration::from_secs(30 * 60);
/// TTL for stay candidate lookups.
pub const STAYS_TTL: Duration = Duration::from_secs(30 * 60);
/// TTL for point-of-interest lookups.
pub const POI_TTL: Duration = Duration::from_secs(60 * 60);

/// String key/value store with TTL semantics.
///
/// The store is the only cross-process shared state the cache relies on;
/// writes must be atomic (set-with-ttl) but nothing else is required.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;
}

/// Derive the cache key for a request payload.
///
/// `payload` must be a `serde_json::Value`; its object keys serialize in
/// sorted order, which makes the compact encoding canonical.
pub fn cache_key(namespace: &str, payload: &serde_json::Value) -> String {
    let canonical = payload.to_string();
    let digest = Sha256::digest(canonical.as_bytes());
    format!("cache:{namespace}:{}", hex::encode(digest))
}

/// Cache-aside read: return the cached value on hit, otherwise invoke
/// `compute`, store the serialized result with `ttl`, and return it.
///
/// A cached value that no longer deserializes is treated as a miss and
/// recomputed.
pub async fn get_or_compute<T, F, Fut>(
    store: &dyn CacheStore,
    key: &str,
    ttl: Duration,
    compute: F,
) -> Result<T>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    if let Some(raw) = store.get(key).await? {
        match serde_json::from_str::<T>(&raw) {
            Ok(value) => return Ok(value),
            Err(e) => {
                tracing::warn!(key, error = %e, "discarding undecodable cache entry");
            }
        }
    }

    let value = compute().await?;
    let raw = serde_json::to_string(&value).context("failed to serialize cache value")?;
    store.put(key, &raw, ttl).await?;
    Ok(value)
}

/// Postgres-backed cache store shared by all worker instances.
#[derive(Debug, Clone)]
pub struct PgCacheStore {
    pool: PgPool,
}

impl PgCacheStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CacheStore for PgCacheStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        stores::cache_get(&self.pool, key).await
    }

    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        stores::cache_put(&self.pool, key, value, ttl.as_secs()).await
    }
}

/// In-memory cache store for tests.
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    entries: Mutex<HashMap<String, (String, Instant)>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.lock().expect("cache mutex poisoned");
        Ok(entries
            .get(key)
            .filter(|(_, expires)| *expires > Instant::now())
            .map(|(value, _)| value.clone()))
    }

    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        entries.insert(key.to_owned(), (value.to_owned(), Instant::now() + ttl));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn key_is_order_insensitive() {
        let a = json!({"origin": "SFO", "destination": "PAR", "travelers": 2});
        let b = json!({"travelers": 2, "destination": "PAR", "origin": "SFO"});
        assert_eq!(cache_key("flights", &a), cache_key("flights", &b));
    }

    #[test]
    fn key_is_namespace_prefixed() {
        let payload = json!({"destination": "PAR"});
        let flights = cache_key("flights", &payload);
        let stays = cache_key("stays", &payload);
        assert!(flights.starts_with("cache:flights:"));
        assert!(stays.starts_with("cache:stays:"));
        assert_ne!(flights, stays);
    }

    #[test]
    fn key_differs_for_different_payloads() {
        let a = cache_key("poi", &json!({"destination": "PAR"}));
        let b = cache_key("poi", &json!({"destination": "ROM"}));
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn hit_skips_compute() {
        let store = MemoryCacheStore::new();
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            let value: Vec<i32> = get_or_compute(&store, "cache:test:k", Duration::from_secs(60), || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(vec![1, 2, 3])
            })
            .await
            .unwrap();
            assert_eq!(value, vec![1, 2, 3]);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn expiry_triggers_recompute() {
        let store = MemoryCacheStore::new();
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            let _: i32 = get_or_compute(&store, "cache:test:ttl", Duration::ZERO, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(7)
            })
            .await
            .unwrap();
        }

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn undecodable_entry_is_recomputed() {
        let store = MemoryCacheStore::new();
        store
            .put("cache:test:bad", "not json", Duration::from_secs(60))
            .await
            .unwrap();

        let value: i32 = get_or_compute(&store, "cache:test:bad", Duration::from_secs(60), || async {
            Ok(42)
        })
        .await
        .unwrap();
        assert_eq!(value, 42);
    }
}
