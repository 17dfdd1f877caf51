//! Read-path cache wrapper.
//!
//! Wraps a datastore read: derive the canonical key, try the cache, fall
//! back to the loader on miss, populate with the namespace TTL. Callers get
//! the same value either way and never see a cache failure; a codec error is
//! logged and degrades to the miss path.

use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use uuid::Uuid;

use super::config::CacheConfig;
use super::keys::{Namespace, entity_key, hash_query, list_key};
use super::store::{CacheError, CacheStore};

/// Cached read access for application services.
#[derive(Clone)]
pub struct CachedReads {
    store: Arc<CacheStore>,
    config: CacheConfig,
}

impl CachedReads {
    pub fn new(store: Arc<CacheStore>, config: CacheConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &Arc<CacheStore> {
        &self.store
    }

    /// Serve an owner-scoped list read through the cache.
    ///
    /// `query` is the logical query the caller is about to run; it is
    /// canonicalized before hashing so field order never splits the key.
    pub async fn list<T, E, F, Fut>(
        &self,
        namespace: Namespace,
        owner: Uuid,
        query: &serde_json::Value,
        load: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let key = list_key(namespace, owner, hash_query(query));
        self.get_or_load(namespace, key, load).await
    }

    /// Serve a single-entity read through the cache.
    pub async fn entity<T, E, F, Fut>(
        &self,
        namespace: Namespace,
        owner: Uuid,
        id: Uuid,
        load: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let key = entity_key(namespace, owner, id);
        self.get_or_load(namespace, key, load).await
    }

    async fn get_or_load<T, E, F, Fut>(&self, namespace: Namespace, key: String, load: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if !self.config.enabled {
            return load().await;
        }

        if let Some(raw) = self.store.get(&key) {
            match decode(&raw) {
                Ok(value) => {
                    debug!(cache_key = %key, outcome = "hit", "served from cache");
                    return Ok(value);
                }
                Err(err) => {
                    // Stale shape after a deploy; drop it and fall through.
                    warn!(cache_key = %key, error = %err, "cached payload undecodable; treating as miss");
                    self.store.delete(&key);
                }
            }
        }

        let value = load().await?;

        match encode(&value) {
            Ok(bytes) => self.store.set(key, bytes, self.config.ttl_for(namespace)),
            Err(err) => {
                warn!(cache_key = %key, error = %err, "failed to encode cache payload; skipping populate");
            }
        }

        Ok(value)
    }
}

fn encode<T: Serialize>(value: &T) -> Result<Bytes, CacheError> {
    Ok(Bytes::from(serde_json::to_vec(value)?))
}

fn decode<T: DeserializeOwned>(raw: &Bytes) -> Result<T, CacheError> {
    Ok(serde_json::from_slice(raw)?)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;

    use super::*;

    fn reads() -> CachedReads {
        let config = CacheConfig::default();
        CachedReads::new(Arc::new(CacheStore::new(&config)), config)
    }

    #[tokio::test]
    async fn miss_loads_and_populates() {
        let reads = reads();
        let owner = Uuid::new_v4();
        let loads = AtomicUsize::new(0);

        let first: Result<Vec<String>, ()> = reads
            .list(Namespace::Portfolio, owner, &json!({"tag": null}), || {
                loads.fetch_add(1, Ordering::SeqCst);
                async { Ok(vec!["item".to_string()]) }
            })
            .await;
        assert_eq!(first.unwrap(), vec!["item".to_string()]);

        let second: Result<Vec<String>, ()> = reads
            .list(Namespace::Portfolio, owner, &json!({"tag": null}), || {
                loads.fetch_add(1, Ordering::SeqCst);
                async { Ok(vec!["fresh".to_string()]) }
            })
            .await;

        // Second read is a hit: the loader did not run again.
        assert_eq!(second.unwrap(), vec!["item".to_string()]);
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn loader_error_propagates_and_skips_populate() {
        let reads = reads();
        let owner = Uuid::new_v4();

        let result: Result<Vec<String>, &str> = reads
            .list(Namespace::Skills, owner, &json!({}), || async {
                Err("datastore down")
            })
            .await;
        assert_eq!(result.unwrap_err(), "datastore down");
        assert!(reads.store().is_empty());
    }

    #[tokio::test]
    async fn distinct_owners_use_distinct_keys() {
        let reads = reads();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        let _: Result<u32, ()> = reads
            .list(Namespace::Activities, a, &json!({}), || async { Ok(1) })
            .await;
        let from_b: Result<u32, ()> = reads
            .list(Namespace::Activities, b, &json!({}), || async { Ok(2) })
            .await;
        assert_eq!(from_b.unwrap(), 2);
    }

    #[tokio::test]
    async fn undecodable_entry_degrades_to_miss() {
        let config = CacheConfig::default();
        let store = Arc::new(CacheStore::new(&config));
        let reads = CachedReads::new(store.clone(), config);
        let owner = Uuid::new_v4();
        let id = Uuid::new_v4();

        store.set(
            entity_key(Namespace::Roadmaps, owner, id),
            Bytes::from_static(b"not json"),
            std::time::Duration::from_secs(60),
        );

        let value: Result<u32, ()> = reads
            .entity(Namespace::Roadmaps, owner, id, || async { Ok(9) })
            .await;
        assert_eq!(value.unwrap(), 9);
    }

    #[tokio::test]
    async fn disabled_cache_always_loads() {
        let config = CacheConfig {
            enabled: false,
            ..Default::default()
        };
        let store = Arc::new(CacheStore::new(&config));
        let reads = CachedReads::new(store.clone(), config);
        let owner = Uuid::new_v4();
        let loads = AtomicUsize::new(0);

        for _ in 0..2 {
            let _: Result<u32, ()> = reads
                .list(Namespace::Notifications, owner, &json!({}), || {
                    loads.fetch_add(1, Ordering::SeqCst);
                    async { Ok(0) }
                })
                .await;
        }
        assert_eq!(loads.load(Ordering::SeqCst), 2);
        assert!(store.is_empty());
    }
}
