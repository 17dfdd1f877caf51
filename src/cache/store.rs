//! TTL key/value store backing the response cache.
//!
//! Entries carry an absolute expiry deadline and are reaped lazily: an
//! expired entry behaves as a miss on read and is dropped in passing. The
//! table itself is LRU-bounded so a burst of distinct queries cannot grow
//! process memory without bound.

use std::sync::RwLock;
use std::time::Duration;

use bytes::Bytes;
use lru::LruCache;
use metrics::counter;
use thiserror::Error;
use tokio::time::Instant;
use uuid::Uuid;

use super::config::CacheConfig;
use super::keys::{Namespace, namespace_pattern};
use super::lock::{read_or_recover, write_or_recover};

const METRIC_CACHE_HIT: &str = "folio_cache_hit_total";
const METRIC_CACHE_MISS: &str = "folio_cache_miss_total";
const METRIC_CACHE_EXPIRED: &str = "folio_cache_expired_total";
const METRIC_CACHE_EVICT: &str = "folio_cache_evict_total";

/// Failures internal to the cache layer.
///
/// These are never surfaced to a request: read paths degrade to a miss and
/// write paths log and move on. The type exists so call sites discard the
/// failure explicitly instead of the cache swallowing it silently.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("invalid invalidation pattern `{0}`: expected a trailing `*` on a prefix")]
    InvalidPattern(String),
    #[error("cache codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

struct CacheEntry {
    value: Bytes,
    expires_at: Instant,
}

/// Process-wide TTL cache keyed by `kind:owner:query` strings.
pub struct CacheStore {
    entries: RwLock<LruCache<String, CacheEntry>>,
}

impl CacheStore {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            entries: RwLock::new(LruCache::new(config.max_entries_non_zero())),
        }
    }

    /// Look up a key, treating absent and expired entries identically.
    pub fn get(&self, key: &str) -> Option<Bytes> {
        let mut entries = write_or_recover(&self.entries, "get");
        match entries.get(key) {
            Some(entry) if Instant::now() < entry.expires_at => {
                counter!(METRIC_CACHE_HIT).increment(1);
                return Some(entry.value.clone());
            }
            Some(_) => {}
            None => {
                counter!(METRIC_CACHE_MISS).increment(1);
                return None;
            }
        }

        // Expired: reap in passing and report a miss.
        entries.pop(key);
        counter!(METRIC_CACHE_EXPIRED).increment(1);
        counter!(METRIC_CACHE_MISS).increment(1);
        None
    }

    /// Insert or overwrite unconditionally. Overwriting a live entry resets
    /// its deadline; there is no error path.
    pub fn set(&self, key: impl Into<String>, value: Bytes, ttl: Duration) {
        let key = key.into();
        let entry = CacheEntry {
            value,
            expires_at: Instant::now() + ttl,
        };
        let mut entries = write_or_recover(&self.entries, "set");
        if let Some((evicted_key, _)) = entries.push(key.clone(), entry) {
            if evicted_key != key {
                counter!(METRIC_CACHE_EVICT).increment(1);
            }
        }
    }

    /// Remove a single key. Idempotent.
    pub fn delete(&self, key: &str) -> bool {
        write_or_recover(&self.entries, "delete").pop(key).is_some()
    }

    /// Remove every key matching a trailing-wildcard prefix pattern, e.g.
    /// `notifications:42:*`. Returns how many entries were removed; matching
    /// nothing is not an error.
    pub fn delete_pattern(&self, pattern: &str) -> Result<usize, CacheError> {
        let prefix = pattern
            .strip_suffix('*')
            .ok_or_else(|| CacheError::InvalidPattern(pattern.to_string()))?;
        if prefix.contains('*') {
            return Err(CacheError::InvalidPattern(pattern.to_string()));
        }

        let mut entries = write_or_recover(&self.entries, "delete_pattern");
        let matching: Vec<String> = entries
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &matching {
            entries.pop(key);
        }
        Ok(matching.len())
    }

    /// Sweep every namespace this process caches for one user.
    pub fn invalidate_user(&self, user_id: Uuid) -> usize {
        let mut removed = 0;
        for namespace in Namespace::ALL {
            // Patterns built here always carry the wildcard, so the error arm
            // is unreachable; stay on the fallible API anyway.
            if let Ok(count) = self.delete_pattern(&namespace_pattern(namespace, user_id)) {
                removed += count;
            }
        }
        removed
    }

    pub fn clear(&self) {
        write_or_recover(&self.entries, "clear").clear();
    }

    pub fn len(&self) -> usize {
        read_or_recover(&self.entries, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{AssertUnwindSafe, catch_unwind};

    use super::*;

    fn store() -> CacheStore {
        CacheStore::new(&CacheConfig::default())
    }

    fn bytes(text: &str) -> Bytes {
        Bytes::copy_from_slice(text.as_bytes())
    }

    #[tokio::test(start_paused = true)]
    async fn set_then_get_within_ttl() {
        let store = store();
        store.set("portfolio:42", bytes(r#"{"title":"X"}"#), Duration::from_secs(5));
        assert_eq!(store.get("portfolio:42"), Some(bytes(r#"{"title":"X"}"#)));
    }

    #[tokio::test(start_paused = true)]
    async fn entry_expires_after_ttl() {
        let store = store();
        store.set("portfolio:42", bytes(r#"{"title":"X"}"#), Duration::from_secs(5));

        tokio::time::advance(Duration::from_secs(6)).await;
        assert_eq!(store.get("portfolio:42"), None);
        // The expired entry was reaped in passing.
        assert!(store.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn expiry_deadline_is_inclusive() {
        let store = store();
        store.set("k", bytes("v"), Duration::from_secs(5));

        tokio::time::advance(Duration::from_secs(5)).await;
        assert_eq!(store.get("k"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn overwrite_resets_deadline() {
        let store = store();
        store.set("k", bytes("old"), Duration::from_secs(5));
        tokio::time::advance(Duration::from_secs(4)).await;
        store.set("k", bytes("new"), Duration::from_secs(5));
        tokio::time::advance(Duration::from_secs(4)).await;
        assert_eq!(store.get("k"), Some(bytes("new")));
    }

    #[test]
    fn delete_is_idempotent() {
        let store = store();
        store.set("k", bytes("v"), Duration::from_secs(5));
        assert!(store.delete("k"));
        assert!(!store.delete("k"));
    }

    #[test]
    fn pattern_delete_removes_only_matching_prefix() {
        let store = store();
        store.set("user:42:activities:a", bytes("1"), Duration::from_secs(60));
        store.set("user:42:activities:b", bytes("2"), Duration::from_secs(60));
        store.set("user:42:skills:a", bytes("3"), Duration::from_secs(60));
        store.set("user:7:activities:a", bytes("4"), Duration::from_secs(60));

        let removed = store.delete_pattern("user:42:activities:*").unwrap();
        assert_eq!(removed, 2);
        assert!(store.get("user:42:activities:a").is_none());
        assert!(store.get("user:42:activities:b").is_none());
        assert!(store.get("user:42:skills:a").is_some());
        assert!(store.get("user:7:activities:a").is_some());
    }

    #[test]
    fn pattern_delete_with_no_matches_is_ok() {
        let store = store();
        assert_eq!(store.delete_pattern("nothing:*").unwrap(), 0);
    }

    #[test]
    fn pattern_without_wildcard_is_rejected() {
        let store = store();
        assert!(matches!(
            store.delete_pattern("user:42"),
            Err(CacheError::InvalidPattern(_))
        ));
        assert!(matches!(
            store.delete_pattern("user:*:42:*"),
            Err(CacheError::InvalidPattern(_))
        ));
    }

    #[test]
    fn invalidate_user_sweeps_all_namespaces() {
        let store = store();
        let user = Uuid::new_v4();
        let other = Uuid::new_v4();
        for namespace in Namespace::ALL {
            store.set(
                format!("{}:{}:list:00", namespace.as_str(), user),
                bytes("x"),
                Duration::from_secs(60),
            );
        }
        store.set(
            format!("portfolio:{other}:list:00"),
            bytes("y"),
            Duration::from_secs(60),
        );

        let removed = store.invalidate_user(user);
        assert_eq!(removed, Namespace::ALL.len());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn lru_bound_evicts_oldest() {
        let config = CacheConfig {
            max_entries: 2,
            ..Default::default()
        };
        let store = CacheStore::new(&config);
        store.set("a", bytes("1"), Duration::from_secs(60));
        store.set("b", bytes("2"), Duration::from_secs(60));
        store.set("c", bytes("3"), Duration::from_secs(60));

        assert!(store.get("a").is_none());
        assert!(store.get("b").is_some());
        assert!(store.get("c").is_some());
    }

    #[test]
    fn store_recovers_from_poisoned_lock() {
        let store = store();
        let _ = catch_unwind(AssertUnwindSafe(|| {
            let _guard = store.entries.write().expect("entries lock");
            panic!("poison entries lock");
        }));

        store.set("k", bytes("v"), Duration::from_secs(5));
        assert!(store.get("k").is_some());
    }
}
