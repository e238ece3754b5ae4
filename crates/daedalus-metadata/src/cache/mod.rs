//! Metadata caching.
//!
//! Every factory chain can be wrapped by a cached decorator. A decorator looks
//! in two layers before calling the decorated factory:
//!
//! 1. a process-local map, filled once per key
//! 2. a shared [`CacheStore`]
//!
//! Store failures are logged and counted, then ignored: the value is
//! recomputed and returned as if the store were empty. Errors from the
//! decorated factory are not cached.

mod factories;
mod store;

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use daedalus_core::MetadataResult;
use daedalus_telemetry::metrics;
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

pub use factories::{
    CachedPropertyMetadataFactory, CachedPropertyNameCollectionFactory, CachedResourceMetadataCollectionFactory,
    CachedResourceMetadataFactory, CachedResourceNameCollectionFactory,
};
pub use store::{
    store_from_config, CacheStore, CacheStoreError, FilesystemCacheStore, InMemoryCacheStore, NullCacheStore,
    SharedCacheStore,
};

/// Prefix of every cache key.
pub const CACHE_KEY_PREFIX: &str = "_daedalus_metadata_";

/// Builds a cache key.
///
/// `prefix` is an optional application prefix, `kind` names the cached
/// factory, and `parts` are hashed so keys stay short and filesystem-safe.
///
/// ```
/// use daedalus_metadata::cache::cache_key;
///
/// let key = cache_key(None, "property_metadata", &["App\\Entity\\Book", "title"]);
/// assert!(key.starts_with("_daedalus_metadata_property_metadata_"));
/// assert_eq!(key, cache_key(None, "property_metadata", &["App\\Entity\\Book", "title"]));
/// assert_ne!(key, cache_key(Some("shop"), "property_metadata", &["App\\Entity\\Book", "title"]));
/// ```
pub fn cache_key(prefix: Option<&str>, kind: &str, parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_bytes());
        hasher.update([0u8]);
    }
    let digest = hasher.finalize();

    match prefix.filter(|p| !p.is_empty()) {
        Some(prefix) => format!("{CACHE_KEY_PREFIX}{prefix}_{kind}_{digest:x}"),
        None => format!("{CACHE_KEY_PREFIX}{kind}_{digest:x}"),
    }
}

/// Cache statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered by the local layer or the store.
    pub hits: u64,
    /// Lookups that called the decorated factory.
    pub misses: u64,
    /// Store reads and writes that failed.
    pub store_failures: u64,
    /// Entries in the local layer.
    pub size: usize,
}

/// Two-layer cache of one factory's results.
pub struct MetadataCache<T> {
    factory: &'static str,
    store: SharedCacheStore,
    local: Mutex<HashMap<String, Arc<OnceCell<T>>>>,
    hits: AtomicU64,
    misses: AtomicU64,
    store_failures: AtomicU64,
}

impl<T> fmt::Debug for MetadataCache<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetadataCache")
            .field("factory", &self.factory)
            .field("store", &self.store.name())
            .field("size", &self.local.lock().len())
            .finish_non_exhaustive()
    }
}

impl<T> MetadataCache<T>
where
    T: Clone + Serialize + DeserializeOwned,
{
    /// Creates a cache for the factory named `factory`.
    pub fn new(factory: &'static str, store: SharedCacheStore) -> Self {
        Self {
            factory,
            store,
            local: Mutex::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            store_failures: AtomicU64::new(0),
        }
    }

    /// Returns the cached value for `key`, computing it on a miss.
    ///
    /// Concurrent callers asking for the same key wait for a single
    /// computation.
    pub fn get_or_compute<F>(&self, key: &str, compute: F) -> MetadataResult<T>
    where
        F: FnOnce() -> MetadataResult<T>,
    {
        let cell = Arc::clone(self.local.lock().entry(key.to_string()).or_default());

        if let Some(value) = cell.get() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            metrics::record_cache_hit(self.factory, "local");
            return Ok(value.clone());
        }

        match cell.get_or_try_init(|| self.load(key, compute)) {
            Ok(value) => Ok(value.clone()),
            Err(err) => {
                self.forget_empty(key, &cell);
                Err(err)
            }
        }
    }

    // Errors are not cached: drop the slot unless another caller filled it.
    fn forget_empty(&self, key: &str, cell: &Arc<OnceCell<T>>) {
        let mut local = self.local.lock();
        if local
            .get(key)
            .is_some_and(|current| Arc::ptr_eq(current, cell) && current.get().is_none())
        {
            local.remove(key);
        }
    }

    fn load<F>(&self, key: &str, compute: F) -> MetadataResult<T>
    where
        F: FnOnce() -> MetadataResult<T>,
    {
        match self.store.get(key) {
            Ok(Some(stored)) => match serde_json::from_value(stored) {
                Ok(value) => {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    metrics::record_cache_hit(self.factory, "store");
                    return Ok(value);
                }
                Err(e) => self.store_failed("get", key, &e),
            },
            Ok(None) => {}
            Err(e) => self.store_failed("get", key, &e),
        }

        let started = Instant::now();
        let value = compute()?;
        let elapsed = started.elapsed();
        self.misses.fetch_add(1, Ordering::Relaxed);
        metrics::record_cache_miss(self.factory, elapsed);
        debug!(
            factory = self.factory,
            cache_key = %key,
            duration_ms = elapsed.as_millis() as u64,
            "metadata computed"
        );

        match serde_json::to_value(&value) {
            Ok(encoded) => {
                if let Err(e) = self.store.set(key, encoded) {
                    self.store_failed("set", key, &e);
                }
            }
            Err(e) => self.store_failed("set", key, &e),
        }

        Ok(value)
    }

    fn store_failed(&self, op: &'static str, key: &str, error: &dyn std::error::Error) {
        self.store_failures.fetch_add(1, Ordering::Relaxed);
        metrics::record_store_failure(self.factory, op);
        warn!(
            factory = self.factory,
            store = self.store.name(),
            op,
            cache_key = %key,
            error = %error,
            "cache store failed, recomputing"
        );
    }

    /// Drops the local layer. The store is left untouched.
    pub fn clear_local(&self) {
        self.local.lock().clear();
    }

    /// Returns the cache statistics.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            store_failures: self.store_failures.load(Ordering::Relaxed),
            size: self.local.lock().values().filter(|cell| cell.get().is_some()).count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use daedalus_core::MetadataError;
    use serde_json::Value;
    use std::sync::atomic::AtomicUsize;

    #[derive(Debug)]
    struct BrokenStore;

    impl CacheStore for BrokenStore {
        fn name(&self) -> &'static str {
            "broken"
        }

        fn get(&self, _key: &str) -> Result<Option<Value>, CacheStoreError> {
            Err(CacheStoreError::backend("connection refused"))
        }

        fn set(&self, _key: &str, _value: Value) -> Result<(), CacheStoreError> {
            Err(CacheStoreError::backend("connection refused"))
        }

        fn clear(&self) -> Result<(), CacheStoreError> {
            Ok(())
        }
    }

    #[test]
    fn test_computes_once() {
        let cache: MetadataCache<String> = MetadataCache::new("test", Arc::new(InMemoryCacheStore::new()));
        let calls = AtomicUsize::new(0);
        let compute = || {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok("value".to_string())
        };

        assert_eq!(cache.get_or_compute("k", compute).unwrap(), "value");
        assert_eq!(cache.get_or_compute("k", compute).unwrap(), "value");
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses, stats.size), (1, 1, 1));
    }

    #[test]
    fn test_store_layer_survives_local_clear() {
        let store = Arc::new(InMemoryCacheStore::new());
        let cache: MetadataCache<Vec<String>> = MetadataCache::new("test", store.clone());
        cache.get_or_compute("k", || Ok(vec!["a".to_string()])).unwrap();
        cache.clear_local();

        let value = cache
            .get_or_compute("k", || Err(MetadataError::source("must not be called")))
            .unwrap();
        assert_eq!(value, vec!["a"]);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_broken_store_recomputes() {
        let cache: MetadataCache<u32> = MetadataCache::new("test", Arc::new(BrokenStore));
        assert_eq!(cache.get_or_compute("k", || Ok(7)).unwrap(), 7);
        assert_eq!(cache.get_or_compute("k", || Ok(8)).unwrap(), 7);
        assert_eq!(cache.stats().store_failures, 2);
    }

    #[test]
    fn test_errors_are_not_cached() {
        let cache: MetadataCache<u32> = MetadataCache::new("test", Arc::new(NullCacheStore));
        assert!(cache
            .get_or_compute("k", || Err(MetadataError::resource_class_not_found("Nope")))
            .is_err());
        assert_eq!(cache.get_or_compute("k", || Ok(1)).unwrap(), 1);
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_failed_lookups_leave_no_entries() {
        let cache: MetadataCache<u32> = MetadataCache::new("test", Arc::new(NullCacheStore));
        for class in ["A", "B", "C"] {
            let result = cache.get_or_compute(class, || Err(MetadataError::resource_class_not_found(class)));
            assert!(result.is_err());
        }
        assert!(cache.local.lock().is_empty());

        cache.get_or_compute("A", || Ok(1)).unwrap();
        assert_eq!(cache.local.lock().len(), 1);
    }

    #[test]
    fn test_cache_keys_differ_by_kind() {
        assert_ne!(
            cache_key(None, "property_names", &["Book"]),
            cache_key(None, "resource_collection", &["Book"])
        );
        assert_ne!(cache_key(None, "k", &["ab", "c"]), cache_key(None, "k", &["a", "bc"]));
    }
}
