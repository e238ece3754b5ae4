//! Cached decorators for every factory kind.

use daedalus_core::{
    MetadataResult, PropertyMetadata, PropertyNameCollection, PropertyOptions, ResourceMetadata,
    ResourceMetadataCollection, ResourceNameCollection,
};

use super::{cache_key, CacheStats, MetadataCache, SharedCacheStore};
use crate::factory::{
    PropertyMetadataFactory, PropertyNameCollectionFactory, ResourceMetadataCollectionFactory, ResourceMetadataFactory,
    ResourceNameCollectionFactory, SharedPropertyMetadataFactory, SharedPropertyNameCollectionFactory,
    SharedResourceMetadataCollectionFactory, SharedResourceMetadataFactory, SharedResourceNameCollectionFactory,
};

/// Caches property name collections per class and options.
#[derive(Debug)]
pub struct CachedPropertyNameCollectionFactory {
    inner: SharedPropertyNameCollectionFactory,
    cache: MetadataCache<PropertyNameCollection>,
    prefix: Option<String>,
}

impl CachedPropertyNameCollectionFactory {
    /// Creates a cached decorator over `inner`.
    pub fn new(inner: SharedPropertyNameCollectionFactory, store: SharedCacheStore, prefix: Option<String>) -> Self {
        Self {
            inner,
            cache: MetadataCache::new("property_names", store),
            prefix,
        }
    }

    /// Returns the cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

impl PropertyNameCollectionFactory for CachedPropertyNameCollectionFactory {
    fn name(&self) -> &'static str {
        "cached"
    }

    fn create(&self, class: &str, options: &PropertyOptions) -> MetadataResult<PropertyNameCollection> {
        let discriminator = options.cache_discriminator();
        let key = cache_key(self.prefix.as_deref(), "property_names", &[class, &discriminator]);
        self.cache.get_or_compute(&key, || self.inner.create(class, options))
    }
}

/// Caches property metadata per class, property and options.
#[derive(Debug)]
pub struct CachedPropertyMetadataFactory {
    inner: SharedPropertyMetadataFactory,
    cache: MetadataCache<PropertyMetadata>,
    prefix: Option<String>,
}

impl CachedPropertyMetadataFactory {
    /// Creates a cached decorator over `inner`.
    pub fn new(inner: SharedPropertyMetadataFactory, store: SharedCacheStore, prefix: Option<String>) -> Self {
        Self {
            inner,
            cache: MetadataCache::new("property_metadata", store),
            prefix,
        }
    }

    /// Returns the cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

impl PropertyMetadataFactory for CachedPropertyMetadataFactory {
    fn name(&self) -> &'static str {
        "cached"
    }

    fn create(&self, class: &str, property: &str, options: &PropertyOptions) -> MetadataResult<PropertyMetadata> {
        let discriminator = options.cache_discriminator();
        let key = cache_key(self.prefix.as_deref(), "property_metadata", &[class, property, &discriminator]);
        self.cache.get_or_compute(&key, || self.inner.create(class, property, options))
    }
}

/// Caches resource metadata collections per class.
#[derive(Debug)]
pub struct CachedResourceMetadataCollectionFactory {
    inner: SharedResourceMetadataCollectionFactory,
    cache: MetadataCache<ResourceMetadataCollection>,
    prefix: Option<String>,
}

impl CachedResourceMetadataCollectionFactory {
    /// Creates a cached decorator over `inner`.
    pub fn new(inner: SharedResourceMetadataCollectionFactory, store: SharedCacheStore, prefix: Option<String>) -> Self {
        Self {
            inner,
            cache: MetadataCache::new("resource_collection", store),
            prefix,
        }
    }

    /// Returns the cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

impl ResourceMetadataCollectionFactory for CachedResourceMetadataCollectionFactory {
    fn name(&self) -> &'static str {
        "cached"
    }

    fn create(&self, class: &str) -> MetadataResult<ResourceMetadataCollection> {
        let key = cache_key(self.prefix.as_deref(), "resource_collection", &[class]);
        self.cache.get_or_compute(&key, || self.inner.create(class))
    }
}

/// Caches legacy resource metadata per class.
#[derive(Debug)]
pub struct CachedResourceMetadataFactory {
    inner: SharedResourceMetadataFactory,
    cache: MetadataCache<ResourceMetadata>,
    prefix: Option<String>,
}

impl CachedResourceMetadataFactory {
    /// Creates a cached decorator over `inner`.
    pub fn new(inner: SharedResourceMetadataFactory, store: SharedCacheStore, prefix: Option<String>) -> Self {
        Self {
            inner,
            cache: MetadataCache::new("resource_metadata", store),
            prefix,
        }
    }

    /// Returns the cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

impl ResourceMetadataFactory for CachedResourceMetadataFactory {
    fn name(&self) -> &'static str {
        "cached"
    }

    fn create(&self, class: &str) -> MetadataResult<ResourceMetadata> {
        let key = cache_key(self.prefix.as_deref(), "resource_metadata", &[class]);
        self.cache.get_or_compute(&key, || self.inner.create(class))
    }
}

/// Caches the resource name collection.
#[derive(Debug)]
pub struct CachedResourceNameCollectionFactory {
    inner: SharedResourceNameCollectionFactory,
    cache: MetadataCache<ResourceNameCollection>,
    prefix: Option<String>,
}

impl CachedResourceNameCollectionFactory {
    /// Creates a cached decorator over `inner`.
    pub fn new(inner: SharedResourceNameCollectionFactory, store: SharedCacheStore, prefix: Option<String>) -> Self {
        Self {
            inner,
            cache: MetadataCache::new("resource_names", store),
            prefix,
        }
    }

    /// Returns the cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

impl ResourceNameCollectionFactory for CachedResourceNameCollectionFactory {
    fn name(&self) -> &'static str {
        "cached"
    }

    fn create(&self) -> MetadataResult<ResourceNameCollection> {
        let key = cache_key(self.prefix.as_deref(), "resource_names", &[]);
        self.cache.get_or_compute(&key, || self.inner.create())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::InMemoryCacheStore;
    use daedalus_core::{MetadataError, NameCollection};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Debug, Default)]
    struct CountingNames {
        calls: AtomicUsize,
    }

    impl PropertyNameCollectionFactory for CountingNames {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn create(&self, class: &str, _options: &PropertyOptions) -> MetadataResult<PropertyNameCollection> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if class == "Missing" {
                return Err(MetadataError::resource_class_not_found(class));
            }
            Ok(["id", "title"].into_iter().collect::<NameCollection>())
        }
    }

    #[test]
    fn test_options_are_part_of_the_key() {
        let inner = Arc::new(CountingNames::default());
        let cached = CachedPropertyNameCollectionFactory::new(inner.clone(), Arc::new(InMemoryCacheStore::new()), None);

        let plain = PropertyOptions::new();
        let grouped = PropertyOptions::new().with_serializer_groups(["book:read"]);
        cached.create("Book", &plain).unwrap();
        cached.create("Book", &plain).unwrap();
        cached.create("Book", &grouped).unwrap();

        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
        assert_eq!(cached.stats().hits, 1);
    }

    #[test]
    fn test_shared_store_between_instances() {
        let store: SharedCacheStore = Arc::new(InMemoryCacheStore::new());
        let first_inner = Arc::new(CountingNames::default());
        let second_inner = Arc::new(CountingNames::default());
        let first = CachedPropertyNameCollectionFactory::new(first_inner.clone(), store.clone(), Some("app".to_string()));
        let second = CachedPropertyNameCollectionFactory::new(second_inner.clone(), store, Some("app".to_string()));

        let names = first.create("Book", &PropertyOptions::new()).unwrap();
        assert_eq!(second.create("Book", &PropertyOptions::new()).unwrap(), names);
        assert_eq!(second_inner.calls.load(Ordering::SeqCst), 0);
    }

    #[derive(Debug)]
    struct NullDefault;

    impl PropertyMetadataFactory for NullDefault {
        fn name(&self) -> &'static str {
            "null-default"
        }

        fn create(&self, _class: &str, _property: &str, _options: &PropertyOptions) -> MetadataResult<PropertyMetadata> {
            Ok(PropertyMetadata::new().with_default(serde_json::Value::Null))
        }
    }

    #[test]
    fn test_store_hit_matches_fresh_value() {
        let store: SharedCacheStore = Arc::new(InMemoryCacheStore::new());
        let warm = CachedPropertyMetadataFactory::new(Arc::new(NullDefault), store.clone(), None);
        let fresh = warm.create("Book", "subtitle", &PropertyOptions::new()).unwrap();

        let cold = CachedPropertyMetadataFactory::new(Arc::new(NullDefault), store, None);
        let stored = cold.create("Book", "subtitle", &PropertyOptions::new()).unwrap();
        assert_eq!(cold.stats().hits, 1);
        assert_eq!(stored, fresh);
        assert_eq!(stored.default_value(), Some(&serde_json::Value::Null));
    }

    #[test]
    fn test_not_found_propagates() {
        let inner = Arc::new(CountingNames::default());
        let cached = CachedPropertyNameCollectionFactory::new(inner.clone(), Arc::new(InMemoryCacheStore::new()), None);
        assert!(cached.create("Missing", &PropertyOptions::new()).unwrap_err().is_not_found());
        assert!(cached.create("Missing", &PropertyOptions::new()).is_err());
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }
}
