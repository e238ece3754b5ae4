//! Legacy resource metadata.

use daedalus_core::{MetadataResult, ResourceMetadata};

use crate::factory::{ResourceMetadataFactory, SharedResourceMetadataCollectionFactory};

/// Projects the collection chain onto [`ResourceMetadata`].
///
/// Holds no state of its own: whatever the collection chain resolves, the
/// legacy shape shows.
#[derive(Debug, Clone)]
pub struct LegacyResourceMetadataFactory {
    inner: SharedResourceMetadataCollectionFactory,
}

impl LegacyResourceMetadataFactory {
    /// Creates a factory over a collection factory.
    pub fn new(inner: SharedResourceMetadataCollectionFactory) -> Self {
        Self { inner }
    }
}

impl ResourceMetadataFactory for LegacyResourceMetadataFactory {
    fn name(&self) -> &'static str {
        "legacy"
    }

    fn create(&self, class: &str) -> MetadataResult<ResourceMetadata> {
        let collection = self.inner.create(class)?;
        ResourceMetadata::from_collection(&collection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{ExtractorResourceMetadataCollectionFactory, FormatsResourceMetadataCollectionFactory};
    use daedalus_config::MetadataConfig;
    use daedalus_core::fixtures;
    use daedalus_extractor::YamlExtractor;
    use serde_json::json;
    use std::sync::Arc;

    fn factory(content: &str) -> LegacyResourceMetadataFactory {
        let config = Arc::new(MetadataConfig::default());
        let extractor = ExtractorResourceMetadataCollectionFactory::new(
            Arc::new(YamlExtractor::from_str("legacy.yaml", content).unwrap()),
            config.clone(),
            None,
        );
        let formats = FormatsResourceMetadataCollectionFactory::new(&config, Arc::new(extractor));
        LegacyResourceMetadataFactory::new(Arc::new(formats))
    }

    #[test]
    fn test_defaults_only_resource() {
        let metadata = factory("App\\Entity\\Dummy: ~\n").create(fixtures::DUMMY).unwrap();
        assert_eq!(metadata.short_name(), "Dummy");
        assert_eq!(
            metadata.item_operations().keys().collect::<Vec<_>>(),
            vec!["get", "put", "patch", "delete"]
        );
        assert_eq!(metadata.collection_operations().keys().collect::<Vec<_>>(), vec!["get", "post"]);
        assert_eq!(
            metadata.collection_operation_attribute("get", "pagination_items_per_page", true),
            Some(&json!(30))
        );
    }

    #[test]
    fn test_resource_attribute_fallback() {
        let metadata = factory("App\\Entity\\Book:\n  iri: https://schema.org/Book\n  security: is_granted('ROLE_USER')\n")
            .create(fixtures::BOOK)
            .unwrap();
        assert_eq!(metadata.iri(), Some("https://schema.org/Book"));
        assert_eq!(
            metadata.item_operation_attribute("get", "security", false),
            Some(&json!("is_granted('ROLE_USER')"))
        );
        assert_eq!(metadata.attribute("security"), Some(&json!("is_granted('ROLE_USER')")));
    }

    #[test]
    fn test_unknown_class() {
        let err = factory("App\\Entity\\Book: ~\n").create("App\\Entity\\Nope").unwrap_err();
        assert!(err.is_resource_class_not_found());
    }
}
