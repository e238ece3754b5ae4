//! Declaration layer: property attributes from mapping sources.

use std::sync::Arc;

use daedalus_core::{MetadataError, MetadataResult, PropertyMetadata, PropertyOptions};
use daedalus_extractor::ResourceExtractor;

use crate::factory::{PropertyMetadataFactory, SharedPropertyMetadataFactory};

/// Applies declared property attributes over the decorated factory's result.
///
/// A property the decorated factory does not know is still resolved when it
/// is declared here; virtual properties only exist in mapping files.
#[derive(Debug, Clone)]
pub struct ExtractorPropertyMetadataFactory {
    extractor: Arc<dyn ResourceExtractor>,
    inner: Option<SharedPropertyMetadataFactory>,
}

impl ExtractorPropertyMetadataFactory {
    /// Creates a factory decorating `inner`, if any.
    pub fn new(extractor: Arc<dyn ResourceExtractor>, inner: Option<SharedPropertyMetadataFactory>) -> Self {
        Self { extractor, inner }
    }
}

impl PropertyMetadataFactory for ExtractorPropertyMetadataFactory {
    fn name(&self) -> &'static str {
        "extractor"
    }

    fn create(&self, class: &str, property: &str, options: &PropertyOptions) -> MetadataResult<PropertyMetadata> {
        let declared = self.extractor.properties(class)?.shift_remove(property);

        let base = match (&self.inner, &declared) {
            (Some(inner), Some(_)) => match inner.create(class, property, options) {
                Ok(metadata) => metadata,
                Err(err) if err.is_not_found() => PropertyMetadata::new(),
                Err(err) => return Err(err),
            },
            (Some(inner), None) => return inner.create(class, property, options),
            (None, Some(_)) => PropertyMetadata::new(),
            (None, None) => return Err(MetadataError::property_not_found(class, property)),
        };

        match declared {
            Some(attributes) => {
                let layer = PropertyMetadata::from_declaration(&attributes)?;
                Ok(layer.merge_over(&base))
            }
            None => Ok(base),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property_metadata::ReflectionPropertyMetadataFactory;
    use daedalus_core::fixtures::{self, bookstore_registry};
    use daedalus_extractor::{AttributeExtractor, YamlExtractor};
    use serde_json::json;

    fn yaml(content: &str) -> Arc<dyn ResourceExtractor> {
        Arc::new(YamlExtractor::from_str("test.yaml", content).unwrap())
    }

    fn reflection() -> SharedPropertyMetadataFactory {
        Arc::new(ReflectionPropertyMetadataFactory::new(Arc::new(bookstore_registry())))
    }

    #[test]
    fn test_declaration_overrides_inner_fields() {
        let factory = ExtractorPropertyMetadataFactory::new(
            yaml("properties:\n  App\\Entity\\Book:\n    title: { description: The title, writable: false, extraProperties: { foo: bar } }\n"),
            Some(reflection()),
        );

        let title = factory.create(fixtures::BOOK, "title", &PropertyOptions::new()).unwrap();
        assert_eq!(title.description(), Some("The title"));
        assert_eq!(title.writable(), Some(false));
        assert_eq!(title.readable(), Some(true));
        assert_eq!(title.extra_properties()["foo"], json!("bar"));
    }

    #[test]
    fn test_source_attributes() {
        let registry = Arc::new(bookstore_registry());
        let factory = ExtractorPropertyMetadataFactory::new(
            Arc::new(AttributeExtractor::new(registry.clone())),
            Some(Arc::new(ReflectionPropertyMetadataFactory::new(registry))),
        );

        let isbn = factory.create(fixtures::BOOK, "isbn", &PropertyOptions::new()).unwrap();
        assert_eq!(isbn.iri(), Some("https://schema.org/isbn"));
        assert_eq!(isbn.description(), Some("The ISBN of the book"));
        assert!(isbn.builtin_types().unwrap()[0].is_nullable());
    }

    #[test]
    fn test_virtual_property() {
        let factory = ExtractorPropertyMetadataFactory::new(
            yaml("properties:\n  App\\Entity\\Book:\n    price: { readable: true }\n"),
            Some(reflection()),
        );
        let price = factory.create(fixtures::BOOK, "price", &PropertyOptions::new()).unwrap();
        assert_eq!(price.readable(), Some(true));
        assert_eq!(price.writable(), None);
    }

    #[test]
    fn test_undeclared_property_passes_through() {
        let factory = ExtractorPropertyMetadataFactory::new(yaml("resources: {}\n"), Some(reflection()));
        let err = factory.create(fixtures::BOOK, "price", &PropertyOptions::new()).unwrap_err();
        assert!(matches!(err, MetadataError::PropertyNotFound { .. }));

        let standalone = ExtractorPropertyMetadataFactory::new(yaml("resources: {}\n"), None);
        assert!(standalone.create(fixtures::BOOK, "title", &PropertyOptions::new()).is_err());
    }
}
