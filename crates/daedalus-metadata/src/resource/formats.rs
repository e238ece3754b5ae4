//! Format resolution for operations.

use daedalus_config::MetadataConfig;
use daedalus_core::{Formats, MetadataError, MetadataResult, Operation, ResourceMetadataCollection};
use http::Method;
use indexmap::IndexMap;

use crate::factory::{ResourceMetadataCollectionFactory, SharedResourceMetadataCollectionFactory};

/// Resolves format names to mime types on every operation.
///
/// - declared names without mime types (`["jsonld"]`) take them from the configured formats
/// - operations without formats get the configured formats
/// - input formats default to the formats, except `PATCH`, which defaults to the patch formats
/// - output formats default to the formats
#[derive(Debug, Clone)]
pub struct FormatsResourceMetadataCollectionFactory {
    formats: Formats,
    patch_formats: Formats,
    inner: SharedResourceMetadataCollectionFactory,
}

impl FormatsResourceMetadataCollectionFactory {
    /// Creates a factory using the formats configured in `config`.
    pub fn new(config: &MetadataConfig, inner: SharedResourceMetadataCollectionFactory) -> Self {
        Self {
            formats: config.formats.clone(),
            patch_formats: config.patch_formats.clone(),
            inner,
        }
    }

    fn normalize(&self, declared: &Formats, operation: &Operation) -> MetadataResult<Formats> {
        declared
            .iter()
            .map(|(name, mime_types)| {
                if !mime_types.is_empty() {
                    return Ok((name.clone(), mime_types.clone()));
                }
                self.formats
                    .get(name)
                    .or_else(|| self.patch_formats.get(name))
                    .map(|mime_types| (name.clone(), mime_types.clone()))
                    .ok_or_else(|| {
                        let configured: Vec<&str> = self.formats.keys().map(String::as_str).collect();
                        MetadataError::invalid_declaration(format!(
                            "operation \"{}\" uses unsupported format \"{name}\" (configured: {})",
                            operation.name(),
                            configured.join(", ")
                        ))
                    })
            })
            .collect()
    }

    fn resolve(&self, operation: &Operation) -> MetadataResult<Operation> {
        let formats = match operation.formats() {
            Some(declared) => self.normalize(declared, operation)?,
            None => self.formats.clone(),
        };

        let input_formats = match operation.input_formats() {
            Some(declared) => self.normalize(declared, operation)?,
            None if *operation.method() == Method::PATCH && !self.patch_formats.is_empty() => {
                self.patch_formats.clone()
            }
            None => formats.clone(),
        };

        let output_formats = match operation.output_formats() {
            Some(declared) => self.normalize(declared, operation)?,
            None => formats.clone(),
        };

        Ok(operation
            .with_formats(formats)
            .with_input_formats(input_formats)
            .with_output_formats(output_formats))
    }
}

impl ResourceMetadataCollectionFactory for FormatsResourceMetadataCollectionFactory {
    fn name(&self) -> &'static str {
        "formats"
    }

    fn create(&self, class: &str) -> MetadataResult<ResourceMetadataCollection> {
        let collection = self.inner.create(class)?;
        let resources = collection
            .iter()
            .map(|resource| {
                let operations = resource
                    .operations()
                    .iter()
                    .map(|(name, operation)| Ok((name.clone(), self.resolve(operation)?)))
                    .collect::<MetadataResult<IndexMap<_, _>>>()?;
                Ok(resource.with_operations(operations))
            })
            .collect::<MetadataResult<Vec<_>>>()?;

        Ok(collection.with_resources(resources))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::ExtractorResourceMetadataCollectionFactory;
    use daedalus_core::fixtures;
    use daedalus_extractor::YamlExtractor;
    use std::sync::Arc;

    fn factory(content: &str) -> FormatsResourceMetadataCollectionFactory {
        let config = Arc::new(MetadataConfig::default());
        let inner = ExtractorResourceMetadataCollectionFactory::new(
            Arc::new(YamlExtractor::from_str("formats.yaml", content).unwrap()),
            config.clone(),
            None,
        );
        FormatsResourceMetadataCollectionFactory::new(&config, Arc::new(inner))
    }

    #[test]
    fn test_configured_formats_by_default() {
        let collection = factory("App\\Entity\\Book: ~\n").create(fixtures::BOOK).unwrap();
        let get = collection.get_operation("_api_Book_get").unwrap();
        let formats = get.formats().unwrap();
        assert_eq!(formats.keys().collect::<Vec<_>>(), vec!["jsonld", "json", "html"]);
        assert_eq!(get.output_formats(), Some(formats));

        let patch = collection.get_operation("_api_Book_patch").unwrap();
        assert_eq!(patch.input_formats().unwrap()["json"], vec!["application/merge-patch+json"]);
    }

    #[test]
    fn test_format_names_resolved() {
        let collection = factory("App\\Entity\\Book:\n  formats: [jsonld]\n  operations:\n    - { kind: Post, inputFormats: { csv: text/csv } }\n")
            .create(fixtures::BOOK)
            .unwrap();
        let post = collection.get_operation("_api_Book_post").unwrap();
        assert_eq!(post.formats().unwrap()["jsonld"], vec!["application/ld+json"]);
        assert_eq!(post.input_formats().unwrap()["csv"], vec!["text/csv"]);
        assert_eq!(post.output_formats().unwrap().len(), 1);
    }

    #[test]
    fn test_unknown_format_name() {
        let err = factory("App\\Entity\\Book:\n  formats: [csv]\n")
            .create(fixtures::BOOK)
            .unwrap_err();
        assert!(err.to_string().contains("unsupported format \"csv\""));
    }
}
