//! Identifier detection.

use std::sync::Arc;

use daedalus_core::{MetadataResult, PropertyMetadata, PropertyOptions};
use daedalus_extractor::ResourceExtractor;
use serde_json::Value;

use crate::factory::{PropertyMetadataFactory, SharedPropertyMetadataFactory, SharedPropertyNameCollectionFactory};

/// Marks identifier properties.
///
/// A property is an identifier when declared with `identifier: true`. When no
/// property of the class is declared that way, the first property named `id`
/// (case-insensitively, in name collection order) is the identifier.
///
/// Identifiers are read-only and not required unless a declaration says
/// otherwise.
#[derive(Debug, Clone)]
pub struct IdentifierPropertyMetadataFactory {
    extractor: Arc<dyn ResourceExtractor>,
    names: SharedPropertyNameCollectionFactory,
    inner: SharedPropertyMetadataFactory,
}

impl IdentifierPropertyMetadataFactory {
    /// Creates a factory decorating `inner`.
    pub fn new(
        extractor: Arc<dyn ResourceExtractor>,
        names: SharedPropertyNameCollectionFactory,
        inner: SharedPropertyMetadataFactory,
    ) -> Self {
        Self { extractor, names, inner }
    }

    fn fallback_identifier(&self, class: &str, options: &PropertyOptions) -> Option<String> {
        self.names
            .create(class, options)
            .ok()?
            .into_iter()
            .find(|name| name.eq_ignore_ascii_case("id"))
    }
}

impl PropertyMetadataFactory for IdentifierPropertyMetadataFactory {
    fn name(&self) -> &'static str {
        "identifier"
    }

    fn create(&self, class: &str, property: &str, options: &PropertyOptions) -> MetadataResult<PropertyMetadata> {
        let metadata = self.inner.create(class, property, options)?;
        let declared = self.extractor.properties(class)?;
        let own = declared.get(property);
        let is_declared = |key: &str| own.is_some_and(|attributes| attributes.get(key).is_some_and(|v| !v.is_null()));

        let identifier = match metadata.identifier() {
            Some(identifier) => identifier,
            None => {
                let explicit = declared
                    .values()
                    .any(|attributes| attributes.get("identifier") == Some(&Value::Bool(true)));
                !explicit && self.fallback_identifier(class, options).as_deref() == Some(property)
            }
        };

        let mut metadata = metadata.with_identifier(identifier);
        if identifier {
            if !is_declared("writable") {
                metadata = metadata.with_writable(false);
            }
            if !is_declared("required") {
                metadata = metadata.with_required(false);
            }
        }
        Ok(metadata)
    }
}
