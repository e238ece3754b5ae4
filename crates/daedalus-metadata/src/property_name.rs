//! Property name collection factories.
//!
//! The chain runs reflection → declarations → cache. Names keep discovery
//! order: reflected properties, then accessor-derived names, then names
//! contributed by outer layers.

use std::sync::Arc;

use daedalus_core::{ClassRegistry, MetadataError, MetadataResult, PropertyNameCollection, PropertyOptions};
use daedalus_extractor::ResourceExtractor;
use tracing::debug;

use crate::factory::{PropertyNameCollectionFactory, SharedPropertyNameCollectionFactory};

/// Lists the properties a class exposes through its structure.
///
/// Public properties come first, in declaration order (own before
/// inherited), together with non-public properties backed by an accessor.
/// Accessor methods for which no property exists add virtual names after
/// them: `getName()` exposes `name`.
#[derive(Debug, Clone)]
pub struct ReflectionPropertyNameCollectionFactory {
    registry: Arc<ClassRegistry>,
}

impl ReflectionPropertyNameCollectionFactory {
    /// Creates a factory reading `registry`.
    pub fn new(registry: Arc<ClassRegistry>) -> Self {
        Self { registry }
    }
}

impl PropertyNameCollectionFactory for ReflectionPropertyNameCollectionFactory {
    fn name(&self) -> &'static str {
        "reflection"
    }

    fn create(&self, class: &str, _options: &PropertyOptions) -> MetadataResult<PropertyNameCollection> {
        if !self.registry.contains(class) {
            return Err(MetadataError::resource_class_not_found(class));
        }

        let mut names = PropertyNameCollection::new();
        for property in self.registry.all_properties(class) {
            if property.is_public() || !self.registry.accessors(class, property.name()).is_empty() {
                names.push(property.name());
            }
        }

        for method in self.registry.all_methods(class) {
            if let Some((property, _)) = method.accessor() {
                names.push(property);
            }
        }

        Ok(names)
    }
}

/// Appends the properties declared in mapping sources.
///
/// A class unknown to the decorated factory is not fatal: the declared names
/// are returned on their own. The not-found error only surfaces when no layer
/// knows anything about the class.
#[derive(Debug, Clone)]
pub struct ExtractorPropertyNameCollectionFactory {
    extractor: Arc<dyn ResourceExtractor>,
    inner: Option<SharedPropertyNameCollectionFactory>,
}

impl ExtractorPropertyNameCollectionFactory {
    /// Creates a factory decorating `inner`, if any.
    pub fn new(extractor: Arc<dyn ResourceExtractor>, inner: Option<SharedPropertyNameCollectionFactory>) -> Self {
        Self { extractor, inner }
    }

    fn declares(&self, class: &str) -> MetadataResult<bool> {
        Ok(!self.extractor.resources(class)?.is_empty())
    }
}

impl PropertyNameCollectionFactory for ExtractorPropertyNameCollectionFactory {
    fn name(&self) -> &'static str {
        "extractor"
    }

    fn create(&self, class: &str, options: &PropertyOptions) -> MetadataResult<PropertyNameCollection> {
        let (mut names, inner_error) = match &self.inner {
            Some(inner) => match inner.create(class, options) {
                Ok(names) => (names, None),
                Err(err) if err.is_resource_class_not_found() => {
                    debug!(class = %class, factory = inner.name(), "decorated factory does not know the class");
                    (PropertyNameCollection::new(), Some(err))
                }
                Err(err) => return Err(err),
            },
            None => (PropertyNameCollection::new(), None),
        };

        let declared = self.extractor.properties(class)?;
        for name in declared.keys() {
            names.push(name.as_str());
        }

        let known = self.inner.is_some() && inner_error.is_none();
        if !known && declared.is_empty() && !self.declares(class)? {
            return Err(inner_error.unwrap_or_else(|| MetadataError::resource_class_not_found(class)));
        }

        Ok(names)
    }
}
