//! Resource class discovery.

use std::sync::Arc;

use daedalus_core::{MetadataResult, ResourceNameCollection};
use daedalus_extractor::ResourceExtractor;

use crate::factory::{ResourceNameCollectionFactory, SharedResourceNameCollectionFactory};

/// Lists the classes declared as resources by an extractor.
///
/// Names from the decorated factory come first; duplicates are dropped.
#[derive(Debug, Clone)]
pub struct ExtractorResourceNameCollectionFactory {
    extractor: Arc<dyn ResourceExtractor>,
    inner: Option<SharedResourceNameCollectionFactory>,
}

impl ExtractorResourceNameCollectionFactory {
    /// Creates a factory, optionally decorating `inner`.
    pub fn new(extractor: Arc<dyn ResourceExtractor>, inner: Option<SharedResourceNameCollectionFactory>) -> Self {
        Self { extractor, inner }
    }
}

impl ResourceNameCollectionFactory for ExtractorResourceNameCollectionFactory {
    fn name(&self) -> &'static str {
        "extractor"
    }

    fn create(&self) -> MetadataResult<ResourceNameCollection> {
        let mut names = match &self.inner {
            Some(inner) => inner.create()?,
            None => ResourceNameCollection::new(),
        };
        for class in self.extractor.resource_classes()? {
            names.push(class);
        }
        Ok(names)
    }
}
