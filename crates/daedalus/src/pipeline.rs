//! Wiring of the factory chains.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use daedalus_config::MetadataConfig;
use daedalus_core::{ClassRegistry, PropertyOptions};
use daedalus_extractor::{
    AttributeExtractor, CompositeExtractor, ExtractError, ResourceExtractor, XmlExtractor, YamlExtractor,
};
use daedalus_metadata::cache::{
    store_from_config, CachedPropertyMetadataFactory, CachedPropertyNameCollectionFactory,
    CachedResourceMetadataCollectionFactory, CachedResourceMetadataFactory, CachedResourceNameCollectionFactory,
};
use daedalus_metadata::property_metadata::{
    ConstraintIntrospector, ExtractorPropertyMetadataFactory, IdentifierPropertyMetadataFactory,
    ReflectionPropertyMetadataFactory, RegistryConstraintIntrospector, ValidatorPropertyMetadataFactory,
};
use daedalus_metadata::property_name::{ExtractorPropertyNameCollectionFactory, ReflectionPropertyNameCollectionFactory};
use daedalus_metadata::resource::{
    ExtractorResourceMetadataCollectionFactory, ExtractorResourceNameCollectionFactory,
    FormatsResourceMetadataCollectionFactory, LegacyResourceMetadataFactory,
};
use daedalus_metadata::{
    PropertyMetadataFactory, PropertyNameCollectionFactory, ResourceMetadataCollectionFactory,
    ResourceNameCollectionFactory, SharedCacheStore, SharedPropertyMetadataFactory, SharedPropertyNameCollectionFactory,
    SharedResourceMetadataCollectionFactory, SharedResourceMetadataFactory, SharedResourceNameCollectionFactory,
};
use tracing::{debug, info};

use crate::error::PipelineResult;

/// Counts collected by [`MetadataPipeline::warm_up`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WarmUpReport {
    /// Resource classes resolved.
    pub resources: usize,
    /// Operations across all resources.
    pub operations: usize,
    /// Property metadata entries resolved.
    pub properties: usize,
}

/// The assembled factory chains.
///
/// Built once at startup and shared; every accessor returns the outermost
/// factory of its chain.
///
/// # Example
///
/// ```
/// use daedalus::{MetadataPipeline, ResourceMetadataCollectionFactory};
/// use daedalus_core::fixtures::{bookstore_registry, BOOK};
///
/// let pipeline = MetadataPipeline::builder()
///     .registry(bookstore_registry())
///     .build()
///     .unwrap();
///
/// let collection = pipeline.resource_metadata_collection().create(BOOK).unwrap();
/// assert!(collection.get_operation("_api_Book_get_collection").is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct MetadataPipeline {
    config: Arc<MetadataConfig>,
    extractor: Arc<dyn ResourceExtractor>,
    property_names: SharedPropertyNameCollectionFactory,
    property_metadata: SharedPropertyMetadataFactory,
    resource_metadata_collection: SharedResourceMetadataCollectionFactory,
    resource_metadata: SharedResourceMetadataFactory,
    resource_names: SharedResourceNameCollectionFactory,
}

impl MetadataPipeline {
    /// Creates a pipeline builder.
    pub fn builder() -> MetadataPipelineBuilder {
        MetadataPipelineBuilder::new()
    }

    /// Returns the configuration the pipeline was built from.
    pub fn config(&self) -> &MetadataConfig {
        &self.config
    }

    /// Returns the combined declaration source.
    pub fn extractor(&self) -> &Arc<dyn ResourceExtractor> {
        &self.extractor
    }

    /// Returns the property name collection chain.
    pub fn property_name_collection(&self) -> &SharedPropertyNameCollectionFactory {
        &self.property_names
    }

    /// Returns the property metadata chain.
    pub fn property_metadata(&self) -> &SharedPropertyMetadataFactory {
        &self.property_metadata
    }

    /// Returns the resource metadata collection chain.
    pub fn resource_metadata_collection(&self) -> &SharedResourceMetadataCollectionFactory {
        &self.resource_metadata_collection
    }

    /// Returns the legacy resource metadata factory.
    pub fn resource_metadata(&self) -> &SharedResourceMetadataFactory {
        &self.resource_metadata
    }

    /// Returns the resource name collection chain.
    pub fn resource_name_collection(&self) -> &SharedResourceNameCollectionFactory {
        &self.resource_names
    }

    /// Resolves the metadata of every declared resource and its properties.
    ///
    /// With caching enabled this fills the caches, so later lookups never
    /// compute. The first failure aborts the warm-up.
    pub fn warm_up(&self) -> PipelineResult<WarmUpReport> {
        let started = Instant::now();
        let mut report = WarmUpReport::default();
        let options = PropertyOptions::new();

        for class in &self.resource_names.create()? {
            let collection = self.resource_metadata_collection.create(class)?;
            report.resources += 1;
            report.operations += collection.operations().count();

            for property in &self.property_names.create(class, &options)? {
                self.property_metadata.create(class, property, &options)?;
                report.properties += 1;
            }
        }

        info!(
            resources = report.resources,
            operations = report.operations,
            properties = report.properties,
            duration_ms = started.elapsed().as_millis() as u64,
            "metadata warmed up"
        );
        Ok(report)
    }
}

/// Builder for [`MetadataPipeline`].
#[derive(Debug, Default)]
pub struct MetadataPipelineBuilder {
    config: Option<MetadataConfig>,
    registry: Option<Arc<ClassRegistry>>,
    constraint_introspector: Option<Arc<dyn ConstraintIntrospector>>,
    cache_store: Option<SharedCacheStore>,
    extractors: Vec<Arc<dyn ResourceExtractor>>,
}

impl MetadataPipelineBuilder {
    /// Creates a builder with default configuration and an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the configuration.
    #[must_use]
    pub fn config(mut self, config: MetadataConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the class registry read by reflection and the attribute extractor.
    #[must_use]
    pub fn registry(self, registry: ClassRegistry) -> Self {
        self.shared_registry(Arc::new(registry))
    }

    /// Sets an already shared class registry.
    #[must_use]
    pub fn shared_registry(mut self, registry: Arc<ClassRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Replaces the registry-based constraint introspector.
    #[must_use]
    pub fn constraint_introspector(mut self, introspector: Arc<dyn ConstraintIntrospector>) -> Self {
        self.constraint_introspector = Some(introspector);
        self
    }

    /// Replaces the cache store selected by the configuration.
    #[must_use]
    pub fn cache_store(mut self, store: SharedCacheStore) -> Self {
        self.cache_store = Some(store);
        self
    }

    /// Adds a declaration source queried after the attribute and mapping file extractors.
    #[must_use]
    pub fn extractor(mut self, extractor: Arc<dyn ResourceExtractor>) -> Self {
        self.extractors.push(extractor);
        self
    }

    /// Validates the configuration, loads mapping files and assembles the chains.
    pub fn build(self) -> PipelineResult<MetadataPipeline> {
        let config = self.config.unwrap_or_default();
        config.validate()?;
        let config = Arc::new(config);

        let registry = self.registry.unwrap_or_default();
        let extractor = build_extractor(&config, &registry, self.extractors)?;

        let cache_store = if config.cache.enabled {
            Some(match self.cache_store {
                Some(store) => store,
                None => store_from_config(&config.cache)?,
            })
        } else {
            None
        };
        let prefix = config.cache.prefix.clone();

        let property_names = property_name_chain(&registry, &extractor);
        let introspector = self
            .constraint_introspector
            .unwrap_or_else(|| Arc::new(RegistryConstraintIntrospector::new(registry.clone())));
        let property_metadata = property_metadata_chain(&registry, &extractor, introspector, property_names.clone());

        let declarations = ExtractorResourceMetadataCollectionFactory::new(extractor.clone(), config.clone(), None);
        let formats: SharedResourceMetadataCollectionFactory =
            Arc::new(FormatsResourceMetadataCollectionFactory::new(&config, Arc::new(declarations)));
        let resource_names: SharedResourceNameCollectionFactory =
            Arc::new(ExtractorResourceNameCollectionFactory::new(extractor.clone(), None));

        let pipeline = match cache_store {
            Some(store) => {
                let resource_metadata_collection: SharedResourceMetadataCollectionFactory = Arc::new(
                    CachedResourceMetadataCollectionFactory::new(formats, store.clone(), prefix.clone()),
                );
                let legacy = LegacyResourceMetadataFactory::new(resource_metadata_collection.clone());
                MetadataPipeline {
                    property_names: Arc::new(CachedPropertyNameCollectionFactory::new(
                        property_names,
                        store.clone(),
                        prefix.clone(),
                    )),
                    property_metadata: Arc::new(CachedPropertyMetadataFactory::new(
                        property_metadata,
                        store.clone(),
                        prefix.clone(),
                    )),
                    resource_metadata: Arc::new(CachedResourceMetadataFactory::new(
                        Arc::new(legacy),
                        store.clone(),
                        prefix.clone(),
                    )),
                    resource_names: Arc::new(CachedResourceNameCollectionFactory::new(resource_names, store, prefix)),
                    resource_metadata_collection,
                    config: config.clone(),
                    extractor,
                }
            }
            None => MetadataPipeline {
                resource_metadata: Arc::new(LegacyResourceMetadataFactory::new(formats.clone())),
                resource_metadata_collection: formats,
                property_names,
                property_metadata,
                resource_names,
                config: config.clone(),
                extractor,
            },
        };

        info!(
            cache = config.cache.enabled,
            store = ?config.cache.store,
            mapping_paths = config.mapping.paths.len(),
            "metadata pipeline built"
        );
        Ok(pipeline)
    }
}

fn property_name_chain(
    registry: &Arc<ClassRegistry>,
    extractor: &Arc<dyn ResourceExtractor>,
) -> SharedPropertyNameCollectionFactory {
    let reflection = ReflectionPropertyNameCollectionFactory::new(registry.clone());
    Arc::new(ExtractorPropertyNameCollectionFactory::new(extractor.clone(), Some(Arc::new(reflection))))
}

fn property_metadata_chain(
    registry: &Arc<ClassRegistry>,
    extractor: &Arc<dyn ResourceExtractor>,
    introspector: Arc<dyn ConstraintIntrospector>,
    names: SharedPropertyNameCollectionFactory,
) -> SharedPropertyMetadataFactory {
    let reflection = ReflectionPropertyMetadataFactory::new(registry.clone());
    let validator = ValidatorPropertyMetadataFactory::new(introspector, Arc::new(reflection));
    let declared = ExtractorPropertyMetadataFactory::new(extractor.clone(), Some(Arc::new(validator)));
    Arc::new(IdentifierPropertyMetadataFactory::new(extractor.clone(), names, Arc::new(declared)))
}

/// Combines the attribute extractor, the mapping file extractors and any
/// extra sources, in that order.
fn build_extractor(
    config: &MetadataConfig,
    registry: &Arc<ClassRegistry>,
    extra: Vec<Arc<dyn ResourceExtractor>>,
) -> PipelineResult<Arc<dyn ResourceExtractor>> {
    let mut composite = CompositeExtractor::new(vec![Arc::new(AttributeExtractor::new(registry.clone()))]);

    let (yaml, xml) = mapping_files(&config.mapping.paths)?;
    if !yaml.is_empty() {
        composite.push(Arc::new(YamlExtractor::from_paths(&yaml)?));
    }
    if !xml.is_empty() {
        composite.push(Arc::new(XmlExtractor::from_paths(&xml)?));
    }
    for extractor in extra {
        composite.push(extractor);
    }

    Ok(Arc::new(composite))
}

/// Splits the mapping paths into YAML and XML files. Directories are
/// scanned recursively, in file name order.
fn mapping_files(paths: &[PathBuf]) -> PipelineResult<(Vec<PathBuf>, Vec<PathBuf>)> {
    let mut files = Vec::new();
    for path in paths {
        collect_files(path, &mut files)?;
    }

    let mut yaml = Vec::new();
    let mut xml = Vec::new();
    for file in files {
        match file.extension().and_then(|ext| ext.to_str()) {
            Some("yaml" | "yml") => yaml.push(file),
            Some("xml") => xml.push(file),
            _ => debug!(path = %file.display(), "skipping file that is not a mapping"),
        }
    }
    Ok((yaml, xml))
}

fn collect_files(path: &Path, files: &mut Vec<PathBuf>) -> PipelineResult<()> {
    if path.is_file() {
        files.push(path.to_path_buf());
        return Ok(());
    }
    if !path.is_dir() {
        return Err(ExtractError::file_not_found(path).into());
    }

    let mut entries = fs::read_dir(path)
        .map_err(|e| ExtractError::read(path, &e))?
        .map(|entry| entry.map(|entry| entry.path()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ExtractError::read(path, &e))?;
    entries.sort();

    for entry in entries {
        collect_files(&entry, files)?;
    }
    Ok(())
}
