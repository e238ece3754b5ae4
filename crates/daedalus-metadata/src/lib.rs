//! # Daedalus Metadata
//!
//! Factory chains resolving resource and property metadata.
//!
//! Each kind of metadata is produced by a chain of factories sharing one
//! trait. Every layer calls the layer it decorates, then refines the result:
//!
//! - [`property_name`] - Which properties a class exposes
//! - [`property_metadata`] - Per-property metadata: reflection, validation, declarations, identifiers
//! - [`resource`] - Resource collections, formats, the legacy projection and class discovery
//! - [`cache`] - Cached decorators over any chain
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use daedalus_config::MetadataConfig;
//! use daedalus_core::fixtures::{bookstore_registry, BOOK};
//! use daedalus_extractor::AttributeExtractor;
//! use daedalus_metadata::resource::{
//!     ExtractorResourceMetadataCollectionFactory, FormatsResourceMetadataCollectionFactory,
//! };
//! use daedalus_metadata::ResourceMetadataCollectionFactory;
//!
//! let config = Arc::new(MetadataConfig::default());
//! let extractor = Arc::new(AttributeExtractor::new(Arc::new(bookstore_registry())));
//! let declarations = ExtractorResourceMetadataCollectionFactory::new(extractor, config.clone(), None);
//! let factory = FormatsResourceMetadataCollectionFactory::new(&config, Arc::new(declarations));
//!
//! let collection = factory.create(BOOK).unwrap();
//! let get = collection.get_operation("_api_Book_get").unwrap();
//! assert_eq!(get.uri_template(), Some("/books/{id}{._format}"));
//! ```

#![doc(html_root_url = "https://docs.rs/daedalus-metadata/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod cache;
mod factory;
pub mod property_metadata;
pub mod property_name;
pub mod resource;

pub use cache::{CacheStats, CacheStore, CacheStoreError, MetadataCache, SharedCacheStore};
pub use factory::{
    PropertyMetadataFactory, PropertyNameCollectionFactory, ResourceMetadataCollectionFactory, ResourceMetadataFactory,
    ResourceNameCollectionFactory, SharedPropertyMetadataFactory, SharedPropertyNameCollectionFactory,
    SharedResourceMetadataCollectionFactory, SharedResourceMetadataFactory, SharedResourceNameCollectionFactory,
};
