//! # Daedalus
//!
//! **Resource and property metadata for API frameworks**
//!
//! Daedalus answers, for any resource class, which operations it exposes,
//! under which URIs, with which serialization contexts, formats, security
//! expressions and pagination settings, and, per property, its readability,
//! writability, types, identifier status, validation-derived restrictions and
//! documentation. Declarations come from source-level attributes, YAML and
//! XML mapping files and configured defaults, merged layer over layer.
//!
//! ## Quick Start
//!
//! ```
//! use daedalus::prelude::*;
//! use daedalus_core::fixtures::{bookstore_registry, BOOK};
//!
//! let pipeline = MetadataPipeline::builder()
//!     .config(MetadataConfig::default())
//!     .registry(bookstore_registry())
//!     .build()?;
//!
//! let books = pipeline.resource_metadata_collection().create(BOOK)?;
//! let get = books.get_operation("_api_Book_get")?;
//! assert_eq!(get.uri_template(), Some("/books/{id}{._format}"));
//!
//! let title = pipeline.property_metadata().create(BOOK, "title", &PropertyOptions::new())?;
//! assert!(title.is_required());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! Each kind of metadata is resolved by a chain of decorators, outermost
//! first:
//!
//! ```text
//! property names:    cache → declarations → reflection
//! property metadata: cache → identifier → declarations → validation → reflection
//! resources:         cache → formats → declarations (defaults, names, URI templates)
//! legacy resources:  cache → projection of the resource chain
//! ```

#![doc(html_root_url = "https://docs.rs/daedalus/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod pipeline;

pub use error::{PipelineError, PipelineResult};
pub use pipeline::{MetadataPipeline, MetadataPipelineBuilder, WarmUpReport};

// Re-export core types
pub use daedalus_core as core;

// Re-export configuration
pub use daedalus_config as config;

// Re-export declaration sources
pub use daedalus_extractor as extractor;

// Re-export factory chains
pub use daedalus_metadata as metadata;

// Re-export logging and metrics
pub use daedalus_telemetry as telemetry;

pub use daedalus_metadata::{
    PropertyMetadataFactory, PropertyNameCollectionFactory, ResourceMetadataCollectionFactory, ResourceMetadataFactory,
    ResourceNameCollectionFactory,
};

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```
/// use daedalus::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{MetadataPipeline, PipelineError, PipelineResult, WarmUpReport};

    pub use daedalus_config::{ConfigLoader, MetadataConfig};

    pub use daedalus_core::{
        ApiResource, ClassDescriptor, ClassRegistry, MetadataError, MetadataResult, Operation, OperationKind,
        PropertyMetadata, PropertyOptions, ResourceMetadata, ResourceMetadataCollection,
    };

    pub use daedalus_extractor::ResourceExtractor;

    pub use daedalus_metadata::{
        PropertyMetadataFactory, PropertyNameCollectionFactory, ResourceMetadataCollectionFactory,
        ResourceMetadataFactory, ResourceNameCollectionFactory,
    };

    pub use daedalus_telemetry::{init_logging, LogConfig};
}
