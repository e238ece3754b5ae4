//! Factory traits.
//!
//! Each trait is one link of a chain: an implementation usually holds an
//! `Arc<dyn Trait>` to the factory it decorates and refines its answer. The
//! chains are assembled once at start-up and shared across threads.

use std::fmt;
use std::sync::Arc;

use daedalus_core::{
    MetadataResult, PropertyMetadata, PropertyNameCollection, PropertyOptions, ResourceMetadata,
    ResourceMetadataCollection, ResourceNameCollection,
};

/// Lists the property names of a class.
pub trait PropertyNameCollectionFactory: Send + Sync + fmt::Debug {
    /// Returns the factory name for logs and metrics.
    fn name(&self) -> &'static str;

    /// Returns the property names of `class`, in discovery order.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::ResourceClassNotFound`](daedalus_core::MetadataError::ResourceClassNotFound)
    /// when no layer knows the class.
    fn create(&self, class: &str, options: &PropertyOptions) -> MetadataResult<PropertyNameCollection>;
}

/// Resolves the metadata of one property.
pub trait PropertyMetadataFactory: Send + Sync + fmt::Debug {
    /// Returns the factory name for logs and metrics.
    fn name(&self) -> &'static str;

    /// Returns the metadata of `property` on `class`.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::PropertyNotFound`](daedalus_core::MetadataError::PropertyNotFound)
    /// when no layer knows the property.
    fn create(&self, class: &str, property: &str, options: &PropertyOptions) -> MetadataResult<PropertyMetadata>;
}

/// Resolves every resource declared on a class.
pub trait ResourceMetadataCollectionFactory: Send + Sync + fmt::Debug {
    /// Returns the factory name for logs and metrics.
    fn name(&self) -> &'static str;

    /// Returns the resources of `class`.
    fn create(&self, class: &str) -> MetadataResult<ResourceMetadataCollection>;
}

/// Resolves the legacy single-resource view of a class.
pub trait ResourceMetadataFactory: Send + Sync + fmt::Debug {
    /// Returns the factory name for logs and metrics.
    fn name(&self) -> &'static str;

    /// Returns the legacy metadata of `class`.
    fn create(&self, class: &str) -> MetadataResult<ResourceMetadata>;
}

/// Lists every resource class.
pub trait ResourceNameCollectionFactory: Send + Sync + fmt::Debug {
    /// Returns the factory name for logs and metrics.
    fn name(&self) -> &'static str;

    /// Returns the resource class names, in declaration order.
    fn create(&self) -> MetadataResult<ResourceNameCollection>;
}

/// Shared handle to a property name factory.
pub type SharedPropertyNameCollectionFactory = Arc<dyn PropertyNameCollectionFactory>;
/// Shared handle to a property metadata factory.
pub type SharedPropertyMetadataFactory = Arc<dyn PropertyMetadataFactory>;
/// Shared handle to a resource collection factory.
pub type SharedResourceMetadataCollectionFactory = Arc<dyn ResourceMetadataCollectionFactory>;
/// Shared handle to a legacy resource factory.
pub type SharedResourceMetadataFactory = Arc<dyn ResourceMetadataFactory>;
/// Shared handle to a resource name factory.
pub type SharedResourceNameCollectionFactory = Arc<dyn ResourceNameCollectionFactory>;
