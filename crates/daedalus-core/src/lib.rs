//! # Daedalus Core
//!
//! Core types for the Daedalus resource metadata pipeline.
//!
//! This crate provides the value objects every factory produces or consumes:
//!
//! - [`AttributeMap`] and the [`merge`](attributes::merge) resolver combining declaration layers
//! - [`ClassRegistry`] - Explicit description of the resource classes
//! - [`PropertyMetadata`] and [`PropertyNameCollection`] - Property-level metadata
//! - [`Operation`], [`ApiResource`] and [`ResourceMetadataCollection`] - Resolved resources
//! - [`ResourceMetadata`] - Flat legacy projection of a collection
//! - [`MetadataError`] - Error taxonomy shared by the pipeline

#![doc(html_root_url = "https://docs.rs/daedalus-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod attributes;
pub mod class;
pub mod declaration;
mod error;
pub mod fixtures;
pub mod keys;
pub mod legacy;
pub mod operation;
pub mod property;
pub mod resource;
pub mod types;

pub use attributes::{AttributeMap, Deprecation, MergeOptions};
pub use class::{ClassDescriptor, ClassRegistry, Constraint, MethodDescriptor, PropertyDescriptor};
pub use declaration::{DeclarationSite, ResourceDeclaration};
pub use error::{MetadataError, MetadataResult};
pub use legacy::ResourceMetadata;
pub use operation::{Formats, Operation, OperationKind, PaginationSettings};
pub use property::{
    NameCollection, PropertyMetadata, PropertyNameCollection, PropertyOptions, ResourceNameCollection,
};
pub use resource::{ApiResource, ResourceMetadataCollection};
pub use types::{BuiltinType, Type};
