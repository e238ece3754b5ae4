//! Resource metadata factories.
//!
//! The collection chain runs, innermost first:
//!
//! 1. [`ExtractorResourceMetadataCollectionFactory`] - declarations, defaults, names, URI templates
//! 2. [`FormatsResourceMetadataCollectionFactory`] - format names to mime types
//!
//! [`LegacyResourceMetadataFactory`] projects the resolved collection onto the
//! flat legacy shape, and [`ExtractorResourceNameCollectionFactory`] lists the
//! declared classes.

mod extractor;
mod formats;
mod legacy;
pub mod naming;
mod names;

pub use extractor::ExtractorResourceMetadataCollectionFactory;
pub use formats::FormatsResourceMetadataCollectionFactory;
pub use legacy::LegacyResourceMetadataFactory;
pub use names::ExtractorResourceNameCollectionFactory;
