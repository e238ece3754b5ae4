//! # Daedalus Extractor
//!
//! Declaration sources for the Daedalus metadata pipeline.
//!
//! An extractor turns one kind of declaration source into normalised
//! [`ResourceDeclaration`]s and property declarations, without merging
//! anything:
//!
//! - [`AttributeExtractor`] - Source-level attributes recorded in a [`ClassRegistry`](daedalus_core::ClassRegistry)
//! - [`YamlExtractor`] - YAML mapping files
//! - [`XmlExtractor`] - XML mapping files
//! - [`CompositeExtractor`] - Several extractors queried in order
//!
//! ## Example
//!
//! ```
//! use daedalus_extractor::{ResourceExtractor, YamlExtractor};
//!
//! let extractor = YamlExtractor::from_str(
//!     "inline.yaml",
//!     "resources:\n  App\\Entity\\Book:\n    shortName: Book\n",
//! )
//! .unwrap();
//!
//! let declarations = extractor.resources("App\\Entity\\Book").unwrap();
//! assert_eq!(declarations[0].attributes()["short_name"], "Book");
//! assert!(extractor.resources("App\\Entity\\Author").unwrap().is_empty());
//! ```

#![doc(html_root_url = "https://docs.rs/daedalus-extractor/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod attribute;
mod composite;
mod error;
pub mod normalize;
mod xml;
mod yaml;

use std::fmt;

use daedalus_core::{AttributeMap, ResourceDeclaration};
use indexmap::IndexMap;

pub use attribute::AttributeExtractor;
pub use composite::CompositeExtractor;
pub use error::{ExtractError, ExtractResult};
pub use xml::XmlExtractor;
pub use yaml::YamlExtractor;

/// A declaration source.
///
/// Implementations must preserve declaration order: the resources of a class
/// are returned in the order they were declared, since operation priorities
/// are assigned from it. A class without declarations yields empty results,
/// not an error.
pub trait ResourceExtractor: Send + Sync + fmt::Debug {
    /// Returns a name identifying the source in error messages and logs.
    fn name(&self) -> &str;

    /// Returns every class this source declares as a resource, in order.
    fn resource_classes(&self) -> ExtractResult<Vec<String>>;

    /// Returns the resources declared for `class`.
    fn resources(&self, class: &str) -> ExtractResult<Vec<ResourceDeclaration>>;

    /// Returns the property declarations for `class`, keyed by property name.
    fn properties(&self, class: &str) -> ExtractResult<IndexMap<String, AttributeMap>>;
}
