//! Property metadata factories.
//!
//! The chain runs, innermost first:
//!
//! 1. [`ReflectionPropertyMetadataFactory`] - readability, types, defaults
//! 2. [`ValidatorPropertyMetadataFactory`] - required flag, IRIs, schema restrictions
//! 3. [`ExtractorPropertyMetadataFactory`] - declared overrides
//! 4. [`IdentifierPropertyMetadataFactory`] - identifier detection
//!
//! and is usually wrapped by a cache decorator. Every layer keeps the fields
//! it does not decide.

mod extractor;
mod identifier;
mod reflection;
pub mod restriction;
mod validator;

pub use extractor::ExtractorPropertyMetadataFactory;
pub use identifier::IdentifierPropertyMetadataFactory;
pub use reflection::ReflectionPropertyMetadataFactory;
pub use restriction::{RestrictionResolver, SchemaFragment};
pub use validator::{ConstraintIntrospector, RegistryConstraintIntrospector, ValidatorPropertyMetadataFactory};
