//! Error types for metadata resolution.
//!
//! This module provides the [`MetadataError`] type, returned by every factory
//! in the pipeline. The variants follow the taxonomy consumers rely on:
//!
//! | Variant | Meaning | Typical translation |
//! |---|---|---|
//! | `ResourceClassNotFound` | No declaration for the class anywhere in the chain | 404 / schema skip |
//! | `PropertyNotFound` | No declaration for the property | 404 / schema skip |
//! | `OperationNotFound` | Lookup of an unknown operation name | 404 |
//! | `InvalidDeclaration` | Malformed or unrecognised declared key/value, name collisions | 500 |
//! | `Source` | A declaration source could not be read or parsed | 500 |
//!
//! Cache store failures never surface as a `MetadataError`.

use thiserror::Error;

/// Result type alias using [`MetadataError`].
pub type MetadataResult<T> = Result<T, MetadataError>;

/// Errors produced while resolving resource and property metadata.
///
/// # Example
///
/// ```
/// use daedalus_core::MetadataError;
///
/// let err = MetadataError::resource_class_not_found("App\\Entity\\Book");
/// assert!(err.is_not_found());
/// assert!(err.to_string().contains("App\\Entity\\Book"));
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MetadataError {
    /// The resource class has no declaration anywhere in the chain.
    #[error("resource class \"{class}\" not found")]
    ResourceClassNotFound {
        /// The requested class name.
        class: String,
    },

    /// The property has no declaration anywhere in the chain.
    #[error("property \"{property}\" of class \"{class}\" not found")]
    PropertyNotFound {
        /// The class owning the property.
        class: String,
        /// The requested property name.
        property: String,
    },

    /// No operation with the given name exists in the collection.
    #[error("operation \"{name}\" not found for resource class \"{class}\"")]
    OperationNotFound {
        /// The resource class.
        class: String,
        /// The requested operation name.
        name: String,
    },

    /// A declaration is malformed, uses an unknown key, or collides with another one.
    #[error("invalid declaration: {0}")]
    InvalidDeclaration(String),

    /// A declaration source (file, registry) could not be read or parsed.
    #[error("declaration source error: {0}")]
    Source(String),
}

impl MetadataError {
    /// Create a new resource class not found error.
    pub fn resource_class_not_found(class: impl Into<String>) -> Self {
        Self::ResourceClassNotFound {
            class: class.into(),
        }
    }

    /// Create a new property not found error.
    pub fn property_not_found(class: impl Into<String>, property: impl Into<String>) -> Self {
        Self::PropertyNotFound {
            class: class.into(),
            property: property.into(),
        }
    }

    /// Create a new operation not found error.
    pub fn operation_not_found(class: impl Into<String>, name: impl Into<String>) -> Self {
        Self::OperationNotFound {
            class: class.into(),
            name: name.into(),
        }
    }

    /// Create a new invalid declaration error.
    pub fn invalid_declaration(message: impl Into<String>) -> Self {
        Self::InvalidDeclaration(message.into())
    }

    /// Create a new source error.
    pub fn source(message: impl Into<String>) -> Self {
        Self::Source(message.into())
    }

    /// Returns true for the not-found family of errors.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ResourceClassNotFound { .. }
                | Self::PropertyNotFound { .. }
                | Self::OperationNotFound { .. }
        )
    }

    /// Returns true when the class itself could not be resolved.
    #[must_use]
    pub fn is_resource_class_not_found(&self) -> bool {
        matches!(self, Self::ResourceClassNotFound { .. })
    }
}
