//! Extraction error types.

use std::path::{Path, PathBuf};

use daedalus_core::MetadataError;
use thiserror::Error;

/// Result type alias using [`ExtractError`].
pub type ExtractResult<T> = Result<T, ExtractError>;

/// Errors raised while reading declaration sources.
///
/// A class without any declaration is not an error: extractors return an
/// empty list for it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExtractError {
    /// A configured declaration file does not exist.
    #[error("declaration file not found: {path}")]
    FileNotFound {
        /// Path that was not found.
        path: PathBuf,
    },

    /// A declaration file exists but could not be read.
    #[error("failed to read declaration file {path}: {message}")]
    Read {
        /// Path that failed.
        path: PathBuf,
        /// Underlying I/O message.
        message: String,
    },

    /// A declaration source is not valid YAML/XML or has the wrong shape.
    #[error("malformed declaration source {origin}: {message}")]
    Malformed {
        /// Source name (file path or `attributes(Class)`).
        origin: String,
        /// What was wrong.
        message: String,
    },

    /// A declared key is not part of the recognised schema.
    #[error("Unknown property {key} on {scope} declaration ({origin})")]
    UnknownProperty {
        /// The offending key.
        key: String,
        /// `resource`, `property` or the XML element holding the key.
        scope: &'static str,
        /// Source name.
        origin: String,
    },

    /// A recognised key holds a value of the wrong shape.
    #[error("invalid value for \"{key}\" ({origin}): {message}")]
    InvalidValue {
        /// The offending key.
        key: String,
        /// Source name.
        origin: String,
        /// What was expected.
        message: String,
    },
}

impl ExtractError {
    /// Create a new file not found error.
    pub fn file_not_found(path: impl AsRef<Path>) -> Self {
        Self::FileNotFound {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Create a new read error.
    pub fn read(path: impl AsRef<Path>, error: &std::io::Error) -> Self {
        Self::Read {
            path: path.as_ref().to_path_buf(),
            message: error.to_string(),
        }
    }

    /// Create a new malformed source error.
    pub fn malformed(origin: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Malformed {
            origin: origin.into(),
            message: message.into(),
        }
    }

    /// Create a new unknown property error.
    pub fn unknown_property(key: impl Into<String>, scope: &'static str, origin: impl Into<String>) -> Self {
        Self::UnknownProperty {
            key: key.into(),
            scope,
            origin: origin.into(),
        }
    }

    /// Create a new invalid value error.
    pub fn invalid_value(key: impl Into<String>, origin: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            origin: origin.into(),
            message: message.into(),
        }
    }
}

impl From<ExtractError> for MetadataError {
    fn from(error: ExtractError) -> Self {
        match error {
            ExtractError::UnknownProperty { .. } | ExtractError::InvalidValue { .. } => {
                MetadataError::invalid_declaration(error.to_string())
            }
            ExtractError::FileNotFound { .. } | ExtractError::Read { .. } | ExtractError::Malformed { .. } => {
                MetadataError::source(error.to_string())
            }
        }
    }
}
