//! Pipeline errors.

use daedalus_config::ConfigError;
use daedalus_core::MetadataError;
use daedalus_extractor::ExtractError;
use daedalus_metadata::CacheStoreError;
use thiserror::Error;

/// Result type alias using [`PipelineError`].
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Errors raised while building or warming a [`MetadataPipeline`](crate::MetadataPipeline).
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A mapping file could not be read or parsed.
    #[error(transparent)]
    Extract(#[from] ExtractError),

    /// The configured cache store cannot be built.
    #[error(transparent)]
    CacheStore(#[from] CacheStoreError),

    /// Metadata resolution failed during warm-up.
    #[error(transparent)]
    Metadata(#[from] MetadataError),
}
