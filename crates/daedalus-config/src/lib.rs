//! Typed global configuration for Daedalus.
//!
//! This crate provides the framework-wide defaults the metadata pipeline reads
//! once at start-up, with support for:
//! - TOML and JSON configuration files
//! - Environment variable overrides
//! - Strict validation (fails on unknown fields and unknown default attributes)
//! - Layered configuration (defaults → files → env)
//!
//! # Overview
//!
//! [`MetadataConfig`] holds every section:
//!
//! - `defaults` - free-form resource attributes applied below every declaration
//! - [`PaginationConfig`] - page size and client controls
//! - `formats` / `patch_formats` - format names and their mime types
//! - [`CacheHeadersConfig`] - HTTP cache headers
//! - [`MappingConfig`] - YAML/XML declaration files
//! - [`NamingConfig`] - URI path segments and format suffix
//! - [`CacheConfig`] - metadata cache store
//! - [`LoggingConfig`] - log level and format
//!
//! # Example
//!
//! ```no_run
//! use daedalus_config::{ConfigLoader, MetadataConfig};
//!
//! # fn main() -> Result<(), daedalus_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_defaults()
//!     .with_file("metadata.toml")?
//!     .with_env_prefix("DAEDALUS")
//!     .load()?;
//!
//! println!("Page size: {}", config.pagination.items_per_page);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [defaults]
//! normalizationContext = { groups = ["read"] }
//!
//! [pagination]
//! items_per_page = 30
//! client_items_per_page = true
//! maximum_items_per_page = 100
//!
//! [formats]
//! jsonld = ["application/ld+json"]
//! json = ["application/json"]
//!
//! [mapping]
//! paths = ["config/resources"]
//!
//! [naming]
//! path_segment = "dash"
//!
//! [cache]
//! store = "filesystem"
//! directory = "var/cache/metadata"
//! ```
//!
//! # Environment Variable Overrides
//!
//! Values can be overridden via environment variables using the format
//! `PREFIX__SECTION__KEY`. For example:
//!
//! - `DAEDALUS__PAGINATION__ITEMS_PER_PAGE=50`
//! - `DAEDALUS__CACHE__ENABLED=false`
//! - `DAEDALUS__LOGGING__FORMAT=pretty`

#![warn(missing_docs)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::*;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MetadataConfig::default();
        assert_eq!(config.pagination.items_per_page, 30);
        assert!(config.naming.format_suffix);
    }

    #[test]
    fn test_config_builder() {
        let config = MetadataConfig::builder()
            .naming(NamingConfig {
                path_segment: PathSegmentStrategy::Dash,
                ..Default::default()
            })
            .build();

        assert_eq!(config.naming.path_segment, PathSegmentStrategy::Dash);
    }
}
