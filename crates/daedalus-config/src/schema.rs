//! Configuration schema types.
//!
//! This module defines the structure of all configuration sections.

use std::path::PathBuf;

use daedalus_telemetry::LogConfig;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Pagination section.
///
/// These values become the `pagination_*` attributes every resource inherits
/// unless its declaration says otherwise.
///
/// # Example
///
/// ```
/// use daedalus_config::PaginationConfig;
///
/// let config = PaginationConfig {
///     items_per_page: 50,
///     ..Default::default()
/// };
/// assert!(config.enabled);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PaginationConfig {
    /// Paginate collections.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Let clients switch pagination on or off.
    #[serde(default)]
    pub client_enabled: bool,

    /// Let clients choose the page size.
    #[serde(default)]
    pub client_items_per_page: bool,

    /// Page size.
    #[serde(default = "default_items_per_page")]
    pub items_per_page: u64,

    /// Upper bound for a client-chosen page size.
    #[serde(default)]
    pub maximum_items_per_page: Option<u64>,

    /// Skip total counts.
    #[serde(default)]
    pub partial: bool,

    /// Let clients request partial pagination.
    #[serde(default)]
    pub client_partial: bool,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            client_enabled: false,
            client_items_per_page: false,
            items_per_page: default_items_per_page(),
            maximum_items_per_page: None,
            partial: false,
            client_partial: false,
        }
    }
}

fn default_items_per_page() -> u64 {
    30
}

/// HTTP cache headers applied to every operation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CacheHeadersConfig {
    /// `max-age` directive in seconds.
    #[serde(default)]
    pub max_age: Option<u64>,

    /// `s-maxage` directive in seconds.
    #[serde(default)]
    pub shared_max_age: Option<u64>,

    /// Headers listed in `Vary`.
    #[serde(default = "default_vary")]
    pub vary: Vec<String>,

    /// `public` (true) or `private` (false); unset emits neither.
    #[serde(default)]
    pub public: Option<bool>,
}

impl Default for CacheHeadersConfig {
    fn default() -> Self {
        Self {
            max_age: None,
            shared_max_age: None,
            vary: default_vary(),
            public: None,
        }
    }
}

fn default_vary() -> Vec<String> {
    vec!["Content-Type".to_string(), "Authorization".to_string(), "Origin".to_string()]
}

/// Declaration files read by the YAML and XML extractors.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct MappingConfig {
    /// Files or directories; directories are scanned for `.yaml`, `.yml` and `.xml` files.
    #[serde(default)]
    pub paths: Vec<PathBuf>,
}

/// How a short name becomes a URI path segment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PathSegmentStrategy {
    /// `BookReview` → `book_reviews`.
    #[default]
    Underscore,
    /// `BookReview` → `book-reviews`.
    Dash,
}

/// Operation naming and URI generation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct NamingConfig {
    /// Path segment generator.
    #[serde(default)]
    pub path_segment: PathSegmentStrategy,

    /// Append `{._format}` to generated URI templates.
    #[serde(default = "default_true")]
    pub format_suffix: bool,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            path_segment: PathSegmentStrategy::default(),
            format_suffix: true,
        }
    }
}

/// Cache store backing the cached factories.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CacheStoreKind {
    /// Process-local map.
    #[default]
    Memory,
    /// One JSON file per key under `cache.directory`.
    Filesystem,
    /// Never stores anything; only the per-process layer remains.
    None,
}

/// Metadata cache section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    /// Wrap the factory chains with cached decorators.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Store kind.
    #[serde(default)]
    pub store: CacheStoreKind,

    /// Directory for the filesystem store.
    #[serde(default)]
    pub directory: Option<PathBuf>,

    /// Extra key prefix, useful when several applications share a store.
    #[serde(default)]
    pub prefix: Option<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            store: CacheStoreKind::default(),
            directory: None,
            prefix: None,
        }
    }
}

/// Log format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON formatted logs (production).
    #[default]
    Json,
    /// Human-readable pretty format (development).
    Pretty,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Log level or filter directive.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include source file and line in logs.
    #[serde(default)]
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
            include_location: false,
        }
    }
}

impl LoggingConfig {
    /// Converts this section into the telemetry crate's logging settings.
    pub fn to_log_config(&self) -> LogConfig {
        LogConfig {
            enabled: self.enabled,
            level: self.level.clone(),
            json_format: self.format == LogFormat::Json,
            span_events: false,
            file_line_info: self.include_location,
            include_target: true,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

pub(crate) fn default_formats() -> IndexMap<String, Vec<String>> {
    IndexMap::from([
        ("jsonld".to_string(), vec!["application/ld+json".to_string()]),
        ("json".to_string(), vec!["application/json".to_string()]),
        ("html".to_string(), vec!["text/html".to_string()]),
    ])
}

pub(crate) fn default_patch_formats() -> IndexMap<String, Vec<String>> {
    IndexMap::from([("json".to_string(), vec!["application/merge-patch+json".to_string()])])
}

pub(crate) fn default_exception_to_status() -> IndexMap<String, u16> {
    IndexMap::from([
        ("invalid_argument".to_string(), 400),
        ("filter_validation".to_string(), 400),
        ("optimistic_lock".to_string(), 409),
    ])
}

pub(crate) fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_default() {
        let config = PaginationConfig::default();
        assert!(config.enabled);
        assert!(!config.client_enabled);
        assert_eq!(config.items_per_page, 30);
        assert_eq!(config.maximum_items_per_page, None);
    }

    #[test]
    fn test_pagination_deserialize_partial() {
        let config: PaginationConfig = toml::from_str("items_per_page = 10").unwrap();
        assert_eq!(config.items_per_page, 10);
        assert!(config.enabled);
    }

    #[test]
    fn test_pagination_unknown_field_rejected() {
        let result: Result<PaginationConfig, _> = toml::from_str("page_size = 10");
        assert!(result.is_err());
    }

    #[test]
    fn test_cache_headers_default_vary() {
        let config = CacheHeadersConfig::default();
        assert_eq!(config.vary, vec!["Content-Type", "Authorization", "Origin"]);
        assert_eq!(config.max_age, None);
    }

    #[test]
    fn test_path_segment_deserialize() {
        let config: NamingConfig = toml::from_str(r#"path_segment = "dash""#).unwrap();
        assert_eq!(config.path_segment, PathSegmentStrategy::Dash);
        assert!(config.format_suffix);
    }

    #[test]
    fn test_cache_store_deserialize() {
        let config: CacheConfig = toml::from_str(
            r#"
            store = "filesystem"
            directory = "/var/cache/daedalus"
            "#,
        )
        .unwrap();
        assert_eq!(config.store, CacheStoreKind::Filesystem);
        assert_eq!(config.directory, Some(PathBuf::from("/var/cache/daedalus")));
        assert!(config.enabled);
    }

    #[test]
    fn test_logging_to_log_config() {
        let logging = LoggingConfig {
            level: "daedalus=debug".to_string(),
            format: LogFormat::Pretty,
            include_location: true,
            ..Default::default()
        };

        let log = logging.to_log_config();
        assert_eq!(log.level, "daedalus=debug");
        assert!(!log.json_format);
        assert!(log.file_line_info);
    }

    #[test]
    fn test_default_formats_order() {
        let formats = default_formats();
        assert_eq!(formats.keys().collect::<Vec<_>>(), vec!["jsonld", "json", "html"]);
    }
}
