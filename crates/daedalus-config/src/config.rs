//! Main configuration types.
//!
//! This module provides the top-level [`MetadataConfig`] struct and its builder.

use daedalus_core::attributes::{canonicalize, merge};
use daedalus_core::keys::is_resource_key;
use daedalus_core::AttributeMap;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::schema::{default_exception_to_status, default_formats, default_patch_formats};
use crate::{
    CacheConfig, CacheHeadersConfig, CacheStoreKind, ConfigError, LogFormat, LoggingConfig, MappingConfig,
    NamingConfig, PaginationConfig,
};

/// Framework-wide defaults for the metadata pipeline.
///
/// Supplied once at start-up and passed by reference into the factories.
/// Use [`ConfigLoader`](crate::ConfigLoader) to load it from files and the
/// environment.
///
/// # Example
///
/// ```
/// use daedalus_config::MetadataConfig;
///
/// let config = MetadataConfig::default();
/// assert_eq!(config.default_attributes()["pagination_items_per_page"], 30);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct MetadataConfig {
    /// Free-form resource attributes applied below every declaration.
    #[serde(default)]
    pub defaults: Map<String, Value>,

    /// Pagination defaults.
    #[serde(default)]
    pub pagination: PaginationConfig,

    /// Format name to mime types.
    #[serde(default = "default_formats")]
    pub formats: IndexMap<String, Vec<String>>,

    /// Formats accepted by PATCH operations.
    #[serde(default = "default_patch_formats")]
    pub patch_formats: IndexMap<String, Vec<String>>,

    /// Cache headers.
    #[serde(default)]
    pub cache_headers: CacheHeadersConfig,

    /// Error kind to HTTP status, read by the HTTP layer.
    #[serde(default = "default_exception_to_status")]
    pub exception_to_status: IndexMap<String, u16>,

    /// Declaration files.
    #[serde(default)]
    pub mapping: MappingConfig,

    /// Naming and URI generation.
    #[serde(default)]
    pub naming: NamingConfig,

    /// Metadata cache.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Logging.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            defaults: Map::new(),
            pagination: PaginationConfig::default(),
            formats: default_formats(),
            patch_formats: default_patch_formats(),
            cache_headers: CacheHeadersConfig::default(),
            exception_to_status: default_exception_to_status(),
            mapping: MappingConfig::default(),
            naming: NamingConfig::default(),
            cache: CacheConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl MetadataConfig {
    /// Create a new configuration builder.
    ///
    /// # Example
    ///
    /// ```
    /// use daedalus_config::{MetadataConfig, PaginationConfig};
    ///
    /// let config = MetadataConfig::builder()
    ///     .pagination(PaginationConfig {
    ///         items_per_page: 10,
    ///         ..Default::default()
    ///     })
    ///     .build();
    ///
    /// assert_eq!(config.pagination.items_per_page, 10);
    /// ```
    #[must_use]
    pub fn builder() -> MetadataConfigBuilder {
        MetadataConfigBuilder::new()
    }

    /// The lowest-priority attribute layer of every resource.
    ///
    /// Pagination and cache headers come first; the `defaults` section is
    /// merged over them with canonicalised keys, so an explicit `null` there
    /// removes a generated default.
    pub fn default_attributes(&self) -> AttributeMap {
        let pagination = &self.pagination;
        let mut attributes = AttributeMap::new();
        attributes.insert("pagination_enabled".to_string(), json!(pagination.enabled));
        attributes.insert("pagination_client_enabled".to_string(), json!(pagination.client_enabled));
        attributes.insert(
            "pagination_client_items_per_page".to_string(),
            json!(pagination.client_items_per_page),
        );
        attributes.insert("pagination_items_per_page".to_string(), json!(pagination.items_per_page));
        if let Some(maximum) = pagination.maximum_items_per_page {
            attributes.insert("pagination_maximum_items_per_page".to_string(), json!(maximum));
        }
        attributes.insert("pagination_partial".to_string(), json!(pagination.partial));
        attributes.insert("pagination_client_partial".to_string(), json!(pagination.client_partial));

        let cache_headers = self.cache_headers_attribute();
        if !cache_headers.is_empty() {
            attributes.insert("cache_headers".to_string(), Value::Object(cache_headers));
        }

        merge(&attributes, &canonicalize(&self.defaults))
    }

    fn cache_headers_attribute(&self) -> Map<String, Value> {
        let headers = &self.cache_headers;
        let mut map = Map::new();
        if let Some(max_age) = headers.max_age {
            map.insert("max_age".to_string(), json!(max_age));
        }
        if let Some(shared_max_age) = headers.shared_max_age {
            map.insert("shared_max_age".to_string(), json!(shared_max_age));
        }
        if !headers.vary.is_empty() {
            map.insert("vary".to_string(), json!(headers.vary));
        }
        if let Some(public) = headers.public {
            map.insert("public".to_string(), json!(public));
        }
        map
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - `defaults` holds a key that is not a recognised resource attribute
    /// - The page size is zero or above the configured maximum
    /// - No format is configured, or a format has no mime type
    /// - A status code is outside 100..=599
    /// - The filesystem cache store has no directory
    /// - The log level is not a valid filter directive
    pub fn validate(&self) -> Result<(), ConfigError> {
        for key in self.defaults.keys() {
            let canonical = daedalus_core::attributes::canonical_key(key);
            if !is_resource_key(&canonical) {
                return Err(ConfigError::unknown_field(canonical, "defaults"));
            }
        }

        if self.pagination.items_per_page == 0 {
            return Err(ConfigError::invalid_value(
                "pagination.items_per_page",
                "must be greater than zero",
            ));
        }
        if let Some(maximum) = self.pagination.maximum_items_per_page {
            if maximum < self.pagination.items_per_page {
                return Err(ConfigError::invalid_value(
                    "pagination.maximum_items_per_page",
                    format!("must be at least items_per_page ({})", self.pagination.items_per_page),
                ));
            }
        }

        if self.formats.is_empty() {
            return Err(ConfigError::validation_error("at least one format must be configured"));
        }
        for (name, mime_types) in self.formats.iter().chain(&self.patch_formats) {
            if mime_types.is_empty() {
                return Err(ConfigError::invalid_value(
                    format!("formats.{name}"),
                    "at least one mime type is required",
                ));
            }
        }

        for (kind, status) in &self.exception_to_status {
            if !(100..=599).contains(status) {
                return Err(ConfigError::invalid_value(
                    format!("exception_to_status.{kind}"),
                    format!("{status} is not an HTTP status code"),
                ));
            }
        }

        if self.cache.enabled && self.cache.store == CacheStoreKind::Filesystem && self.cache.directory.is_none() {
            return Err(ConfigError::validation_error(
                "cache.directory must be set when cache.store is 'filesystem'",
            ));
        }

        if self.logging.enabled {
            daedalus_telemetry::logging::create_env_filter(&self.logging.level)
                .map_err(|e| ConfigError::invalid_value("logging.level", e.to_string()))?;
        }

        Ok(())
    }

    /// Create a development configuration preset.
    ///
    /// This preset is optimized for local development with:
    /// - Pretty log formatting at debug level
    /// - Metadata caching disabled
    ///
    /// # Example
    ///
    /// ```
    /// use daedalus_config::MetadataConfig;
    ///
    /// let config = MetadataConfig::development();
    /// assert_eq!(config.logging.level, "debug");
    /// assert!(!config.cache.enabled);
    /// ```
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();

        config.logging.level = "debug".to_string();
        config.logging.format = LogFormat::Pretty;
        config.logging.include_location = true;

        config.cache.enabled = false;

        config
    }

    /// Create a production configuration preset.
    ///
    /// JSON logs at info level, cached metadata in the in-memory store.
    ///
    /// # Example
    ///
    /// ```
    /// use daedalus_config::{LogFormat, MetadataConfig};
    ///
    /// let config = MetadataConfig::production();
    /// assert_eq!(config.logging.format, LogFormat::Json);
    /// ```
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();

        config.logging.level = "info".to_string();
        config.logging.format = LogFormat::Json;

        config.cache.enabled = true;
        config.cache.store = CacheStoreKind::Memory;

        config
    }
}

/// Builder for [`MetadataConfig`].
#[derive(Debug, Default)]
pub struct MetadataConfigBuilder {
    defaults: Map<String, Value>,
    pagination: Option<PaginationConfig>,
    formats: Option<IndexMap<String, Vec<String>>>,
    mapping: Option<MappingConfig>,
    naming: Option<NamingConfig>,
    cache: Option<CacheConfig>,
    logging: Option<LoggingConfig>,
}

impl MetadataConfigBuilder {
    /// Create a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one entry to the `defaults` section.
    #[must_use]
    pub fn default_attribute(mut self, key: impl Into<String>, value: Value) -> Self {
        self.defaults.insert(key.into(), value);
        self
    }

    /// Set the pagination configuration.
    #[must_use]
    pub fn pagination(mut self, pagination: PaginationConfig) -> Self {
        self.pagination = Some(pagination);
        self
    }

    /// Replace the configured formats.
    #[must_use]
    pub fn formats(mut self, formats: IndexMap<String, Vec<String>>) -> Self {
        self.formats = Some(formats);
        self
    }

    /// Set the mapping configuration.
    #[must_use]
    pub fn mapping(mut self, mapping: MappingConfig) -> Self {
        self.mapping = Some(mapping);
        self
    }

    /// Set the naming configuration.
    #[must_use]
    pub fn naming(mut self, naming: NamingConfig) -> Self {
        self.naming = Some(naming);
        self
    }

    /// Set the cache configuration.
    #[must_use]
    pub fn cache(mut self, cache: CacheConfig) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Set the logging configuration.
    #[must_use]
    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = Some(logging);
        self
    }

    /// Build the configuration.
    ///
    /// Any unset sections will use their default values.
    #[must_use]
    pub fn build(self) -> MetadataConfig {
        MetadataConfig {
            defaults: self.defaults,
            pagination: self.pagination.unwrap_or_default(),
            formats: self.formats.unwrap_or_else(default_formats),
            mapping: self.mapping.unwrap_or_default(),
            naming: self.naming.unwrap_or_default(),
            cache: self.cache.unwrap_or_default(),
            logging: self.logging.unwrap_or_default(),
            ..MetadataConfig::default()
        }
    }

    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if validation fails.
    pub fn build_validated(self) -> Result<MetadataConfig, ConfigError> {
        let config = self.build();
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_default_config() {
        let config = MetadataConfig::default();
        assert_eq!(config.pagination.items_per_page, 30);
        assert_eq!(config.formats["jsonld"], vec!["application/ld+json"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_attributes_from_pagination() {
        let attributes = MetadataConfig::default().default_attributes();
        assert_eq!(attributes["pagination_items_per_page"], json!(30));
        assert_eq!(attributes["pagination_enabled"], json!(true));
        assert!(!attributes.contains_key("pagination_maximum_items_per_page"));
        assert_eq!(
            attributes["cache_headers"],
            json!({"vary": ["Content-Type", "Authorization", "Origin"]})
        );
    }

    #[test]
    fn test_defaults_section_overrides_generated_attributes() {
        let config = MetadataConfig::builder()
            .default_attribute("paginationItemsPerPage", json!(12))
            .default_attribute("cache_headers", Value::Null)
            .default_attribute("security", json!("is_granted('ROLE_USER')"))
            .build();

        let attributes = config.default_attributes();
        assert_eq!(attributes["pagination_items_per_page"], json!(12));
        assert!(!attributes.contains_key("cache_headers"));
        assert_eq!(attributes["security"], json!("is_granted('ROLE_USER')"));
    }

    #[test]
    fn test_validate_unknown_default_key() {
        let config = MetadataConfig::builder()
            .default_attribute("itemsPerPage", json!(10))
            .build();

        match config.validate() {
            Err(ConfigError::UnknownField { field, section }) => {
                assert_eq!(field, "items_per_page");
                assert_eq!(section, "defaults");
            }
            other => panic!("expected unknown field, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_deprecated_default_key_accepted() {
        let config = MetadataConfig::builder()
            .default_attribute("accessControl", json!("is_granted('ROLE_USER')"))
            .build();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_page_size() {
        let config = MetadataConfig::builder()
            .pagination(PaginationConfig {
                items_per_page: 0,
                ..Default::default()
            })
            .build();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_validate_maximum_below_page_size() {
        let config = MetadataConfig::builder()
            .pagination(PaginationConfig {
                items_per_page: 50,
                maximum_items_per_page: Some(20),
                ..Default::default()
            })
            .build();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_empty_mime_types() {
        let config = MetadataConfig::builder()
            .formats(IndexMap::from([("csv".to_string(), Vec::new())]))
            .build();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("formats.csv"));
    }

    #[test]
    fn test_validate_filesystem_store_without_directory() {
        let mut config = MetadataConfig::default();
        config.cache.store = CacheStoreKind::Filesystem;
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError(_))));

        config.cache.directory = Some(PathBuf::from("/var/cache/daedalus"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_status_code_range() {
        let mut config = MetadataConfig::default();
        config.exception_to_status.insert("teapot".to_string(), 999);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_development_preset() {
        let config = MetadataConfig::development();
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert!(config.logging.include_location);
        assert!(!config.cache.enabled);
    }

    #[test]
    fn test_production_preset() {
        let config = MetadataConfig::production();
        assert_eq!(config.logging.level, "info");
        assert!(config.cache.enabled);
        assert_eq!(config.cache.store, CacheStoreKind::Memory);
    }

    #[test]
    fn test_toml_deserialization() {
        let toml_str = r#"
            [defaults]
            normalizationContext = { groups = ["read"] }

            [pagination]
            items_per_page = 15

            [formats]
            jsonld = ["application/ld+json"]
        "#;

        let config: MetadataConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.pagination.items_per_page, 15);
        assert_eq!(config.formats.len(), 1);
        assert_eq!(
            config.default_attributes()["normalization_context"],
            json!({"groups": ["read"]})
        );
    }

    #[test]
    fn test_unknown_field_rejected() {
        let toml_str = r#"
            [naming]
            path_segment = "dash"
            pluralize = false
        "#;

        let result: Result<MetadataConfig, _> = toml::from_str(toml_str);
        assert!(result.is_err());
    }
}
