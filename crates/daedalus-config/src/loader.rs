//! Configuration loader with layered approach.
//!
//! This module provides the [`ConfigLoader`] for loading configuration from
//! multiple sources: defaults, files, and environment variables.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::{CacheStoreKind, ConfigError, LogFormat, MetadataConfig, PathSegmentStrategy};

/// Sections whose map replaces the previous layer instead of being merged into it.
const REPLACED_SECTIONS: &[&str] = &["defaults", "formats", "patch_formats", "exception_to_status"];

/// Configuration loader with layered approach.
///
/// The loader applies configuration in layers, with later layers overriding
/// earlier ones:
/// 1. Default values (built into the code)
/// 2. Configuration files (TOML or JSON), in the order they are added
/// 3. Environment variables
///
/// Within a section a later layer only overrides the keys it sets, except
/// for the map-valued sections (`defaults`, `formats`, `patch_formats`,
/// `exception_to_status`), which are replaced as a whole.
///
/// # Example
///
/// ```no_run
/// use daedalus_config::ConfigLoader;
///
/// # fn main() -> Result<(), daedalus_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_defaults()
///     .with_file("metadata.toml")?
///     .with_env_prefix("DAEDALUS")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: MetadataConfig,
    env_prefix: Option<String>,
    files: Vec<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new configuration loader.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: MetadataConfig::default(),
            env_prefix: None,
            files: Vec::new(),
        }
    }

    /// Start with default configuration values.
    ///
    /// This is called automatically by `new()`, but can be chained for clarity.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.config = MetadataConfig::default();
        self
    }

    /// Start with development preset configuration.
    ///
    /// # Example
    ///
    /// ```
    /// use daedalus_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_development()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = MetadataConfig::development();
        self
    }

    /// Start with production preset configuration.
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = MetadataConfig::production();
        self
    }

    /// Load configuration from a file.
    ///
    /// Supports TOML (.toml) and JSON (.json) formats.
    /// The file format is determined by the file extension.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - The file does not exist
    /// - The file cannot be read
    /// - The file contains invalid TOML/JSON
    /// - The file contains unknown fields (strict mode)
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;

        let layer = Self::parse_file(&content, path)?;
        self.merge_layer(layer)?;
        self.files.push(path.to_path_buf());

        Ok(self)
    }

    /// Load configuration from an optional file.
    ///
    /// If the file exists, loads it. If not, silently continues.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be read or parsed.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Load configuration from a string.
    ///
    /// # Arguments
    ///
    /// * `content` - Configuration content as a string
    /// * `format` - File format ("toml" or "json")
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if parsing fails.
    ///
    /// # Example
    ///
    /// ```
    /// use daedalus_config::ConfigLoader;
    ///
    /// let toml = r#"
    ///     [pagination]
    ///     items_per_page = 10
    /// "#;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string(toml, "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.pagination.items_per_page, 10);
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        let layer: Value = match format.to_lowercase().as_str() {
            "toml" => toml::from_str(content)?,
            "json" => serde_json::from_str(content)?,
            _ => {
                return Err(ConfigError::validation_error(format!(
                    "unsupported configuration format: {format}"
                )))
            }
        };

        self.merge_layer(layer)?;
        Ok(self)
    }

    /// Set environment variable prefix for overrides.
    ///
    /// Environment variables use the format `PREFIX__SECTION__KEY`.
    /// For example, with prefix "DAEDALUS":
    /// - `DAEDALUS__PAGINATION__ITEMS_PER_PAGE=50`
    /// - `DAEDALUS__CACHE__STORE=filesystem`
    /// - `DAEDALUS__DEFAULTS__SECURITY="is_granted('ROLE_USER')"`
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Load a `.env` file for environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        // Missing .env is fine
        let _ = dotenvy::dotenv();
        Ok(self)
    }

    /// Files loaded so far, in order.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Finalize and return the loaded configuration.
    ///
    /// Applies environment variable overrides (if a prefix was set) and
    /// validates the final configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Environment variable parsing fails
    /// - Configuration validation fails
    pub fn load(mut self) -> Result<MetadataConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            self.apply_env_overrides(&prefix)?;
        }

        self.config.validate()?;

        Ok(self.config)
    }

    /// Finalize without validation.
    #[must_use]
    pub fn load_unvalidated(self) -> MetadataConfig {
        self.config
    }

    // Parse configuration file based on extension
    fn parse_file(content: &str, path: &Path) -> Result<Value, ConfigError> {
        let extension = path.extension().and_then(|e| e.to_str()).map(str::to_lowercase);

        match extension.as_deref() {
            Some("toml") => Ok(toml::from_str(content)?),
            Some("json") => Ok(serde_json::from_str(content)?),
            _ => Err(ConfigError::validation_error(format!(
                "unsupported configuration file format: {}",
                path.display()
            ))),
        }
    }

    // Merge one parsed layer over the current configuration
    fn merge_layer(&mut self, layer: Value) -> Result<(), ConfigError> {
        let Value::Object(layer) = layer else {
            return Err(ConfigError::validation_error("configuration root must be a table"));
        };

        let mut current = serde_json::to_value(&self.config)?;
        if let Value::Object(sections) = &mut current {
            for (section, value) in layer {
                if !REPLACED_SECTIONS.contains(&section.as_str()) {
                    if let (Some(Value::Object(existing)), Value::Object(fields)) = (sections.get_mut(&section), &value) {
                        existing.extend(fields.clone());
                        continue;
                    }
                }
                sections.insert(section, value);
            }
        }

        self.config = serde_json::from_value(current)?;
        Ok(())
    }

    // Apply environment variable overrides
    fn apply_env_overrides(&mut self, prefix: &str) -> Result<(), ConfigError> {
        // Sorted so repeated loads apply overrides in the same order
        let env_vars: BTreeMap<String, String> = env::vars().filter(|(k, _)| k.starts_with(prefix)).collect();

        for (key, value) in env_vars {
            self.apply_env_var(&key, &value, prefix)?;
        }

        Ok(())
    }

    // Apply a single environment variable
    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        let key_without_prefix = key
            .strip_prefix(prefix)
            .and_then(|k| k.strip_prefix("__"))
            .ok_or_else(|| ConfigError::env_parse_error(key, "invalid key format"))?;

        let parts: Vec<&str> = key_without_prefix.split("__").collect();
        let pagination = &mut self.config.pagination;

        match parts.as_slice() {
            // Free-form defaults; values are JSON when they parse as JSON
            ["DEFAULTS", name] => {
                let parsed = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
                self.config.defaults.insert(name.to_lowercase(), parsed);
            }

            // Pagination section
            ["PAGINATION", "ENABLED"] => pagination.enabled = bool_var(key, value)?,
            ["PAGINATION", "CLIENT_ENABLED"] => pagination.client_enabled = bool_var(key, value)?,
            ["PAGINATION", "CLIENT_ITEMS_PER_PAGE"] => pagination.client_items_per_page = bool_var(key, value)?,
            ["PAGINATION", "ITEMS_PER_PAGE"] => {
                pagination.items_per_page = value
                    .parse()
                    .map_err(|_| ConfigError::env_parse_error(key, "expected integer"))?;
            }
            ["PAGINATION", "MAXIMUM_ITEMS_PER_PAGE"] => {
                pagination.maximum_items_per_page = if value.eq_ignore_ascii_case("none") || value.is_empty() {
                    None
                } else {
                    Some(
                        value
                            .parse()
                            .map_err(|_| ConfigError::env_parse_error(key, "expected integer or 'none'"))?,
                    )
                };
            }
            ["PAGINATION", "PARTIAL"] => pagination.partial = bool_var(key, value)?,
            ["PAGINATION", "CLIENT_PARTIAL"] => pagination.client_partial = bool_var(key, value)?,

            // Formats: DAEDALUS__FORMATS__CSV=text/csv,application/csv
            ["FORMATS", name] => {
                let mime_types = split_list(value);
                if mime_types.is_empty() {
                    self.config.formats.shift_remove(&name.to_lowercase());
                } else {
                    self.config.formats.insert(name.to_lowercase(), mime_types);
                }
            }

            // Cache headers
            ["CACHE_HEADERS", "MAX_AGE"] => {
                self.config.cache_headers.max_age = Some(
                    value
                        .parse()
                        .map_err(|_| ConfigError::env_parse_error(key, "expected integer"))?,
                );
            }
            ["CACHE_HEADERS", "SHARED_MAX_AGE"] => {
                self.config.cache_headers.shared_max_age = Some(
                    value
                        .parse()
                        .map_err(|_| ConfigError::env_parse_error(key, "expected integer"))?,
                );
            }
            ["CACHE_HEADERS", "VARY"] => self.config.cache_headers.vary = split_list(value),
            ["CACHE_HEADERS", "PUBLIC"] => self.config.cache_headers.public = Some(bool_var(key, value)?),

            // Mapping
            ["MAPPING", "PATHS"] => {
                self.config.mapping.paths = split_list(value).into_iter().map(PathBuf::from).collect();
            }

            // Naming
            ["NAMING", "PATH_SEGMENT"] => {
                self.config.naming.path_segment = match value.to_lowercase().as_str() {
                    "underscore" => PathSegmentStrategy::Underscore,
                    "dash" => PathSegmentStrategy::Dash,
                    _ => return Err(ConfigError::env_parse_error(key, "expected 'underscore' or 'dash'")),
                };
            }
            ["NAMING", "FORMAT_SUFFIX"] => self.config.naming.format_suffix = bool_var(key, value)?,

            // Cache
            ["CACHE", "ENABLED"] => self.config.cache.enabled = bool_var(key, value)?,
            ["CACHE", "STORE"] => {
                self.config.cache.store = match value.to_lowercase().as_str() {
                    "memory" => CacheStoreKind::Memory,
                    "filesystem" => CacheStoreKind::Filesystem,
                    "none" => CacheStoreKind::None,
                    _ => {
                        return Err(ConfigError::env_parse_error(
                            key,
                            "expected 'memory', 'filesystem', or 'none'",
                        ))
                    }
                };
            }
            ["CACHE", "DIRECTORY"] => {
                self.config.cache.directory = (!value.is_empty()).then(|| PathBuf::from(value));
            }
            ["CACHE", "PREFIX"] => {
                self.config.cache.prefix = (!value.is_empty()).then(|| value.to_string());
            }

            // Logging
            ["LOGGING", "ENABLED"] => self.config.logging.enabled = bool_var(key, value)?,
            ["LOGGING", "LEVEL"] => self.config.logging.level = value.to_string(),
            ["LOGGING", "FORMAT"] => {
                self.config.logging.format = match value.to_lowercase().as_str() {
                    "json" => LogFormat::Json,
                    "pretty" => LogFormat::Pretty,
                    _ => return Err(ConfigError::env_parse_error(key, "expected 'json' or 'pretty'")),
                };
            }
            ["LOGGING", "INCLUDE_LOCATION"] => self.config.logging.include_location = bool_var(key, value)?,

            // Unknown key - ignore
            _ => {}
        }

        Ok(())
    }
}

fn bool_var(key: &str, value: &str) -> Result<bool, ConfigError> {
    parse_bool(value).ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse a boolean from a string.
fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_loader_new() {
        let config = ConfigLoader::new().load().unwrap();
        assert_eq!(config.pagination.items_per_page, 30);
    }

    #[test]
    fn test_loader_with_development() {
        let config = ConfigLoader::new().with_development().load().unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_loader_with_production() {
        let config = ConfigLoader::new().with_production().load().unwrap();
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_loader_with_string_toml() {
        let toml = r#"
            [pagination]
            items_per_page = 10
        "#;

        let config = ConfigLoader::new().with_string(toml, "toml").unwrap().load().unwrap();

        assert_eq!(config.pagination.items_per_page, 10);
        assert!(config.pagination.enabled);
    }

    #[test]
    fn test_loader_with_string_json() {
        let json = r#"{"naming": {"path_segment": "dash"}}"#;

        let config = ConfigLoader::new().with_string(json, "json").unwrap().load().unwrap();

        assert_eq!(config.naming.path_segment, PathSegmentStrategy::Dash);
    }

    #[test]
    fn test_layer_keeps_unset_section_keys() {
        let config = ConfigLoader::new()
            .with_development()
            .with_string("[logging]\nformat = \"json\"", "toml")
            .unwrap()
            .load()
            .unwrap();

        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_layer_replaces_formats() {
        let config = ConfigLoader::new()
            .with_string(r#"{"formats": {"csv": ["text/csv"]}}"#, "json")
            .unwrap()
            .load()
            .unwrap();

        assert_eq!(config.formats.keys().collect::<Vec<_>>(), vec!["csv"]);
    }

    #[test]
    fn test_layer_unknown_section_rejected() {
        let result = ConfigLoader::new().with_string("[server]\nport = 80", "toml");
        assert!(result.is_err());
    }

    #[test]
    fn test_loader_unsupported_format() {
        let result = ConfigLoader::new().with_string("a: 1", "ini");
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_loader_with_file_not_found() {
        let result = ConfigLoader::new().with_file("/nonexistent/metadata.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound { .. })));
    }

    #[test]
    fn test_loader_with_optional_file_not_found() {
        let loader = ConfigLoader::new().with_optional_file("/nonexistent/metadata.toml").unwrap();
        assert!(loader.files().is_empty());
        assert_eq!(loader.load().unwrap(), MetadataConfig::default());
    }

    #[test]
    fn test_load_validates() {
        let result = ConfigLoader::new()
            .with_string("[pagination]\nitems_per_page = 0", "toml")
            .unwrap()
            .load();
        assert!(result.is_err());
    }

    #[test]
    fn test_loader_load_unvalidated() {
        let config = ConfigLoader::new()
            .with_string("[pagination]\nitems_per_page = 0", "toml")
            .unwrap()
            .load_unvalidated();
        assert_eq!(config.pagination.items_per_page, 0);
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("true"), Some(true));
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("1"), Some(true));
        assert_eq!(parse_bool("on"), Some(true));

        assert_eq!(parse_bool("False"), Some(false));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("off"), Some(false));

        assert_eq!(parse_bool("maybe"), None);
        assert_eq!(parse_bool(""), None);
    }

    // Environment mutation needs unsafe on edition 2024 toolchains, so the
    // overrides are exercised through apply_env_var directly.

    #[test]
    fn test_apply_env_var_pagination() {
        let mut loader = ConfigLoader::new();
        loader.apply_env_var("TEST__PAGINATION__ITEMS_PER_PAGE", "50", "TEST").unwrap();
        loader.apply_env_var("TEST__PAGINATION__MAXIMUM_ITEMS_PER_PAGE", "100", "TEST").unwrap();
        loader.apply_env_var("TEST__PAGINATION__CLIENT_ENABLED", "yes", "TEST").unwrap();
        assert_eq!(loader.config.pagination.items_per_page, 50);
        assert_eq!(loader.config.pagination.maximum_items_per_page, Some(100));
        assert!(loader.config.pagination.client_enabled);
    }

    #[test]
    fn test_apply_env_var_defaults() {
        let mut loader = ConfigLoader::new();
        loader.apply_env_var("TEST__DEFAULTS__SECURITY", "is_granted('ROLE_USER')", "TEST").unwrap();
        loader.apply_env_var("TEST__DEFAULTS__PAGINATION_ITEMS_PER_PAGE", "12", "TEST").unwrap();
        assert_eq!(loader.config.defaults["security"], json!("is_granted('ROLE_USER')"));
        assert_eq!(loader.config.defaults["pagination_items_per_page"], json!(12));
    }

    #[test]
    fn test_apply_env_var_formats() {
        let mut loader = ConfigLoader::new();
        loader.apply_env_var("TEST__FORMATS__CSV", "text/csv, application/csv", "TEST").unwrap();
        loader.apply_env_var("TEST__FORMATS__HTML", "", "TEST").unwrap();
        assert_eq!(loader.config.formats["csv"], vec!["text/csv", "application/csv"]);
        assert!(!loader.config.formats.contains_key("html"));
    }

    #[test]
    fn test_apply_env_var_cache() {
        let mut loader = ConfigLoader::new();
        loader.apply_env_var("TEST__CACHE__STORE", "filesystem", "TEST").unwrap();
        loader.apply_env_var("TEST__CACHE__DIRECTORY", "/tmp/daedalus", "TEST").unwrap();
        assert_eq!(loader.config.cache.store, CacheStoreKind::Filesystem);
        assert_eq!(loader.config.cache.directory, Some(PathBuf::from("/tmp/daedalus")));
    }

    #[test]
    fn test_apply_env_var_invalid_integer() {
        let mut loader = ConfigLoader::new();
        let result = loader.apply_env_var("TEST__PAGINATION__ITEMS_PER_PAGE", "thirty", "TEST");
        assert!(matches!(result, Err(ConfigError::EnvParseError { .. })));
    }

    #[test]
    fn test_apply_env_var_invalid_store() {
        let mut loader = ConfigLoader::new();
        assert!(loader.apply_env_var("TEST__CACHE__STORE", "redis", "TEST").is_err());
    }

    #[test]
    fn test_apply_env_var_logging() {
        let mut loader = ConfigLoader::new();
        loader.apply_env_var("TEST__LOGGING__FORMAT", "pretty", "TEST").unwrap();
        loader.apply_env_var("TEST__LOGGING__LEVEL", "daedalus=trace", "TEST").unwrap();
        assert_eq!(loader.config.logging.format, LogFormat::Pretty);
        assert_eq!(loader.config.logging.level, "daedalus=trace");
    }

    #[test]
    fn test_apply_env_var_unknown_ignored() {
        let mut loader = ConfigLoader::new();
        assert!(loader.apply_env_var("TEST__SERVER__PORT", "80", "TEST").is_ok());
    }
}
