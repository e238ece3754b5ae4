//! Loading configuration files from disk.

use std::fs;

use daedalus_config::{CacheStoreKind, ConfigError, ConfigLoader};
use serde_json::json;
use tempfile::TempDir;

#[test]
fn toml_file_sets_defaults_layer() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("metadata.toml");
    fs::write(
        &path,
        r#"
        [defaults]
        paginationItemsPerPage = 30
        accessControl = "is_granted('ROLE_USER')"

        [pagination]
        client_items_per_page = true
        "#,
    )
    .unwrap();

    let config = ConfigLoader::new().with_file(&path).unwrap().load().unwrap();
    let attributes = config.default_attributes();

    assert_eq!(attributes["pagination_items_per_page"], json!(30));
    assert_eq!(attributes["pagination_client_items_per_page"], json!(true));
    // Remapping happens in the factories, not here
    assert_eq!(attributes["access_control"], json!("is_granted('ROLE_USER')"));
}

#[test]
fn later_files_override_earlier_ones() {
    let dir = TempDir::new().unwrap();
    let base = dir.path().join("base.toml");
    let local = dir.path().join("local.json");
    fs::write(&base, "[cache]\nstore = \"filesystem\"\ndirectory = \"/var/cache\"\n").unwrap();
    fs::write(&local, r#"{"cache": {"store": "none"}}"#).unwrap();

    let loader = ConfigLoader::new().with_file(&base).unwrap().with_file(&local).unwrap();
    assert_eq!(loader.files(), &[base.clone(), local.clone()]);

    let config = loader.load().unwrap();
    assert_eq!(config.cache.store, CacheStoreKind::None);
    assert_eq!(config.cache.directory.as_deref(), Some(std::path::Path::new("/var/cache")));
}

#[test]
fn unknown_default_attribute_fails_on_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("metadata.toml");
    fs::write(&path, "[defaults]\nitemsPerPage = 3\n").unwrap();

    let err = ConfigLoader::new().with_file(&path).unwrap().load().unwrap_err();
    assert!(matches!(err, ConfigError::UnknownField { .. }));
}

#[test]
fn malformed_file_is_a_parse_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("metadata.toml");
    fs::write(&path, "[pagination\nitems_per_page = ").unwrap();

    let err = ConfigLoader::new().with_file(&path).unwrap_err();
    assert!(matches!(err, ConfigError::TomlError(_)));
}

#[test]
fn unsupported_extension_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("metadata.ini");
    fs::write(&path, "items_per_page=3").unwrap();

    assert!(ConfigLoader::new().with_file(&path).is_err());
}
