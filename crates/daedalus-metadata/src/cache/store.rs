//! Cache stores.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use daedalus_config::{CacheConfig, CacheStoreKind};
use parking_lot::RwLock;
use serde_json::Value;
use thiserror::Error;

/// Shared handle to a cache store.
pub type SharedCacheStore = Arc<dyn CacheStore>;

/// Errors raised by cache stores.
///
/// The cached factories never propagate these; a failing store degrades to
/// recomputation.
#[derive(Debug, Error)]
pub enum CacheStoreError {
    /// Filesystem access failed.
    #[error("cache store I/O error at {path}: {source}")]
    Io {
        /// Path being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// A stored entry could not be encoded or decoded.
    #[error("cache entry {key} is not valid JSON: {source}")]
    Encoding {
        /// Cache key.
        key: String,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// The backing service failed.
    #[error("cache backend error: {0}")]
    Backend(String),

    /// The store cannot be built from the configuration.
    #[error("cache store misconfigured: {0}")]
    Misconfigured(String),
}

impl CacheStoreError {
    /// Create an I/O error.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a backend error.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }
}

/// Key-value store behind the cached factories.
///
/// Values are JSON documents. Implementations must be safe to share between
/// threads; they do not need to be consistent across processes.
pub trait CacheStore: Send + Sync + fmt::Debug {
    /// Returns the store name, used in logs.
    fn name(&self) -> &'static str;

    /// Returns the value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<Value>, CacheStoreError>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: Value) -> Result<(), CacheStoreError>;

    /// Removes every entry.
    fn clear(&self) -> Result<(), CacheStoreError>;
}

/// Builds the store selected by the cache configuration.
pub fn store_from_config(config: &CacheConfig) -> Result<SharedCacheStore, CacheStoreError> {
    Ok(match config.store {
        CacheStoreKind::Memory => Arc::new(InMemoryCacheStore::new()),
        CacheStoreKind::None => Arc::new(NullCacheStore),
        CacheStoreKind::Filesystem => {
            let directory = config
                .directory
                .as_ref()
                .ok_or_else(|| CacheStoreError::Misconfigured("filesystem store needs cache.directory".to_string()))?;
            Arc::new(FilesystemCacheStore::new(directory))
        }
    })
}

/// Process-local store.
#[derive(Debug, Default)]
pub struct InMemoryCacheStore {
    entries: RwLock<HashMap<String, Value>>,
}

impl InMemoryCacheStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true when the store holds nothing.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl CacheStore for InMemoryCacheStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn get(&self, key: &str) -> Result<Option<Value>, CacheStoreError> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<(), CacheStoreError> {
        self.entries.write().insert(key.to_string(), value);
        Ok(())
    }

    fn clear(&self) -> Result<(), CacheStoreError> {
        self.entries.write().clear();
        Ok(())
    }
}

/// Store that keeps nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullCacheStore;

impl CacheStore for NullCacheStore {
    fn name(&self) -> &'static str {
        "none"
    }

    fn get(&self, _key: &str) -> Result<Option<Value>, CacheStoreError> {
        Ok(None)
    }

    fn set(&self, _key: &str, _value: Value) -> Result<(), CacheStoreError> {
        Ok(())
    }

    fn clear(&self) -> Result<(), CacheStoreError> {
        Ok(())
    }
}

/// One JSON file per key in a directory.
///
/// Writes go through a temporary file and a rename, so readers never see a
/// partial entry. The directory is created on first write.
#[derive(Debug, Clone)]
pub struct FilesystemCacheStore {
    directory: PathBuf,
}

impl FilesystemCacheStore {
    /// Creates a store rooted at `directory`.
    pub fn new(directory: impl AsRef<Path>) -> Self {
        Self {
            directory: directory.as_ref().to_path_buf(),
        }
    }

    /// Returns the root directory.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn path(&self, key: &str) -> PathBuf {
        let file: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
            .collect();
        self.directory.join(format!("{file}.json"))
    }
}

impl CacheStore for FilesystemCacheStore {
    fn name(&self) -> &'static str {
        "filesystem"
    }

    fn get(&self, key: &str) -> Result<Option<Value>, CacheStoreError> {
        let path = self.path(key);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CacheStoreError::io(path, e)),
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|source| CacheStoreError::Encoding {
                key: key.to_string(),
                source,
            })
    }

    fn set(&self, key: &str, value: Value) -> Result<(), CacheStoreError> {
        fs::create_dir_all(&self.directory).map_err(|e| CacheStoreError::io(&self.directory, e))?;

        let content = serde_json::to_vec(&value).map_err(|source| CacheStoreError::Encoding {
            key: key.to_string(),
            source,
        })?;
        let path = self.path(key);
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, content).map_err(|e| CacheStoreError::io(&staging, e))?;
        fs::rename(&staging, &path).map_err(|e| CacheStoreError::io(&path, e))
    }

    fn clear(&self) -> Result<(), CacheStoreError> {
        let entries = match fs::read_dir(&self.directory) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(CacheStoreError::io(&self.directory, e)),
        };
        for entry in entries {
            let path = entry.map_err(|e| CacheStoreError::io(&self.directory, e))?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                fs::remove_file(&path).map_err(|e| CacheStoreError::io(&path, e))?;
            }
        }
        Ok(())
    }
}
