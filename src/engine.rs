//! Engine Module
//!
//! The storage engine that coordinates the index and the format strategies.
//!
//! ## Responsibilities
//! - Map keys to file names (`<key><extension>` in the storage root)
//! - Pick a strategy per value on save and per extension on load
//! - Keep the index in step with the data files
//! - Surface errors without leaving the index ahead of the disk

use std::ffi::OsStr;
use std::fmt::Display;
use std::fs::{self, File};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::config::Config;
use crate::error::{Result, StashError};
use crate::index::StorageIndex;
use crate::strategy::{extension_of, FormatStrategy, StrategyRegistry};
use crate::value::StoredValue;

/// The main storage engine
///
/// ## Save Protocol
/// 1. Normalize and validate the key
/// 2. Resolve a strategy (nothing is written if none matches, or if the
///    file name belongs to the index or to another key)
/// 3. Write the data file (and fsync if configured)
/// 4. Record `key → file` in the index and persist it
/// 5. Remove the key's previous file if its extension changed
///
/// ## Concurrency Model
/// The index sits behind a mutex that `save`/`save_file` hold for steps 3-5,
/// so saves through one engine are serialized. Separate engines or
/// processes sharing a root are not coordinated.
pub struct Engine {
    /// Engine configuration
    config: Config,

    /// Format strategies in priority order
    registry: StrategyRegistry,

    /// Key → file index (persisted after each save)
    index: Mutex<StorageIndex>,
}

impl Engine {
    /// Open or create an engine with the given config
    ///
    /// On startup:
    /// 1. Create the storage root (including parents)
    /// 2. Build the registry for the configured policy
    /// 3. Load the index, or create an empty one
    pub fn open(config: Config) -> Result<Self> {
        let registry = StrategyRegistry::new(config.unknown_format_policy);
        Self::with_registry(config, registry)
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        let config = Config::builder().data_dir(path.as_ref()).build();
        Self::open(config)
    }

    /// Open with a caller-assembled registry (custom formats)
    pub fn with_registry(config: Config, registry: StrategyRegistry) -> Result<Self> {
        config.validate()?;

        // Step 1: Create data directory if it doesn't exist
        fs::create_dir_all(&config.data_dir)?;

        // Step 2: Load or create the index
        let index = StorageIndex::open(
            &config.data_dir,
            &config.index_file_name,
            config.atomic_index_writes,
        )?;

        tracing::info!(
            "Opened storage at {} ({} keys, strategies: {})",
            config.data_dir.display(),
            index.len(),
            registry.strategy_names().join(", ")
        );

        Ok(Self {
            config,
            registry,
            index: Mutex::new(index),
        })
    }

    /// Save a value under `key`
    ///
    /// The file is named `<key><canonical extension>` of the strategy the
    /// value resolves to. Returns the written path.
    pub fn save<K: Display>(&self, key: K, value: &StoredValue) -> Result<PathBuf> {
        let key = Self::normalize_key(key)?;
        let strategy = self.registry.resolve_for_save(value)?;
        let file_name = format!("{}{}", key, strategy.canonical_extension());

        self.write_and_record(&key, file_name, strategy, |dest| {
            strategy.serialize(value, dest)
        })
    }

    /// Import an existing file under `key`
    ///
    /// The strategy is chosen by the source's extension; the file is decoded
    /// and re-encoded into storage under the strategy's canonical extension.
    /// The raw-copy fallback keeps the source's own extension.
    pub fn save_file<K: Display>(&self, key: K, source: impl AsRef<Path>) -> Result<PathBuf> {
        let key = Self::normalize_key(key)?;
        let source = source.as_ref();
        let strategy = self.registry.resolve_for_load(source)?;

        let extension = if strategy.is_fallback() {
            extension_of(source)
        } else {
            strategy.canonical_extension().to_string()
        };
        let file_name = format!("{}{}", key, extension);

        let value = strategy.deserialize(source)?;
        if !strategy.matches_value(&value) {
            return Err(StashError::unsupported_value(value.kind()));
        }

        self.write_and_record(&key, file_name, strategy, |dest| {
            strategy.serialize(&value, dest)
        })
    }

    /// Get the value stored under `key`
    ///
    /// Returns:
    /// - `Ok(Some(value))`: key indexed and its file decoded
    /// - `Ok(None)`: key not indexed, or its file is gone from disk
    /// - `Err(UnsupportedFormat)`: no strategy reads the file's extension
    pub fn get<K: Display>(&self, key: K) -> Result<Option<StoredValue>> {
        let key = key.to_string();

        let path = match self.index.lock().resolve(&key) {
            Some(path) => path,
            None => {
                tracing::debug!("Key not found: {}", key);
                return Ok(None);
            }
        };

        if !path.exists() {
            tracing::warn!(
                "Indexed file for key '{}' is missing: {}",
                key,
                path.display()
            );
            return Ok(None);
        }

        let strategy = self.registry.resolve_for_load(&path)?;
        let value = strategy.deserialize(&path)?;

        tracing::debug!(
            "Loaded key '{}' from {} via {}",
            key,
            path.display(),
            strategy.name()
        );

        Ok(Some(value))
    }

    /// Whether `key` is indexed (no filesystem access)
    pub fn exists<K: Display>(&self, key: K) -> bool {
        self.index.lock().contains(&key.to_string())
    }

    /// Number of indexed keys
    pub fn count(&self) -> usize {
        self.index.lock().len()
    }

    /// Indexed keys in sorted order
    pub fn keys(&self) -> Vec<String> {
        self.index.lock().keys().map(String::from).collect()
    }

    /// On-disk path recorded for `key`
    pub fn path_of<K: Display>(&self, key: K) -> Option<PathBuf> {
        self.index.lock().resolve(&key.to_string())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    /// Get the index file path
    pub fn index_path(&self) -> PathBuf {
        self.config.index_path()
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the strategy registry
    pub fn registry(&self) -> &StrategyRegistry {
        &self.registry
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Stringify `key` and reject names that cannot live in the root
    fn normalize_key<K: Display>(key: K) -> Result<String> {
        let key = key.to_string();

        if key.is_empty() {
            return Err(StashError::InvalidKey("key is empty".to_string()));
        }
        if key == "." || key == ".." {
            return Err(StashError::InvalidKey(format!("'{}' is not a file name", key)));
        }
        if key.contains(['/', '\\', '\0']) {
            return Err(StashError::InvalidKey(format!(
                "'{}' contains a path separator or NUL",
                key
            )));
        }

        Ok(key)
    }

    /// Steps 3-5 of the save protocol
    fn write_and_record<F>(
        &self,
        key: &str,
        file_name: String,
        strategy: &dyn FormatStrategy,
        write: F,
    ) -> Result<PathBuf>
    where
        F: FnOnce(&Path) -> Result<()>,
    {
        let mut index = self.index.lock();

        if file_name == self.config.index_file_name
            || index.temp_path().file_name() == Some(OsStr::new(&file_name))
        {
            return Err(StashError::InvalidKey(format!(
                "'{}' would overwrite the index file",
                key
            )));
        }

        if let Some(owner) = index.owner_of(&file_name).filter(|owner| *owner != key) {
            return Err(StashError::InvalidKey(format!(
                "'{}' would overwrite the file of key '{}'",
                key, owner
            )));
        }

        let dest = self.config.data_dir.join(&file_name);

        // Step 3: Data file first; the index only ever points at complete writes
        write(&dest)?;
        if self.config.sync_writes {
            File::open(&dest)?.sync_all()?;
        }

        // Step 4: Record and persist
        let previous = index.record(key, &file_name)?;

        tracing::debug!(
            "Saved key '{}' to {} via {}",
            key,
            dest.display(),
            strategy.name()
        );

        // Step 5: Drop the file left behind by a format change
        if let Some(old) = previous.filter(|old| *old != file_name) {
            if !index.references(&old) {
                let old_path = index.resolve_location(&old);
                match fs::remove_file(&old_path) {
                    Ok(()) => {
                        tracing::debug!("Removed stale file {}", old_path.display());
                    }
                    Err(e) if e.kind() == ErrorKind::NotFound => {}
                    Err(e) => {
                        tracing::warn!(
                            "Could not remove stale file {}: {}",
                            old_path.display(),
                            e
                        );
                    }
                }
            }
        }

        Ok(dest)
    }
}
