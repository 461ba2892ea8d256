//! Configuration for StashKV
//!
//! Centralized configuration with sensible defaults.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, StashError};

/// Main configuration for a StashKV instance
///
/// Can also be read from a JSON file; fields left out keep their defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for the index and all data files
    /// Internal structure:
    ///   {data_dir}/
    ///     ├── index.json       (key → file name)
    ///     └── <key>.<ext>      (one file per stored key)
    pub data_dir: PathBuf,

    /// File name of the persisted index inside `data_dir`
    pub index_file_name: String,

    // -------------------------------------------------------------------------
    // Format Configuration
    // -------------------------------------------------------------------------
    /// What to do with values and files no built-in format recognizes
    pub unknown_format_policy: UnknownFormatPolicy,

    // -------------------------------------------------------------------------
    // Durability Configuration
    // -------------------------------------------------------------------------
    /// Write the index to a temporary file and rename it into place
    pub atomic_index_writes: bool,

    /// fsync every data file after it is written
    pub sync_writes: bool,
}

/// Handling of unrecognized values and extensions.
///
/// The same policy governs saving and loading: an engine never rejects on one
/// side and falls back to raw bytes on the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownFormatPolicy {
    /// Unrecognized values fail with `UnsupportedValue`, unrecognized
    /// extensions with `UnsupportedFormat`
    #[default]
    Reject,

    /// Unrecognized input is stored and loaded as raw bytes
    RawCopy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./stashkv_data"),
            index_file_name: "index.json".to_string(),
            unknown_format_policy: UnknownFormatPolicy::Reject,
            atomic_index_writes: true,
            sync_writes: false,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Load a config from a JSON file and validate it
    ///
    /// ```text
    /// { "data_dir": "/var/lib/stashkv", "unknown_format_policy": "raw_copy" }
    /// ```
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        let config: Config = serde_json::from_slice(&bytes).map_err(|e| {
            StashError::Config(format!("Invalid config file {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Full path of the index file
    pub fn index_path(&self) -> PathBuf {
        self.data_dir.join(&self.index_file_name)
    }

    /// Check the settings that cannot be expressed in the types
    pub fn validate(&self) -> Result<()> {
        let name = self.index_file_name.as_str();
        if name.is_empty() || name == "." || name == ".." {
            return Err(StashError::Config(format!(
                "Invalid index file name: {:?}",
                name
            )));
        }
        if name.contains('/') || name.contains('\\') {
            return Err(StashError::Config(format!(
                "Index file name must not contain path separators: {}",
                name
            )));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory (root for all storage)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the index file name
    pub fn index_file_name(mut self, name: impl Into<String>) -> Self {
        self.config.index_file_name = name.into();
        self
    }

    /// Set the policy for unrecognized values and extensions
    pub fn unknown_format_policy(mut self, policy: UnknownFormatPolicy) -> Self {
        self.config.unknown_format_policy = policy;
        self
    }

    /// Enable or disable write-to-temp-then-rename for the index
    pub fn atomic_index_writes(mut self, enabled: bool) -> Self {
        self.config.atomic_index_writes = enabled;
        self
    }

    /// Enable or disable fsync after each data file write
    pub fn sync_writes(mut self, enabled: bool) -> Self {
        self.config.sync_writes = enabled;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
