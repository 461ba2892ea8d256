//! Index Module
//!
//! Persistent mapping from key to the file holding its value.
//!
//! ## Responsibilities
//! - Load the snapshot at startup (create an empty one on first use)
//! - Answer membership and count queries without touching data files
//! - Persist after every mutation, rolling back the in-memory entry if
//!   persistence fails
//!
//! ## File Format
//! ```text
//! {
//!   "csv_key": "csv_key.csv",
//!   "json_key": "json_key.json"
//! }
//! ```
//! Locations are file names relative to the storage root. Absolute paths
//! in an existing index are honored as-is.
//!
//! ## Crash Safety
//! With atomic writes enabled the snapshot goes to `<name>.tmp` first and
//! is renamed over the index. Without them the index is rewritten in place
//! and a crash mid-write can truncate it.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{Result, StashError};

/// In-memory view of the persisted index
#[derive(Debug)]
pub struct StorageIndex {
    /// Storage root that relative locations resolve against
    root: PathBuf,

    /// Index file path
    path: PathBuf,

    /// Write-to-temp-then-rename on persist
    atomic_writes: bool,

    /// key → location
    entries: BTreeMap<String, String>,
}

impl StorageIndex {
    /// Open the index at `root/file_name`
    ///
    /// A missing index file is created empty and persisted immediately.
    pub fn open(root: &Path, file_name: &str, atomic_writes: bool) -> Result<Self> {
        let path = root.join(file_name);

        let entries = if path.exists() {
            let bytes = fs::read(&path)?;
            serde_json::from_slice(&bytes).map_err(|e| {
                StashError::Decode(format!("Corrupt index file {}: {}", path.display(), e))
            })?
        } else {
            BTreeMap::new()
        };

        let index = Self {
            root: root.to_path_buf(),
            path,
            atomic_writes,
            entries,
        };

        if !index.path.exists() {
            index.persist()?;
        }

        Ok(index)
    }

    /// On-disk path for `key`
    pub fn resolve(&self, key: &str) -> Option<PathBuf> {
        self.entries
            .get(key)
            .map(|location| self.resolve_location(location))
    }

    /// On-disk path for a recorded location
    pub fn resolve_location(&self, location: &str) -> PathBuf {
        // join() keeps absolute locations unchanged
        self.root.join(location)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Key currently pointing at `location`, if any
    pub fn owner_of(&self, location: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, l)| l.as_str() == location)
            .map(|(key, _)| key.as_str())
    }

    /// Whether any key currently points at `location`
    pub fn references(&self, location: &str) -> bool {
        self.owner_of(location).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in sorted order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Record `key → location` and persist
    ///
    /// Returns the previous location. If persisting fails the in-memory
    /// entry is restored, so memory never runs ahead of disk.
    pub fn record(&mut self, key: &str, location: &str) -> Result<Option<String>> {
        let previous = self
            .entries
            .insert(key.to_string(), location.to_string());

        if let Err(e) = self.persist() {
            match &previous {
                Some(old) => {
                    self.entries.insert(key.to_string(), old.clone());
                }
                None => {
                    self.entries.remove(key);
                }
            }
            return Err(e);
        }

        Ok(previous)
    }

    /// Write the current snapshot to disk
    pub fn persist(&self) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(&self.entries)
            .map_err(|e| StashError::Serialization(format!("Index encode failed: {}", e)))?;

        if self.atomic_writes {
            let temp_path = self.temp_path();
            {
                let mut file = File::create(&temp_path)?;
                file.write_all(&bytes)?;
                file.sync_all()?;
            }
            fs::rename(&temp_path, &self.path)?;
        } else {
            fs::write(&self.path, &bytes)?;
        }

        Ok(())
    }

    /// Scratch file used by atomic writes
    pub fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
