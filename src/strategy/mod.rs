//! Strategy Module
//!
//! Format strategies decide how a value is written to and read from disk.
//!
//! ## Responsibilities
//! - Recognize the values a format can hold (save side)
//! - Recognize the file extensions a format can read (load side)
//! - Encode/decode one value per file
//!
//! ## Priority Order
//! ```text
//! ┌──────┬──────┬──────┬──────┬───────────────────────────┐
//! │ JSON │ YAML │ CSV  │ NPY  │ Blob (RawCopy policy only) │
//! └──────┴──────┴──────┴──────┴───────────────────────────┘
//!    first match wins, in both directions
//! ```
//!
//! JSON and YAML accept the same values. JSON sits first, so in-memory
//! structured values are always written as `.json`; YAML is reached through
//! `.yaml`/`.yml` files only.

mod blob_strategy;
mod csv_strategy;
mod json_strategy;
mod npy_strategy;
mod registry;
mod yaml_strategy;

use std::path::Path;

use crate::error::Result;
use crate::value::StoredValue;

pub use blob_strategy::BlobStrategy;
pub use csv_strategy::CsvStrategy;
pub use json_strategy::JsonStrategy;
pub use npy_strategy::{decode_npy, encode_npy, NpyStrategy};
pub use registry::StrategyRegistry;
pub use yaml_strategy::YamlStrategy;

/// A file format the store can persist values in
///
/// Implementations are stateless. `serialize` only accepts the variant the
/// strategy handles and fails with `UnsupportedValue` for anything else.
pub trait FormatStrategy: Send + Sync {
    /// Short name used in logs and diagnostics
    fn name(&self) -> &'static str;

    /// Can this strategy write `value`?
    fn matches_value(&self, value: &StoredValue) -> bool;

    /// Can this strategy read a file with `extension` (leading dot included)?
    fn matches_extension(&self, extension: &str) -> bool;

    /// Extension used for files this strategy creates
    fn canonical_extension(&self) -> &'static str;

    /// Write `value` to `dest`, replacing any existing file
    fn serialize(&self, value: &StoredValue, dest: &Path) -> Result<()>;

    /// Read and decode the file at `path`
    fn deserialize(&self, path: &Path) -> Result<StoredValue>;

    /// Catch-all strategy that must stay last in the registry
    fn is_fallback(&self) -> bool {
        false
    }
}

/// Extension of `path` with its leading dot, or `""` if it has none
///
/// Matching is case-sensitive: `data.JSON` yields `".JSON"`.
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default()
}
