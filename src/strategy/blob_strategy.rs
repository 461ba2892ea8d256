//! Blob strategy
//!
//! Raw bytes in, raw bytes out. Registered only under
//! `UnknownFormatPolicy::RawCopy`, always last.

use std::fs;
use std::path::Path;

use bytes::Bytes;

use crate::error::{Result, StashError};
use crate::value::StoredValue;

use super::FormatStrategy;

pub struct BlobStrategy;

impl FormatStrategy for BlobStrategy {
    fn name(&self) -> &'static str {
        "blob"
    }

    fn matches_value(&self, value: &StoredValue) -> bool {
        matches!(value, StoredValue::Blob(_))
    }

    fn matches_extension(&self, _extension: &str) -> bool {
        true
    }

    fn canonical_extension(&self) -> &'static str {
        ".bin"
    }

    fn serialize(&self, value: &StoredValue, dest: &Path) -> Result<()> {
        let StoredValue::Blob(bytes) = value else {
            return Err(StashError::unsupported_value(value.kind()));
        };
        fs::write(dest, bytes)?;
        Ok(())
    }

    fn deserialize(&self, path: &Path) -> Result<StoredValue> {
        Ok(StoredValue::Blob(Bytes::from(fs::read(path)?)))
    }

    fn is_fallback(&self) -> bool {
        true
    }
}
