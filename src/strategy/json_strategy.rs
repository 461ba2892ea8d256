//! JSON strategy
//!
//! Structured objects as JSON text. Map keys come back sorted; integers and
//! floats keep their JSON number kind (`42` stays an integer, `1.0` a float).

use std::fs;
use std::path::Path;

use serde_json::Value as JsonValue;

use crate::error::{Result, StashError};
use crate::value::StoredValue;

use super::FormatStrategy;

pub struct JsonStrategy;

impl FormatStrategy for JsonStrategy {
    fn name(&self) -> &'static str {
        "json"
    }

    fn matches_value(&self, value: &StoredValue) -> bool {
        // Only containers; a bare scalar is not a structured object
        matches!(
            value,
            StoredValue::Structured(JsonValue::Object(_))
                | StoredValue::Structured(JsonValue::Array(_))
        )
    }

    fn matches_extension(&self, extension: &str) -> bool {
        extension == ".json"
    }

    fn canonical_extension(&self) -> &'static str {
        ".json"
    }

    fn serialize(&self, value: &StoredValue, dest: &Path) -> Result<()> {
        let document = match value {
            StoredValue::Structured(document @ (JsonValue::Object(_) | JsonValue::Array(_))) => {
                document
            }
            other => return Err(StashError::unsupported_value(other.kind())),
        };

        let text = serde_json::to_vec_pretty(document)
            .map_err(|e| StashError::Serialization(format!("JSON encode failed: {}", e)))?;
        fs::write(dest, text)?;
        Ok(())
    }

    fn deserialize(&self, path: &Path) -> Result<StoredValue> {
        let bytes = fs::read(path)?;
        let document: JsonValue = serde_json::from_slice(&bytes).map_err(|e| {
            StashError::Decode(format!("Malformed JSON in {}: {}", path.display(), e))
        })?;
        Ok(StoredValue::Structured(document))
    }
}
