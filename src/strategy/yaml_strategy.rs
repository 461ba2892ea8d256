//! YAML strategy
//!
//! Reads `.yaml`/`.yml` documents into the same structured form JSON uses.

use std::fs;
use std::path::Path;

use serde_json::Value as JsonValue;
use serde_yaml::Value as YamlValue;

use crate::error::{Result, StashError};
use crate::value::StoredValue;

use super::FormatStrategy;

pub struct YamlStrategy;

impl FormatStrategy for YamlStrategy {
    fn name(&self) -> &'static str {
        "yaml"
    }

    fn matches_value(&self, value: &StoredValue) -> bool {
        matches!(
            value,
            StoredValue::Structured(JsonValue::Object(_))
                | StoredValue::Structured(JsonValue::Array(_))
        )
    }

    fn matches_extension(&self, extension: &str) -> bool {
        extension == ".yaml" || extension == ".yml"
    }

    fn canonical_extension(&self) -> &'static str {
        ".yaml"
    }

    fn serialize(&self, value: &StoredValue, dest: &Path) -> Result<()> {
        let document = match value {
            StoredValue::Structured(document @ (JsonValue::Object(_) | JsonValue::Array(_))) => {
                document
            }
            other => return Err(StashError::unsupported_value(other.kind())),
        };

        let text = serde_yaml::to_string(document)
            .map_err(|e| StashError::Serialization(format!("YAML encode failed: {}", e)))?;
        fs::write(dest, text)?;
        Ok(())
    }

    fn deserialize(&self, path: &Path) -> Result<StoredValue> {
        let bytes = fs::read(path)?;
        let document: YamlValue = serde_yaml::from_slice(&bytes).map_err(|e| {
            StashError::Decode(format!("Malformed YAML in {}: {}", path.display(), e))
        })?;
        Ok(StoredValue::Structured(yaml_to_json(document)?))
    }
}

/// Convert a YAML document to the JSON data model
///
/// Scalar map keys are stringified; tags are dropped.
fn yaml_to_json(value: YamlValue) -> Result<JsonValue> {
    let converted = match value {
        YamlValue::Null => JsonValue::Null,
        YamlValue::Bool(b) => JsonValue::Bool(b),
        YamlValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                JsonValue::from(i)
            } else if let Some(u) = n.as_u64() {
                JsonValue::from(u)
            } else {
                let f = n.as_f64().unwrap_or(f64::NAN);
                serde_json::Number::from_f64(f)
                    .map(JsonValue::Number)
                    .ok_or_else(|| {
                        StashError::Decode(format!("YAML number {} has no JSON form", n))
                    })?
            }
        }
        YamlValue::String(s) => JsonValue::String(s),
        YamlValue::Sequence(items) => JsonValue::Array(
            items
                .into_iter()
                .map(yaml_to_json)
                .collect::<Result<Vec<_>>>()?,
        ),
        YamlValue::Mapping(mapping) => {
            let mut object = serde_json::Map::new();
            for (key, value) in mapping {
                object.insert(yaml_key(key)?, yaml_to_json(value)?);
            }
            JsonValue::Object(object)
        }
        YamlValue::Tagged(tagged) => yaml_to_json(tagged.value)?,
    };
    Ok(converted)
}

fn yaml_key(key: YamlValue) -> Result<String> {
    match key {
        YamlValue::String(s) => Ok(s),
        YamlValue::Number(n) => Ok(n.to_string()),
        YamlValue::Bool(b) => Ok(b.to_string()),
        YamlValue::Null => Ok("null".to_string()),
        YamlValue::Tagged(tagged) => yaml_key(tagged.value),
        other => Err(StashError::Decode(format!(
            "Unsupported YAML map key: {:?}",
            other
        ))),
    }
}
