//! Value Module
//!
//! The in-memory shapes a caller can store.
//!
//! ## Kinds
//! - `Structured`: maps and sequences of JSON scalars
//! - `Table`: rows of cells, persisted as text
//! - `Array`: dense rectangular numeric array
//! - `Blob`: raw bytes
//!
//! The set is closed. Format strategies match on the variant, so a map can
//! never be mistaken for a table and a nested list never for an array.

mod ndarray;
mod table;

use bytes::Bytes;

pub use ndarray::{ArrayData, DType, Element, NdArray};
pub use table::{Cell, Table};

/// A value held by the store
#[derive(Debug, Clone, PartialEq)]
pub enum StoredValue {
    /// Maps/sequences of strings, numbers, booleans and nulls
    Structured(serde_json::Value),

    /// Sequence of rows of cells
    Table(Table),

    /// Dense numeric array
    Array(NdArray),

    /// Arbitrary bytes
    Blob(Bytes),
}

impl StoredValue {
    /// Descriptive kind name, used when no strategy accepts the value
    pub fn kind(&self) -> &'static str {
        match self {
            StoredValue::Structured(value) => match value {
                serde_json::Value::Object(_) => "object",
                serde_json::Value::Array(_) => "array",
                serde_json::Value::String(_) => "string",
                serde_json::Value::Number(_) => "number",
                serde_json::Value::Bool(_) => "bool",
                serde_json::Value::Null => "null",
            },
            StoredValue::Table(_) => "table",
            StoredValue::Array(_) => "ndarray",
            StoredValue::Blob(_) => "blob",
        }
    }

    pub fn as_structured(&self) -> Option<&serde_json::Value> {
        match self {
            StoredValue::Structured(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&Table> {
        match self {
            StoredValue::Table(table) => Some(table),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&NdArray> {
        match self {
            StoredValue::Array(array) => Some(array),
            _ => None,
        }
    }

    pub fn as_blob(&self) -> Option<&Bytes> {
        match self {
            StoredValue::Blob(bytes) => Some(bytes),
            _ => None,
        }
    }
}

impl From<serde_json::Value> for StoredValue {
    fn from(value: serde_json::Value) -> Self {
        StoredValue::Structured(value)
    }
}

impl From<Table> for StoredValue {
    fn from(table: Table) -> Self {
        StoredValue::Table(table)
    }
}

impl From<NdArray> for StoredValue {
    fn from(array: NdArray) -> Self {
        StoredValue::Array(array)
    }
}

impl From<Bytes> for StoredValue {
    fn from(bytes: Bytes) -> Self {
        StoredValue::Blob(bytes)
    }
}

impl From<Vec<u8>> for StoredValue {
    fn from(bytes: Vec<u8>) -> Self {
        StoredValue::Blob(Bytes::from(bytes))
    }
}
