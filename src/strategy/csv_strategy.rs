//! CSV strategy
//!
//! Tables as comma-separated text. Every cell is written in its display
//! form and read back as `Cell::Text`; there is no type inference, so
//! `Cell::Integer(33)` returns as `Cell::Text("33")`.

use std::fs;
use std::path::Path;

use crate::error::{Result, StashError};
use crate::value::{Cell, StoredValue, Table};

use super::FormatStrategy;

pub struct CsvStrategy;

impl FormatStrategy for CsvStrategy {
    fn name(&self) -> &'static str {
        "csv"
    }

    fn matches_value(&self, value: &StoredValue) -> bool {
        matches!(value, StoredValue::Table(_))
    }

    fn matches_extension(&self, extension: &str) -> bool {
        extension == ".csv"
    }

    fn canonical_extension(&self) -> &'static str {
        ".csv"
    }

    fn serialize(&self, value: &StoredValue, dest: &Path) -> Result<()> {
        let StoredValue::Table(table) = value else {
            return Err(StashError::unsupported_value(value.kind()));
        };

        // Rows may differ in length
        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_writer(Vec::new());

        for row in table.rows() {
            writer
                .write_record(row.iter().map(ToString::to_string))
                .map_err(|e| StashError::Serialization(format!("CSV encode failed: {}", e)))?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| StashError::Serialization(format!("CSV flush failed: {}", e)))?;
        fs::write(dest, bytes)?;
        Ok(())
    }

    fn deserialize(&self, path: &Path) -> Result<StoredValue> {
        let bytes = fs::read(path)?;
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(bytes.as_slice());

        let mut table = Table::default();
        for record in reader.records() {
            let record = record.map_err(|e| {
                StashError::Decode(format!("Malformed CSV in {}: {}", path.display(), e))
            })?;
            table.push_row(record.iter().map(|field| Cell::Text(field.to_string())).collect());
        }

        Ok(StoredValue::Table(table))
    }
}
