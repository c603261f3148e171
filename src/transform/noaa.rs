//! NOAA station CSV to JSON rows.
//!
//! Each row becomes an object keyed by the header, values kept as strings and
//! keys in column order.

use super::{csv_error, ensure_exists, TransformResult};
use crate::output::write_json_pretty;
use csv::StringRecord;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// One CSV row paired with the file's header.
#[derive(Debug, Clone)]
pub struct StationRow {
    headers: Arc<StringRecord>,
    values: StringRecord,
}

impl StationRow {
    /// Cell for column `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        let index = self.headers.iter().position(|h| h == name)?;
        self.values.get(index)
    }
}

impl Serialize for StationRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (header, value) in self.headers.iter().zip(self.values.iter()) {
            map.serialize_entry(header, value)?;
        }
        map.end()
    }
}

/// Read every row of the NOAA CSV at `path`.
pub fn read_rows(path: &Path) -> TransformResult<Vec<StationRow>> {
    ensure_exists(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| csv_error(path, e))?;
    let headers = Arc::new(reader.headers().map_err(|e| csv_error(path, e))?.clone());

    reader
        .records()
        .map(|row| {
            row.map(|values| StationRow {
                headers: Arc::clone(&headers),
                values,
            })
            .map_err(|e| csv_error(path, e))
        })
        .collect()
}

/// Convert the CSV at `input` to a JSON array at `output`.
pub fn run(input: &Path, output: &Path) -> TransformResult<usize> {
    let rows = read_rows(input)?;
    write_json_pretty(output, &rows)?;
    info!(records = rows.len(), output = %output.display(), "Processed NOAA records");
    Ok(rows.len())
}
