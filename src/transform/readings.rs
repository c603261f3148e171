//! Sensor reading CSVs to a flat JSON array
//!
//! Every `*.csv` file in the input directory is read in file-name order. Each
//! row becomes one [`Reading`]; columns the file lacks come out as `null`.

use super::{csv_error, ensure_exists, TransformError, TransformResult};
use crate::output::write_json_pretty;
use csv::StringRecord;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// One sensor reading.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    /// Sensor location identifier
    pub location_id: Option<String>,
    /// Human-readable location name
    pub location_name: Option<String>,
    /// Measured parameter, e.g. `pm25`
    pub parameter: Option<String>,
    /// Measured value, `null` when the cell is empty
    pub value: Option<f64>,
    /// Unit of `value`
    pub unit: Option<String>,
    /// Timestamp as written in the source
    #[serde(rename = "datetimeUtc")]
    pub datetime_utc: Option<String>,
    /// Latitude in degrees
    pub latitude: Option<f64>,
    /// Longitude in degrees
    pub longitude: Option<f64>,
    /// Data provider
    pub provider: Option<String>,
}

struct Columns {
    headers: StringRecord,
}

impl Columns {
    fn text(&self, row: &StringRecord, name: &str) -> Option<String> {
        let index = self.headers.iter().position(|h| h == name)?;
        row.get(index).map(str::to_string)
    }

    fn number(&self, file: &Path, row: &StringRecord, name: &str) -> TransformResult<Option<f64>> {
        match self.text(row, name) {
            Some(raw) if !raw.is_empty() => raw.trim().parse::<f64>().map(Some).map_err(|_| {
                TransformError::InvalidNumber {
                    file: file.display().to_string(),
                    line: row.position().map_or(0, |p| p.line()),
                    column: name.to_string(),
                    value: raw,
                }
            }),
            _ => Ok(None),
        }
    }

    fn reading(&self, file: &Path, row: &StringRecord) -> TransformResult<Reading> {
        Ok(Reading {
            location_id: self.text(row, "location_id"),
            location_name: self.text(row, "location_name"),
            parameter: self.text(row, "parameter"),
            value: self.number(file, row, "value")?,
            unit: self.text(row, "unit"),
            datetime_utc: self.text(row, "datetimeUtc"),
            latitude: self.number(file, row, "latitude")?,
            longitude: self.number(file, row, "longitude")?,
            provider: self.text(row, "provider"),
        })
    }
}

/// Read every reading from one CSV file.
pub fn read_file(path: &Path) -> TransformResult<Vec<Reading>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| csv_error(path, e))?;
    let columns = Columns {
        headers: reader.headers().map_err(|e| csv_error(path, e))?.clone(),
    };

    let mut readings = Vec::new();
    for row in reader.records() {
        let row = row.map_err(|e| csv_error(path, e))?;
        readings.push(columns.reading(path, &row)?);
    }
    debug!(file = %path.display(), readings = readings.len(), "Read CSV");
    Ok(readings)
}

/// CSV files directly inside `dir`, sorted by name.
pub fn csv_files(dir: &Path) -> TransformResult<Vec<PathBuf>> {
    ensure_exists(dir)?;
    let entries = std::fs::read_dir(dir)
        .map_err(|e| TransformError::IoError(format!("{}: {e}", dir.display())))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|e| TransformError::IoError(format!("{}: {e}", dir.display())))?
            .path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "csv") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Read all readings from the CSV files in `dir`.
pub fn read_dir(dir: &Path) -> TransformResult<Vec<Reading>> {
    let mut readings = Vec::new();
    for file in csv_files(dir)? {
        readings.extend(read_file(&file)?);
    }
    Ok(readings)
}

/// Combine the CSVs in `input_dir` into one JSON array at `output`.
///
/// Returns the number of readings written.
pub fn run(input_dir: &Path, output: &Path) -> TransformResult<usize> {
    let readings = read_dir(input_dir)?;
    write_json_pretty(output, &readings)?;
    info!(readings = readings.len(), output = %output.display(), "Combined air quality readings");
    Ok(readings.len())
}
