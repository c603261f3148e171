//! Local dataset transforms
//!
//! Small batch jobs that normalize datasets for the map front end. Each one
//! reads a local file or directory and writes pretty JSON through
//! [`crate::output::write_json_pretty`].

use crate::output::OutputError;
use serde::Serialize;
use std::path::{Path, PathBuf};

pub mod locations;
pub mod noaa;
pub mod readings;
pub mod trees;

/// Transform errors
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    /// Input file or directory does not exist
    #[error("input not found: {}", .0.display())]
    MissingInput(PathBuf),

    /// IO error while reading input
    #[error("IO error: {0}")]
    IoError(String),

    /// Malformed CSV
    #[error("CSV error in {file}: {message}")]
    Csv {
        /// Offending file
        file: String,
        /// Parser message
        message: String,
    },

    /// A numeric column held something that is not a number
    #[error("{file} line {line}: column '{column}' is not a number: '{value}'")]
    InvalidNumber {
        /// Offending file
        file: String,
        /// 1-based line in the file
        line: u64,
        /// Column name
        column: String,
        /// Raw cell contents
        value: String,
    },

    /// Malformed JSON or unexpected JSON shape
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Output could not be written
    #[error("output error: {0}")]
    Output(#[from] OutputError),
}

/// Result type for transforms
pub type TransformResult<T> = Result<T, TransformError>;

/// A GeoJSON `FeatureCollection`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureCollection<F> {
    #[serde(rename = "type")]
    kind: &'static str,
    /// Member features
    pub features: Vec<F>,
}

impl<F> FeatureCollection<F> {
    /// Wrap `features` in a collection.
    pub fn new(features: Vec<F>) -> Self {
        Self {
            kind: "FeatureCollection",
            features,
        }
    }

    /// Number of features.
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Whether the collection has no features.
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

fn ensure_exists(path: &Path) -> TransformResult<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(TransformError::MissingInput(path.to_path_buf()))
    }
}

fn read_json(path: &Path) -> TransformResult<serde_json::Value> {
    ensure_exists(path)?;
    let text = std::fs::read_to_string(path)
        .map_err(|e| TransformError::IoError(format!("{}: {e}", path.display())))?;
    serde_json::from_str(&text)
        .map_err(|e| TransformError::InvalidInput(format!("{}: {e}", path.display())))
}

fn csv_error(path: &Path, error: csv::Error) -> TransformError {
    TransformError::Csv {
        file: path.display().to_string(),
        message: error.to_string(),
    }
}
