//! Output writers
//!
//! Every artifact (final backfill output, transform results, checkpoints) is
//! written through [`write_atomic`]: temp file in the target directory, fsync,
//! rename. Readers never observe a half-written file.

use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tracing::info;

pub mod summary;

pub use summary::StationSummary;

/// Output writer errors
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    /// IO error
    #[error("IO error: {0}")]
    IoError(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    SerializationError(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Replace `path` with `bytes` atomically, creating parent directories.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> OutputResult<()> {
    let parent_dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent_dir).map_err(|e| {
        OutputError::IoError(format!("Failed to create {}: {e}", parent_dir.display()))
    })?;

    let mut temp_file = tempfile::NamedTempFile::new_in(parent_dir)
        .map_err(|e| OutputError::IoError(format!("Failed to create temp file: {e}")))?;
    temp_file
        .write_all(bytes)
        .map_err(|e| OutputError::IoError(format!("Failed to write to temp file: {e}")))?;
    temp_file
        .flush()
        .map_err(|e| OutputError::IoError(format!("Failed to flush temp file: {e}")))?;
    temp_file
        .as_file()
        .sync_all()
        .map_err(|e| OutputError::IoError(format!("Failed to sync temp file: {e}")))?;
    temp_file
        .persist(path)
        .map_err(|e| OutputError::IoError(format!("Failed to persist temp file: {e}")))?;

    // Make the rename durable
    if let Ok(dir) = std::fs::File::open(parent_dir) {
        let _ = dir.sync_all();
    }
    Ok(())
}

/// Write `value` as pretty-printed JSON (two-space indent) to `path`.
pub fn write_json_pretty<T: Serialize + ?Sized>(path: &Path, value: &T) -> OutputResult<()> {
    let mut json = serde_json::to_vec_pretty(value)
        .map_err(|e| OutputError::SerializationError(e.to_string()))?;
    json.push(b'\n');
    write_atomic(path, &json)?;
    info!(path = %path.display(), bytes = json.len(), "Wrote JSON output");
    Ok(())
}
