//! Checkpoint persistence
//!
//! [`JsonFileStore`] rewrites the whole checkpoint on every save through a
//! temp file in the same directory followed by an atomic rename, so a crash
//! mid-write leaves the previous checkpoint intact.

use super::checkpoint::Checkpoint;
use crate::output::write_atomic;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info, warn};

/// Persisted backfill progress.
///
/// Used before and after every window, independent of how records are fetched.
pub trait CheckpointStore: Send + Sync {
    /// Load saved progress, `None` when there is none.
    fn load(&self) -> Result<Option<Checkpoint>, ResumeError>;

    /// Replace saved progress with `checkpoint`.
    fn save(&self, checkpoint: &Checkpoint) -> Result<(), ResumeError>;

    /// Remove saved progress. Removing nothing is not an error.
    fn clear(&self) -> Result<(), ResumeError>;

    /// Where progress is kept, for log messages.
    fn location(&self) -> String;
}

/// Checkpoint stored as a JSON file
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Store at `path`; nothing touches disk until the first save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Checkpoint file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CheckpointStore for JsonFileStore {
    fn load(&self) -> Result<Option<Checkpoint>, ResumeError> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "No checkpoint found");
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&self.path)
            .map_err(|e| ResumeError::IoError(format!("{}: {e}", self.path.display())))?;

        let checkpoint: Checkpoint = serde_json::from_str(&contents).map_err(|e| {
            warn!(path = %self.path.display(), error = %e, "Failed to deserialize checkpoint");
            ResumeError::DeserializationError(e.to_string())
        })?;

        info!(
            path = %self.path.display(),
            records = checkpoint.record_count(),
            last_day = ?checkpoint.last_day,
            "Checkpoint loaded"
        );
        Ok(Some(checkpoint))
    }

    fn save(&self, checkpoint: &Checkpoint) -> Result<(), ResumeError> {
        let json = serde_json::to_vec(checkpoint)
            .map_err(|e| ResumeError::SerializationError(e.to_string()))?;

        write_atomic(&self.path, &json).map_err(|e| ResumeError::IoError(e.to_string()))?;

        debug!(
            path = %self.path.display(),
            records = checkpoint.record_count(),
            last_day = ?checkpoint.last_day,
            "Checkpoint saved"
        );
        Ok(())
    }

    fn clear(&self) -> Result<(), ResumeError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                info!(path = %self.path.display(), "Removed checkpoint");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ResumeError::IoError(format!(
                "Failed to remove {}: {e}",
                self.path.display()
            ))),
        }
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

/// Checkpoint kept in memory; lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Option<Checkpoint>>,
    saves: Mutex<usize>,
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with `checkpoint`, as if a previous run was interrupted.
    pub fn with_checkpoint(checkpoint: Checkpoint) -> Self {
        Self {
            inner: Mutex::new(Some(checkpoint)),
            saves: Mutex::new(0),
        }
    }

    /// Current saved progress.
    pub fn snapshot(&self) -> Option<Checkpoint> {
        self.inner.lock().ok().and_then(|guard| guard.clone())
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> usize {
        self.saves.lock().map(|guard| *guard).unwrap_or(0)
    }
}

impl CheckpointStore for MemoryStore {
    fn load(&self) -> Result<Option<Checkpoint>, ResumeError> {
        Ok(self.snapshot())
    }

    fn save(&self, checkpoint: &Checkpoint) -> Result<(), ResumeError> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|e| ResumeError::IoError(format!("checkpoint lock poisoned: {e}")))?;
        *guard = Some(checkpoint.clone());
        if let Ok(mut saves) = self.saves.lock() {
            *saves += 1;
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), ResumeError> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|e| ResumeError::IoError(format!("checkpoint lock poisoned: {e}")))?;
        *guard = None;
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}

/// Errors related to checkpoint persistence
#[derive(Debug, thiserror::Error)]
pub enum ResumeError {
    /// IO error
    #[error("IO error: {0}")]
    IoError(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    SerializationError(String),

    /// Deserialization error
    #[error("deserialization error: {0}")]
    DeserializationError(String),
}
