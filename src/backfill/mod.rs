//! Historical ingestion loop
//!
//! The backfill walks calendar days backward from a start date, issuing one
//! request per day through a [`crate::fetcher::WindowSource`]. Every
//! successful day is checkpointed; a day that keeps failing is logged and
//! skipped.
//!
//! # Components
//!
//! - [`executor`] - The window loop with retry, pacing and checkpointing
//! - [`config`] - Run configuration and TOML presets
//! - [`retry`] - Bounded per-window retry policy
//! - [`pacing`] - Inter-request delay with jitter
//! - [`progress`] - Periodic progress lines
//!
//! # Error Handling
//!
//! Only configuration problems and local write failures end a run early.
//! Remote failures are per window and never surface as [`BackfillError`].

pub mod config;
pub mod executor;
pub mod pacing;
pub mod progress;
pub mod retry;

pub use config::{BackfillConfig, ConfigError, ConfigFile};
pub use executor::{BackfillExecutor, BackfillReport};
pub use pacing::Pacing;
pub use retry::RetryPolicy;

use crate::output::OutputError;
use crate::resume::ResumeError;

/// Backfill errors
#[derive(Debug, thiserror::Error)]
pub enum BackfillError {
    /// API credential absent or blank
    #[error("missing API credential: {0}")]
    MissingCredential(String),

    /// Configuration rejected before any request
    #[error("configuration error: {0}")]
    Config(ConfigError),

    /// Checkpoint could not be written
    #[error("checkpoint error: {0}")]
    Checkpoint(#[from] ResumeError),

    /// Final artifact could not be written
    #[error("output error: {0}")]
    Output(#[from] OutputError),

    /// Ctrl+C before the run finished
    #[error("interrupted; resume point is day {}", display_day(.last_completed))]
    Interrupted {
        /// Last window index persisted in the checkpoint
        last_completed: Option<u32>,
    },
}

impl From<ConfigError> for BackfillError {
    fn from(error: ConfigError) -> Self {
        match error {
            ConfigError::MissingCredential(message) => Self::MissingCredential(message),
            other => Self::Config(other),
        }
    }
}

fn display_day(day: &Option<u32>) -> String {
    day.map_or_else(|| "none".to_string(), |d| d.to_string())
}
