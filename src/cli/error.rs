//! CLI error types and conversions

use crate::backfill::{BackfillError, ConfigError};
use crate::fetcher::FetchError;
use crate::resume::ResumeError;
use crate::transform::TransformError;

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Backfill error
    #[error("backfill error: {0}")]
    BackfillError(#[from] BackfillError),

    /// Configuration error
    #[error("configuration error: {0}")]
    ConfigError(#[from] ConfigError),

    /// Fetcher error
    #[error("fetcher error: {0}")]
    FetchError(#[from] FetchError),

    /// Resume error
    #[error("resume error: {0}")]
    ResumeError(#[from] ResumeError),

    /// Transform error
    #[error("transform error: {0}")]
    TransformError(#[from] TransformError),
}
