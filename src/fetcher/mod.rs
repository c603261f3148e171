//! Data sources for the backfill
//!
//! A [`WindowSource`] performs exactly one request per call. Retrying,
//! pacing and checkpointing belong to the executor in [`crate::backfill`].

use crate::{Record, TimeWindow};
use async_trait::async_trait;
use retry_formatter::RetryErrorType;
use std::time::Duration;

pub mod airnow;
pub mod airnow_config;
pub mod retry_formatter;

/// Fetcher errors
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// HTTP 429 with the server's suggested wait, if it sent one
    #[error("rate limited (HTTP 429)")]
    RateLimited {
        /// Parsed `Retry-After` header
        retry_after: Option<Duration>,
    },

    /// Any other HTTP status >= 400
    #[error("HTTP error {status}: {body}")]
    HttpError {
        /// Response status code
        status: u16,
        /// Truncated response body
        body: String,
    },

    /// Request timed out
    #[error("request timed out: {0}")]
    Timeout(String),

    /// Connection refused, DNS failure, or similar
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Network error
    #[error("network error: {0}")]
    NetworkError(String),

    /// Response body is not JSON
    #[error("parse error: {0}")]
    ParseError(String),

    /// Response body is JSON of the wrong shape
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// API credential absent or blank
    #[error("missing API credential: {0}")]
    MissingCredential(String),

    /// Malformed request setting (bounding box, parameter, ...)
    #[error("invalid setting: {0}")]
    InvalidSetting(String),
}

impl FetchError {
    /// Classification used for retry log messages and metrics labels.
    pub fn error_type(&self) -> RetryErrorType {
        match self {
            Self::RateLimited { .. } => RetryErrorType::RateLimit,
            Self::HttpError { status, .. } => RetryErrorType::from_status(*status),
            Self::Timeout(_) => RetryErrorType::NetworkTimeout,
            Self::ConnectionFailed(_) => RetryErrorType::NetworkOffline,
            Self::ParseError(_) | Self::InvalidResponse(_) => RetryErrorType::MalformedResponse,
            Self::NetworkError(_) | Self::MissingCredential(_) | Self::InvalidSetting(_) => {
                RetryErrorType::NetworkGeneric
            }
        }
    }
}

/// Result type for fetcher operations
pub type FetchResult<T> = Result<T, FetchError>;

/// A remote data source queried once per time window.
#[async_trait]
pub trait WindowSource: Send + Sync {
    /// Issue a single request for `window` and return its records.
    ///
    /// An empty vector is a successful window with no data.
    async fn fetch_window(&self, window: &TimeWindow) -> FetchResult<Vec<Record>>;

    /// Human-readable endpoint description for log messages.
    fn endpoint(&self) -> &str;
}
