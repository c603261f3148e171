//! Backfill configuration
//!
//! [`BackfillConfig`] is the single value handed to the executor. It is built
//! from defaults, then an optional TOML preset ([`ConfigFile`]), then explicit
//! command-line flags.

use super::pacing::Pacing;
use super::retry::RetryPolicy;
use crate::fetcher::airnow_config::{AirNowSettings, ApiKey, BoundingBox, DataType, Parameter};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable holding the AirNow API key.
pub const API_KEY_ENV: &str = "AIRNOW_API_KEY";

/// Days covered when not configured.
pub const DEFAULT_DAYS: u32 = 400;

/// Final artifact location when not configured.
pub const DEFAULT_OUTPUT_PATH: &str = "data/airnow/airnow_bay_area_400days.json";

/// Checkpoint location when not configured.
pub const DEFAULT_CHECKPOINT_PATH: &str = "data/airnow/airnow_bay_area_temp.json";

/// Per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// API credential absent or blank
    #[error("missing API credential: {0}")]
    MissingCredential(String),

    /// A value is out of range or inconsistent
    #[error("invalid configuration: {0}")]
    Invalid(String),

    /// Config file could not be read
    #[error("IO error: {0}")]
    IoError(String),

    /// Config file is not valid TOML for this schema
    #[error("parse error: {0}")]
    ParseError(String),
}

/// Everything one backfill run needs.
#[derive(Debug, Clone)]
pub struct BackfillConfig {
    /// Most recent day fetched (window 0)
    pub start_date: NaiveDate,
    /// Number of days counting backward from `start_date`
    pub days: u32,
    /// Per-window request parameters
    pub airnow: AirNowSettings,
    /// API credential
    pub api_key: Option<ApiKey>,
    /// Delay between windows
    pub pacing: Pacing,
    /// Per-window retry bound and delays
    pub retry: RetryPolicy,
    /// Per-request timeout
    pub request_timeout: Duration,
    /// Resume checkpoint location
    pub checkpoint_path: PathBuf,
    /// Final artifact location
    pub output_path: PathBuf,
}

impl Default for BackfillConfig {
    fn default() -> Self {
        Self {
            start_date: Utc::now().date_naive(),
            days: DEFAULT_DAYS,
            airnow: AirNowSettings::default(),
            api_key: None,
            pacing: Pacing::default(),
            retry: RetryPolicy::default(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            checkpoint_path: PathBuf::from(DEFAULT_CHECKPOINT_PATH),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
        }
    }
}

impl BackfillConfig {
    /// Check the configuration before any request is made.
    ///
    /// # Errors
    /// [`ConfigError::MissingCredential`] without an API key, otherwise
    /// [`ConfigError::Invalid`] for unusable values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.is_none() {
            return Err(ConfigError::MissingCredential(format!(
                "{API_KEY_ENV} is not set or is empty"
            )));
        }
        if self.days == 0 {
            return Err(ConfigError::Invalid("days must be at least 1".to_string()));
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "max attempts must be at least 1".to_string(),
            ));
        }
        if self.pacing.jitter_min > self.pacing.jitter_max {
            return Err(ConfigError::Invalid(format!(
                "jitter minimum {:?} exceeds maximum {:?}",
                self.pacing.jitter_min, self.pacing.jitter_max
            )));
        }
        if self.checkpoint_path == self.output_path {
            return Err(ConfigError::Invalid(
                "checkpoint and output paths must differ".to_string(),
            ));
        }
        self.airnow
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}

/// TOML preset for a backfill. Every field is optional.
///
/// ```toml
/// start_date = "2025-05-12"
/// days = 400
/// bbox = "-122.75,37.3,-121.75,38.0"
/// parameters = ["OZONE", "PM25"]
/// request_delay_secs = 3.0
/// max_attempts = 3
/// output_path = "data/airnow/airnow_bay_area_400days.json"
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    start_date: Option<NaiveDate>,
    days: Option<u32>,
    base_url: Option<String>,
    bbox: Option<BoundingBox>,
    parameters: Option<Vec<Parameter>>,
    data_type: Option<DataType>,
    api_key: Option<ApiKey>,
    request_delay_secs: Option<f64>,
    jitter_min_secs: Option<f64>,
    jitter_max_secs: Option<f64>,
    max_attempts: Option<u32>,
    error_delay_secs: Option<f64>,
    http_error_delay_secs: Option<f64>,
    rate_limit_fallback_secs: Option<f64>,
    request_timeout_secs: Option<f64>,
    checkpoint_path: Option<PathBuf>,
    output_path: Option<PathBuf>,
}

impl ConfigFile {
    /// Read and parse a preset file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(format!("{}: {e}", path.display())))?;
        Self::parse(&text)
    }

    /// Parse a preset from TOML text.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Overlay the preset's values onto `config`.
    pub fn apply(self, config: &mut BackfillConfig) -> Result<(), ConfigError> {
        if let Some(start_date) = self.start_date {
            config.start_date = start_date;
        }
        if let Some(days) = self.days {
            config.days = days;
        }
        if let Some(base_url) = self.base_url {
            config.airnow.base_url = base_url;
        }
        if let Some(bbox) = self.bbox {
            config.airnow.bbox = bbox;
        }
        if let Some(parameters) = self.parameters {
            config.airnow.parameters = parameters;
        }
        if let Some(data_type) = self.data_type {
            config.airnow.data_type = data_type;
        }
        if let Some(api_key) = self.api_key {
            config.api_key = Some(api_key);
        }
        if let Some(secs) = self.request_delay_secs {
            config.pacing.base_delay = seconds("request_delay_secs", secs)?;
        }
        if let Some(secs) = self.jitter_min_secs {
            config.pacing.jitter_min = seconds("jitter_min_secs", secs)?;
        }
        if let Some(secs) = self.jitter_max_secs {
            config.pacing.jitter_max = seconds("jitter_max_secs", secs)?;
        }
        if let Some(max_attempts) = self.max_attempts {
            config.retry.max_attempts = max_attempts;
        }
        if let Some(secs) = self.error_delay_secs {
            config.retry.error_delay = seconds("error_delay_secs", secs)?;
        }
        if let Some(secs) = self.http_error_delay_secs {
            config.retry.http_error_delay = seconds("http_error_delay_secs", secs)?;
        }
        if let Some(secs) = self.rate_limit_fallback_secs {
            config.retry.rate_limit_fallback = seconds("rate_limit_fallback_secs", secs)?;
        }
        if let Some(secs) = self.request_timeout_secs {
            config.request_timeout = seconds("request_timeout_secs", secs)?;
        }
        if let Some(path) = self.checkpoint_path {
            config.checkpoint_path = path;
        }
        if let Some(path) = self.output_path {
            config.output_path = path;
        }
        Ok(())
    }
}

/// Convert a non-negative number of seconds to a [`Duration`].
pub fn seconds(field: &str, secs: f64) -> Result<Duration, ConfigError> {
    Duration::try_from_secs_f64(secs)
        .map_err(|_| ConfigError::Invalid(format!("{field} must be a non-negative number, got {secs}")))
}
