//! Backfill command implementation

use crate::backfill::config::{seconds, API_KEY_ENV};
use crate::backfill::{
    BackfillConfig, BackfillError, BackfillExecutor, BackfillReport, ConfigError, ConfigFile,
    RetryPolicy,
};
use crate::fetcher::airnow::AirNowClient;
use crate::fetcher::airnow_config::{ApiKey, BoundingBox, DataType, Parameter};
use crate::resume::{CheckpointStore, JsonFileStore};
use crate::shutdown::SharedShutdown;
use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use super::CliError;

/// Parse a start date in YYYY-MM-DD format.
fn parse_date(input: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|e| format!("invalid date '{input}' (expected YYYY-MM-DD): {e}"))
}

/// Backfill command arguments
///
/// Values are layered: built-in defaults, then `--config`, then the flags
/// given here.
#[derive(Parser, Debug, Default)]
pub struct BackfillArgs {
    /// TOML preset with any of the settings below
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// AirNow API key
    #[arg(long, env = API_KEY_ENV, hide_env_values = true)]
    pub api_key: Option<String>,

    /// Most recent day to fetch, YYYY-MM-DD (default: today, UTC)
    #[arg(long, value_parser = parse_date)]
    pub start_date: Option<NaiveDate>,

    /// Number of days to fetch, counting backward (default: 400)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub days: Option<u32>,

    /// Bounding box as minLon,minLat,maxLon,maxLat
    #[arg(long, allow_hyphen_values = true)]
    pub bbox: Option<BoundingBox>,

    /// Comma-separated pollutants (default: OZONE,PM25)
    #[arg(long, value_delimiter = ',')]
    pub parameters: Option<Vec<Parameter>>,

    /// A (AQI), C (concentration) or B (both)
    #[arg(long)]
    pub data_type: Option<DataType>,

    /// Override the data endpoint URL
    #[arg(long)]
    pub base_url: Option<String>,

    /// Seconds between requests, before jitter (default: 3)
    ///
    /// Retry delays scale with it: errors wait one delay, HTTP errors and
    /// rate limits without Retry-After wait two. Retry delays set in a
    /// `--config` preset take precedence over the scaled ones.
    #[arg(long)]
    pub request_delay: Option<f64>,

    /// Attempts per day before it is skipped (default: 3, range: 1-20)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=20))]
    pub max_attempts: Option<u32>,

    /// Checkpoint file location
    #[arg(long)]
    pub checkpoint: Option<PathBuf>,

    /// Output file location
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Delete an existing checkpoint and start from the first day
    #[arg(long, default_value_t = false)]
    pub reset: bool,
}

impl BackfillArgs {
    /// Resolve defaults, preset and flags into one configuration.
    pub fn build_config(&self) -> Result<BackfillConfig, CliError> {
        let mut config = BackfillConfig::default();

        let request_delay = self
            .request_delay
            .map(|secs| seconds("--request-delay", secs))
            .transpose()?;
        // Retry delays derived from --request-delay yield to ones a preset sets.
        if let Some(delay) = request_delay {
            config.retry = RetryPolicy::from_base_delay(config.retry.max_attempts, delay)
                .ok_or_else(|| {
                    ConfigError::Invalid(format!(
                        "--request-delay of {}s is too large",
                        delay.as_secs_f64()
                    ))
                })?;
        }

        if let Some(path) = &self.config {
            ConfigFile::load(path)?.apply(&mut config)?;
            info!(path = %path.display(), "Loaded config preset");
        }

        if let Some(raw) = &self.api_key {
            let key: ApiKey = raw.parse()?;
            config.api_key = Some(key);
        }
        if let Some(start_date) = self.start_date {
            config.start_date = start_date;
        }
        if let Some(days) = self.days {
            config.days = days;
        }
        if let Some(bbox) = self.bbox {
            config.airnow.bbox = bbox;
        }
        if let Some(parameters) = &self.parameters {
            config.airnow.parameters = parameters.clone();
        }
        if let Some(data_type) = self.data_type {
            config.airnow.data_type = data_type;
        }
        if let Some(base_url) = &self.base_url {
            config.airnow.base_url = base_url.clone();
        }
        if let Some(delay) = request_delay {
            config.pacing.base_delay = delay;
        }
        if let Some(max_attempts) = self.max_attempts {
            config.retry.max_attempts = max_attempts;
        }
        if let Some(path) = &self.checkpoint {
            config.checkpoint_path = path.clone();
        }
        if let Some(path) = &self.output {
            config.output_path = path.clone();
        }

        Ok(config)
    }

    /// Run the backfill against AirNow.
    pub async fn execute(&self, shutdown: SharedShutdown) -> Result<BackfillReport, CliError> {
        let config = self.build_config()?;
        config.validate().map_err(BackfillError::from)?;

        let store = Arc::new(JsonFileStore::new(&config.checkpoint_path));
        if self.reset {
            info!(path = %store.path().display(), "Reset requested: discarding checkpoint");
            store.clear()?;
        }

        let source = Arc::new(AirNowClient::from_config(&config)?);
        let output = config.output_path.clone();
        let report = BackfillExecutor::new(config, source, store)
            .with_shutdown(shutdown)
            .run()
            .await?;

        println!("Backfill complete: {}", output.display());
        println!("  Days: {} fetched, {} resumed, {} failed", report.fetched, report.skipped, report.failed.len());
        println!("  Records: {}", report.records);
        println!("  Unique stations: {}", report.stations);
        for date in &report.failed {
            println!("  Failed: {date}");
        }

        Ok(report)
    }
}
