//! # Air Quality Data Library
//!
//! Batch tooling that produces the JSON datasets behind the air-quality map:
//! a resumable historical backfill against the AirNow API, plus a handful of
//! local CSV/GeoJSON transforms.
//!
//! ## Features
//!
//! - **Resumable Backfill**: one request per calendar day, checkpointed after
//!   every successful day so an interrupted run picks up where it stopped
//! - **Rate-Limit Aware**: honors `Retry-After` on HTTP 429, paces requests
//!   with a base delay plus jitter
//! - **Non-Fatal Failures**: a day that keeps failing is logged and skipped,
//!   never aborting a multi-hundred-day backfill
//! - **Transforms**: sensor CSV readings, building footprints, NOAA station
//!   data and tree inventories to front-end JSON
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use airquality_data::backfill::{BackfillConfig, BackfillExecutor};
//! use airquality_data::fetcher::airnow::AirNowClient;
//! use airquality_data::resume::JsonFileStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut config = BackfillConfig::default();
//! config.api_key = Some("MY-KEY".parse()?);
//! config.days = 30;
//!
//! let source = Arc::new(AirNowClient::from_config(&config)?);
//! let store = Arc::new(JsonFileStore::new(&config.checkpoint_path));
//! let report = BackfillExecutor::new(config, source, store).run().await?;
//! println!("{} records", report.records);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`window`] - Calendar-day windows enumerated backward from a start date
//! - [`fetcher`] - One-request-per-window data sources (AirNow)
//! - [`backfill`] - The ingestion loop, retry policy and request pacing
//! - [`resume`] - Checkpoint persistence for resumable runs
//! - [`output`] - Atomic JSON artifact writer and station summaries
//! - [`transform`] - Local dataset normalizers

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Historical ingestion loop
pub mod backfill;

/// CLI command implementations
pub mod cli;

/// Data sources
pub mod fetcher;

/// Metrics recording
pub mod metrics;

/// Output writers
pub mod output;

/// Resume capability for backfill runs
pub mod resume;

/// Graceful shutdown coordination shared across modules
pub mod shutdown;

/// Local dataset transforms
pub mod transform;

/// Calendar-day time windows
pub mod window;

pub use window::TimeWindow;

/// An observation returned by the remote API.
///
/// Records are opaque: the backfill appends them to its accumulation without
/// inspecting or validating their fields.
pub type Record = serde_json::Value;
