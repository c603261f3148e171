//! Backfill executor
//!
//! Runs the window loop: skip what the checkpoint covers, fetch the rest with
//! bounded retries, checkpoint after every success, pace between windows, and
//! finally write the artifact and drop the checkpoint.

use super::config::BackfillConfig;
use super::progress::ProgressState;
use super::BackfillError;
use crate::fetcher::retry_formatter::{RetryContext, RetryErrorType};
use crate::fetcher::WindowSource;
use crate::metrics::{self, WindowOutcome};
use crate::output::{write_json_pretty, StationSummary};
use crate::resume::{Checkpoint, CheckpointStore};
use crate::shutdown::{self, sleep_or_shutdown, SharedShutdown};
use crate::{Record, TimeWindow};
use chrono::NaiveDate;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Summary of a completed run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BackfillReport {
    /// Windows in the run
    pub windows_total: u32,
    /// Windows fetched during this invocation
    pub fetched: u32,
    /// Windows already covered by a checkpoint
    pub skipped: u32,
    /// Days whose attempts were all exhausted
    pub failed: Vec<NaiveDate>,
    /// Records written to the artifact
    pub records: usize,
    /// Distinct station positions in the artifact
    pub stations: usize,
    /// Where the artifact was written
    pub output_path: PathBuf,
}

enum WindowAttempt {
    Fetched(Vec<Record>),
    Failed,
    Interrupted,
}

/// Drives one backfill run.
pub struct BackfillExecutor {
    config: BackfillConfig,
    source: Arc<dyn WindowSource>,
    store: Arc<dyn CheckpointStore>,
    shutdown: Option<SharedShutdown>,
    progress_interval: Option<Duration>,
}

impl BackfillExecutor {
    /// Create an executor. Picks up the global shutdown handle if one is registered.
    pub fn new(
        config: BackfillConfig,
        source: Arc<dyn WindowSource>,
        store: Arc<dyn CheckpointStore>,
    ) -> Self {
        Self {
            config,
            source,
            store,
            shutdown: shutdown::get_global_shutdown(),
            progress_interval: None,
        }
    }

    /// Attach a shared shutdown handle for graceful cancellation.
    pub fn with_shutdown(mut self, shutdown: SharedShutdown) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Override how often a time-based progress line is logged.
    pub fn with_progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = Some(interval);
        self
    }

    /// Run configuration.
    pub fn config(&self) -> &BackfillConfig {
        &self.config
    }

    /// Run every window, then write the artifact and remove the checkpoint.
    ///
    /// # Errors
    /// Fails before any request on invalid configuration, and mid-run only
    /// when the checkpoint or artifact cannot be written or on Ctrl+C.
    /// Windows that exhaust their retries are reported in
    /// [`BackfillReport::failed`] instead.
    pub async fn run(&self) -> Result<BackfillReport, BackfillError> {
        self.config.validate()?;

        let windows = TimeWindow::backward_from(self.config.start_date, self.config.days);
        let windows_total = u32::try_from(windows.len()).unwrap_or(u32::MAX);
        let mut checkpoint = self.load_checkpoint();

        info!(
            start_date = %self.config.start_date,
            days = windows_total,
            endpoint = self.source.endpoint(),
            checkpoint = %self.store.location(),
            "Starting backfill"
        );

        let mut progress = ProgressState::new(windows_total);
        if let Some(interval) = self.progress_interval {
            progress = progress.with_update_interval(interval);
        }
        let mut report = BackfillReport {
            windows_total,
            output_path: self.config.output_path.clone(),
            ..BackfillReport::default()
        };

        for (position, window) in windows.iter().enumerate() {
            if self.shutdown_requested() {
                return Err(self.interrupted(&checkpoint));
            }

            if checkpoint.covers(window.index()) {
                debug!(window = %window, "Already in checkpoint, skipping");
                report.skipped += 1;
                progress.record_skipped();
                metrics::record_window(WindowOutcome::Skipped, 0);
                continue;
            }

            match self.fetch_with_retry(window).await {
                WindowAttempt::Fetched(records) => {
                    let count = records.len();
                    let stations = StationSummary::from_records(&records).len();
                    checkpoint.record_window(window.index(), records);
                    self.store.save(&checkpoint)?;
                    report.fetched += 1;
                    metrics::record_window(WindowOutcome::Fetched, count);
                    info!(
                        window = %window,
                        records = count,
                        stations,
                        total_records = checkpoint.record_count(),
                        "Fetched day"
                    );
                }
                WindowAttempt::Failed => {
                    report.failed.push(window.date());
                    metrics::record_window(WindowOutcome::Failed, 0);
                }
                WindowAttempt::Interrupted => return Err(self.interrupted(&checkpoint)),
            }

            progress.record_processed(checkpoint.record_count());
            if progress.should_emit_update() {
                info!("{}", progress.format_progress());
                progress.mark_emitted();
            }

            if position + 1 < windows.len() {
                let delay = self.config.pacing.next_delay();
                debug!(delay_ms = delay.as_millis() as u64, "Pacing before next day");
                if !sleep_or_shutdown(delay, self.shutdown.as_deref()).await {
                    return Err(self.interrupted(&checkpoint));
                }
            }
        }

        write_json_pretty(&self.config.output_path, &checkpoint.results)?;
        if let Err(e) = self.store.clear() {
            warn!(error = %e, location = %self.store.location(), "Failed to remove checkpoint");
        }

        let summary = StationSummary::from_records(&checkpoint.results);
        for station in summary.stations() {
            debug!(station = %station, "Station");
        }

        report.records = checkpoint.record_count();
        report.stations = summary.len();

        if !report.failed.is_empty() {
            let dates: Vec<String> = report.failed.iter().map(ToString::to_string).collect();
            warn!(
                failed = report.failed.len(),
                dates = %dates.join(", "),
                "Some days could not be fetched; re-run after deleting the output to retry them"
            );
        }
        info!(
            records = report.records,
            stations = report.stations,
            fetched = report.fetched,
            skipped = report.skipped,
            failed = report.failed.len(),
            output = %self.config.output_path.display(),
            "Backfill complete"
        );

        Ok(report)
    }

    fn load_checkpoint(&self) -> Checkpoint {
        match self.store.load() {
            Ok(Some(checkpoint)) => {
                info!(
                    last_day = ?checkpoint.last_day,
                    records = checkpoint.record_count(),
                    "Resuming from checkpoint"
                );
                checkpoint
            }
            Ok(None) => Checkpoint::new(),
            Err(e) => {
                warn!(error = %e, location = %self.store.location(), "Failed to load checkpoint, starting fresh");
                Checkpoint::new()
            }
        }
    }

    async fn fetch_with_retry(&self, window: &TimeWindow) -> WindowAttempt {
        let policy = self.config.retry;
        let mut attempt = 1;
        let mut last_error_type: Option<RetryErrorType> = None;

        loop {
            match self.source.fetch_window(window).await {
                Ok(records) => {
                    if let Some(error_type) = last_error_type {
                        let context = RetryContext::new(
                            attempt,
                            policy.max_attempts,
                            error_type,
                            Duration::ZERO,
                            window.date(),
                            "",
                            self.source.endpoint(),
                        );
                        info!("{}", context.format_success());
                    }
                    return WindowAttempt::Fetched(records);
                }
                Err(e) => {
                    let error_type = e.error_type();
                    let delay = policy.delay_for(&e);
                    let context = RetryContext::new(
                        attempt,
                        policy.max_attempts,
                        error_type,
                        delay,
                        window.date(),
                        e.to_string(),
                        self.source.endpoint(),
                    );

                    if !policy.should_retry(attempt) {
                        error!(window = %window, "{}", context.format_failure());
                        return WindowAttempt::Failed;
                    }

                    warn!(window = %window, error = %e, "{}", context.format_retry());
                    metrics::record_retry_backoff(delay, attempt, error_type.label());
                    if !sleep_or_shutdown(delay, self.shutdown.as_deref()).await {
                        return WindowAttempt::Interrupted;
                    }

                    last_error_type = Some(error_type);
                    attempt += 1;
                }
            }
        }
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown
            .as_ref()
            .is_some_and(|s| s.is_shutdown_requested())
    }

    fn interrupted(&self, checkpoint: &Checkpoint) -> BackfillError {
        info!(
            last_day = ?checkpoint.last_day,
            location = %self.store.location(),
            "Shutdown requested - progress is saved in the checkpoint"
        );
        BackfillError::Interrupted {
            last_completed: checkpoint.last_day,
        }
    }
}
