//! Progress tracking for long backfills.
//!
//! A 400-day backfill at ~4.5 s per day runs for half an hour. Per-window log
//! lines are noisy; this module emits a periodic summary with completion
//! percentage and estimated time remaining.

use std::time::{Duration, Instant};

const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_secs(60);
const DEFAULT_PERCENTAGE_STEP: f64 = 10.0;

/// Progress of one backfill run.
#[derive(Debug, Clone)]
pub struct ProgressState {
    /// Windows in the run, skipped ones included.
    pub total_windows: u32,
    /// Windows already covered by a checkpoint.
    pub skipped: u32,
    /// Windows attempted this run (fetched or failed).
    pub processed: u32,
    /// Records accumulated, checkpointed ones included.
    pub records: usize,
    start_time: Instant,
    last_update: Instant,
    update_interval: Duration,
    last_reported_percentage: f64,
    min_percentage_step: f64,
}

impl ProgressState {
    /// Start tracking a run over `total_windows` windows.
    pub fn new(total_windows: u32) -> Self {
        let now = Instant::now();
        Self {
            total_windows,
            skipped: 0,
            processed: 0,
            records: 0,
            start_time: now,
            last_update: now,
            update_interval: DEFAULT_UPDATE_INTERVAL,
            last_reported_percentage: 0.0,
            min_percentage_step: DEFAULT_PERCENTAGE_STEP,
        }
    }

    /// Override how often a time-based update is emitted.
    pub fn with_update_interval(mut self, interval: Duration) -> Self {
        self.update_interval = interval;
        self
    }

    /// Count a window skipped thanks to the checkpoint.
    pub fn record_skipped(&mut self) {
        self.skipped += 1;
    }

    /// Count a processed window and the total records so far.
    pub fn record_processed(&mut self, total_records: usize) {
        self.processed += 1;
        self.records = total_records;
    }

    /// Completion percentage (0-100) including skipped windows.
    pub fn percentage(&self) -> f64 {
        if self.total_windows == 0 {
            return 100.0;
        }
        f64::from(self.skipped + self.processed) / f64::from(self.total_windows) * 100.0
    }

    /// Estimated time left, from this run's processing rate.
    pub fn estimate_remaining(&self) -> Option<Duration> {
        if self.processed == 0 {
            return None;
        }
        let remaining = self
            .total_windows
            .saturating_sub(self.skipped + self.processed);
        let per_window = self.start_time.elapsed().as_secs_f64() / f64::from(self.processed);
        Some(Duration::from_secs_f64(per_window * f64::from(remaining)))
    }

    /// Whether a progress line is due, by percentage step or elapsed time.
    pub fn should_emit_update(&self) -> bool {
        if self.processed == 0 {
            return false;
        }
        if self.percentage() - self.last_reported_percentage >= self.min_percentage_step {
            return true;
        }
        self.last_update.elapsed() >= self.update_interval
    }

    /// Reset timers after emitting a progress line.
    pub fn mark_emitted(&mut self) {
        self.last_update = Instant::now();
        self.last_reported_percentage = self.percentage();
    }

    /// Human-readable progress line.
    pub fn format_progress(&self) -> String {
        let mut line = format!(
            "[PROGRESS] {}/{} days - {:.1}% complete, {} records",
            self.skipped + self.processed,
            self.total_windows,
            self.percentage(),
            self.records
        );
        if let Some(remaining) = self.estimate_remaining() {
            line.push_str(&format!(" - ~{} remaining", format_duration(remaining)));
        }
        line
    }
}

fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{secs}s")
    } else if secs < 3600 {
        format!("{}m", secs / 60)
    } else {
        format!("{:.1}h", secs as f64 / 3600.0)
    }
}
