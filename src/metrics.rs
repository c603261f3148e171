//! Backfill observability metrics
//!
//! Counters and histograms are recorded through the `metrics` facade and are
//! no-ops until a recorder is installed. Long backfills can expose them to
//! Prometheus with [`init_metrics`].

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use once_cell::sync::OnceCell;
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

static METRICS_ADDR: OnceCell<SocketAddr> = OnceCell::new();

/// Install the Prometheus exporter on `addr`.
///
/// Must be called from within a Tokio runtime. Calling it again is a no-op.
pub fn init_metrics(addr: SocketAddr) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(existing) = METRICS_ADDR.get() {
        debug!(addr = %existing, "Metrics already initialized, skipping");
        return Ok(());
    }

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {e}"))?;

    describe_counter!(
        "http_requests_total",
        Unit::Count,
        "Total number of HTTP requests made to the data API"
    );
    describe_counter!(
        "http_429_errors_total",
        Unit::Count,
        "Total number of 429 rate limit responses"
    );
    describe_counter!(
        "http_retries_total",
        Unit::Count,
        "Total number of retry attempts"
    );
    describe_histogram!(
        "http_request_duration_seconds",
        Unit::Seconds,
        "HTTP request duration in seconds"
    );
    describe_histogram!(
        "retry_backoff_duration_seconds",
        Unit::Seconds,
        "Wait before a retry in seconds"
    );
    describe_counter!(
        "backfill_windows_total",
        Unit::Count,
        "Windows by outcome (fetched, failed, skipped)"
    );
    describe_counter!(
        "backfill_records_total",
        Unit::Count,
        "Records accumulated by the backfill"
    );

    let _ = METRICS_ADDR.set(addr);
    info!(addr = %addr, "Metrics exporter listening");
    Ok(())
}

/// Timing and outcome of one HTTP request
pub struct RequestMetrics {
    endpoint: String,
    start_time: Instant,
}

impl RequestMetrics {
    /// Start recording a request
    pub fn start(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            start_time: Instant::now(),
        }
    }

    /// Record a response with `status_code`
    pub fn record_complete(&self, status_code: u16) {
        let duration = self.start_time.elapsed();

        counter!(
            "http_requests_total",
            "endpoint" => self.endpoint.clone(),
            "status" => status_code.to_string(),
        )
        .increment(1);
        histogram!(
            "http_request_duration_seconds",
            "endpoint" => self.endpoint.clone(),
        )
        .record(duration.as_secs_f64());

        if status_code == 429 {
            counter!("http_429_errors_total", "endpoint" => self.endpoint.clone()).increment(1);
            warn!(
                endpoint = %self.endpoint,
                duration_ms = duration.as_millis(),
                "Rate limit response (429)"
            );
        }

        debug!(
            endpoint = %self.endpoint,
            status = status_code,
            duration_ms = duration.as_millis(),
            "HTTP request completed"
        );
    }

    /// Record a transport failure (no status code)
    pub fn record_network_error(&self) {
        let duration = self.start_time.elapsed();

        counter!(
            "http_requests_total",
            "endpoint" => self.endpoint.clone(),
            "status" => "network_error",
        )
        .increment(1);
        histogram!(
            "http_request_duration_seconds",
            "endpoint" => self.endpoint.clone(),
        )
        .record(duration.as_secs_f64());
    }
}

/// Record the wait before retry `attempt` of a window
pub fn record_retry_backoff(duration: Duration, attempt: u32, reason: &'static str) {
    counter!(
        "http_retries_total",
        "attempt" => attempt.to_string(),
        "reason" => reason,
    )
    .increment(1);
    histogram!("retry_backoff_duration_seconds", "reason" => reason)
        .record(duration.as_secs_f64());
}

/// Window outcome label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowOutcome {
    /// Records fetched and checkpointed
    Fetched,
    /// Every attempt failed
    Failed,
    /// Already covered by the checkpoint
    Skipped,
}

impl WindowOutcome {
    fn label(&self) -> &'static str {
        match self {
            Self::Fetched => "fetched",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }
}

/// Record the outcome of one window and the records it contributed
pub fn record_window(outcome: WindowOutcome, records: usize) {
    counter!("backfill_windows_total", "outcome" => outcome.label()).increment(1);
    if records > 0 {
        counter!("backfill_records_total").increment(records as u64);
    }
}
