//! AirNow HTTP client
//!
//! Issues one GET per window against the AirNow observation data endpoint
//! and classifies the outcome:
//! - 2xx with a JSON array (or `null`) -> records
//! - 429 -> [`FetchError::RateLimited`] carrying the `Retry-After` hint
//! - any other status >= 400 -> [`FetchError::HttpError`]
//! - transport failures -> timeout / connection / network errors

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, StatusCode};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, info};

use super::airnow_config::{AirNowSettings, ApiKey};
use super::{FetchError, FetchResult, WindowSource};
use crate::backfill::BackfillConfig;
use crate::metrics::RequestMetrics;
use crate::{Record, TimeWindow};

/// Longest response body excerpt kept in an error message.
const MAX_ERROR_BODY_CHARS: usize = 200;

/// AirNow data endpoint client
pub struct AirNowClient {
    client: Client,
    settings: AirNowSettings,
    api_key: ApiKey,
    first_request_logged: AtomicBool,
}

impl AirNowClient {
    /// Create a client around an existing `reqwest` client.
    pub fn new(client: Client, settings: AirNowSettings, api_key: ApiKey) -> Self {
        Self {
            client,
            settings,
            api_key,
            first_request_logged: AtomicBool::new(false),
        }
    }

    /// Build a client from backfill configuration.
    ///
    /// # Errors
    /// [`FetchError::MissingCredential`] when no API key is configured,
    /// [`FetchError::InvalidSetting`] for unusable request settings.
    pub fn from_config(config: &BackfillConfig) -> FetchResult<Self> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            FetchError::MissingCredential(
                "AIRNOW_API_KEY is not set; pass --api-key or set the environment variable"
                    .to_string(),
            )
        })?;
        config.airnow.validate()?;

        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::NetworkError(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self::new(client, config.airnow.clone(), api_key))
    }

    /// Request settings in use.
    pub fn settings(&self) -> &AirNowSettings {
        &self.settings
    }

    fn log_first_request(&self, params: &[(&'static str, String)]) {
        if self.first_request_logged.swap(true, Ordering::SeqCst) {
            return;
        }
        let redacted: Vec<(&str, &str)> = params
            .iter()
            .filter(|(name, _)| *name != "API_KEY")
            .map(|(name, value)| (*name, value.as_str()))
            .collect();
        debug!(
            url = %self.settings.base_url,
            params = ?redacted,
            api_key_prefix = %self.api_key.preview(),
            "First AirNow request"
        );
    }
}

#[async_trait]
impl WindowSource for AirNowClient {
    async fn fetch_window(&self, window: &TimeWindow) -> FetchResult<Vec<Record>> {
        let params = self.settings.query(window, &self.api_key);
        self.log_first_request(&params);

        info!(window = %window, "Fetching data for {}", window.start_param());

        let metrics = RequestMetrics::start(&self.settings.base_url);
        let response = match self
            .client
            .get(&self.settings.base_url)
            .query(&params)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                metrics.record_network_error();
                return Err(classify_transport_error(e));
            }
        };

        let status = response.status();
        metrics.record_complete(status.as_u16());

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = parse_retry_after(response.headers(), Utc::now());
            return Err(FetchError::RateLimited { retry_after });
        }

        if status.is_client_error() || status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            debug!(status = status.as_u16(), body = %body, "AirNow error response");
            return Err(FetchError::HttpError {
                status: status.as_u16(),
                body: truncate(&body, MAX_ERROR_BODY_CHARS),
            });
        }

        let body = response.text().await.map_err(classify_transport_error)?;
        parse_records(&body)
    }

    fn endpoint(&self) -> &str {
        &self.settings.base_url
    }
}

/// Parse a successful response body into records.
///
/// `null` is treated as a day with no observations.
pub fn parse_records(body: &str) -> FetchResult<Vec<Record>> {
    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| FetchError::ParseError(format!("Failed to deserialize response: {e}")))?;

    match value {
        serde_json::Value::Array(records) => Ok(records),
        serde_json::Value::Null => Ok(Vec::new()),
        other => Err(FetchError::InvalidResponse(format!(
            "expected a JSON array, got {}",
            json_kind(&other)
        ))),
    }
}

/// Read the `Retry-After` header as either delta-seconds or an HTTP-date.
///
/// Dates in the past yield a zero wait.
pub fn parse_retry_after(headers: &HeaderMap, now: DateTime<Utc>) -> Option<Duration> {
    let raw = headers.get(RETRY_AFTER)?.to_str().ok()?.trim();

    if let Ok(seconds) = raw.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }

    let when = DateTime::parse_from_rfc2822(raw).ok()?.with_timezone(&Utc);
    Some((when - now).to_std().unwrap_or(Duration::ZERO))
}

fn classify_transport_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout(err.to_string())
    } else if err.is_connect() {
        FetchError::ConnectionFailed(err.to_string())
    } else if err.is_decode() {
        FetchError::ParseError(err.to_string())
    } else {
        FetchError::NetworkError(err.to_string())
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{head}…")
    } else {
        head
    }
}
