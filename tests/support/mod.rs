//! Shared fixtures for integration tests

#![allow(dead_code)]

use airquality_data::backfill::{BackfillConfig, Pacing, RetryPolicy};
use airquality_data::fetcher::{FetchResult, WindowSource};
use airquality_data::shutdown::SharedShutdown;
use airquality_data::{Record, TimeWindow};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::json;
use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::time::Instant;

pub fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 5, 12).unwrap()
}

/// `n` distinct records for window `index`, each at its own station.
pub fn records(index: u32, n: usize) -> Vec<Record> {
    (0..n)
        .map(|i| {
            json!({
                "Latitude": 37.0 + f64::from(index) / 100.0,
                "Longitude": -122.0 - i as f64 / 100.0,
                "Parameter": "PM2.5",
                "Value": i,
                "window": index,
            })
        })
        .collect()
}

/// Config for `days` windows writing into `dir`, with fixed pacing and default retries.
pub fn test_config(dir: &Path, days: u32) -> BackfillConfig {
    BackfillConfig {
        start_date: start_date(),
        days,
        api_key: Some("TEST-KEY-0001".parse().unwrap()),
        pacing: Pacing::fixed(Duration::from_secs(3)),
        retry: RetryPolicy::default(),
        checkpoint_path: dir.join("airnow_temp.json"),
        output_path: dir.join("airnow_output.json"),
        ..BackfillConfig::default()
    }
}

/// One recorded call: window index and (possibly paused) clock time.
#[derive(Debug, Clone, Copy)]
pub struct Call {
    pub index: u32,
    pub at: Instant,
}

/// Window source replaying scripted results per window index.
///
/// Windows without a script (or whose script ran out) succeed with
/// `default_records` records.
pub struct ScriptedSource {
    scripts: Mutex<HashMap<u32, VecDeque<FetchResult<Vec<Record>>>>>,
    default_records: usize,
    calls: Mutex<Vec<Call>>,
    shutdown_after: Mutex<Option<(u32, SharedShutdown)>>,
}

impl ScriptedSource {
    pub fn new(default_records: usize) -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            default_records,
            calls: Mutex::new(Vec::new()),
            shutdown_after: Mutex::new(None),
        }
    }

    pub fn script(self, index: u32, results: Vec<FetchResult<Vec<Record>>>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(index, VecDeque::from(results));
        self
    }

    /// Request shutdown as soon as window `index` has been served.
    pub fn shutdown_after(self, index: u32, shutdown: SharedShutdown) -> Self {
        *self.shutdown_after.lock().unwrap() = Some((index, shutdown));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn fetched_indices(&self) -> Vec<u32> {
        self.calls().iter().map(|c| c.index).collect()
    }
}

#[async_trait]
impl WindowSource for ScriptedSource {
    async fn fetch_window(&self, window: &TimeWindow) -> FetchResult<Vec<Record>> {
        self.calls.lock().unwrap().push(Call {
            index: window.index(),
            at: Instant::now(),
        });

        let scripted = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(&window.index())
            .and_then(VecDeque::pop_front);
        let result = scripted.unwrap_or_else(|| Ok(records(window.index(), self.default_records)));

        if let Some((index, shutdown)) = self.shutdown_after.lock().unwrap().as_ref() {
            if *index == window.index() {
                shutdown.request_shutdown();
            }
        }
        result
    }

    fn endpoint(&self) -> &str {
        "scripted://airnow"
    }
}

/// Canned HTTP response for [`MockServer`].
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl MockResponse {
    pub fn json(status: u16, body: &str) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }
}

/// Minimal HTTP/1.1 responder: one canned response per connection, in order.
pub struct MockServer {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<String>>>,
}

impl MockServer {
    pub async fn start(responses: Vec<MockResponse>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let queue = Arc::new(Mutex::new(VecDeque::from(responses)));

        let seen = requests.clone();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = vec![0u8; 16 * 1024];
                let mut read = 0;
                loop {
                    let n = socket.read(&mut buf[read..]).await.unwrap_or(0);
                    if n == 0 {
                        break;
                    }
                    read += n;
                    if buf[..read].windows(4).any(|w| w == b"\r\n\r\n") || read == buf.len() {
                        break;
                    }
                }

                let request = String::from_utf8_lossy(&buf[..read]).to_string();
                let request_line = request.lines().next().unwrap_or_default().to_string();
                seen.lock().unwrap().push(request_line);

                let response = queue
                    .lock()
                    .unwrap()
                    .pop_front()
                    .unwrap_or_else(|| MockResponse::json(200, "[]"));
                let mut out = format!(
                    "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n",
                    response.status,
                    reason(response.status),
                    response.body.len()
                );
                for (name, value) in &response.headers {
                    out.push_str(&format!("{name}: {value}\r\n"));
                }
                out.push_str("\r\n");
                out.push_str(&response.body);

                let _ = socket.write_all(out.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        Self { addr, requests }
    }

    pub fn url(&self) -> String {
        format!("http://{}/aq/data/", self.addr)
    }

    /// Request lines received so far, e.g. `GET /aq/data/?startDate=... HTTP/1.1`.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        401 => "Unauthorized",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Status",
    }
}
