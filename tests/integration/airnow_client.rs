//! AirNow client against a local HTTP responder

use crate::support::{start_date, MockResponse, MockServer};
use airquality_data::backfill::{BackfillConfig, BackfillExecutor, Pacing, RetryPolicy};
use airquality_data::fetcher::airnow::AirNowClient;
use airquality_data::fetcher::airnow_config::AirNowSettings;
use airquality_data::fetcher::{FetchError, WindowSource};
use airquality_data::resume::JsonFileStore;
use airquality_data::shutdown::ShutdownCoordinator;
use airquality_data::TimeWindow;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn client_for(server: &MockServer) -> AirNowClient {
    let settings = AirNowSettings {
        base_url: server.url(),
        ..AirNowSettings::default()
    };
    AirNowClient::new(
        reqwest::Client::new(),
        settings,
        "SECRET-KEY-123".parse().unwrap(),
    )
}

fn window() -> TimeWindow {
    TimeWindow::new(0, start_date())
}

#[tokio::test]
async fn test_request_carries_window_and_filters() {
    let server = MockServer::start(vec![MockResponse::json(
        200,
        r#"[{"Latitude": 37.8, "Longitude": -122.2, "Parameter": "OZONE", "Value": 31}]"#,
    )])
    .await;

    let records = client_for(&server).fetch_window(&window()).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["Parameter"], "OZONE");

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    let line = &requests[0];
    assert!(line.starts_with("GET /aq/data/?"), "{line}");
    assert!(line.contains("startDate=2025-05-12T00"), "{line}");
    assert!(line.contains("endDate=2025-05-12T23"), "{line}");
    assert!(line.contains("parameters=OZONE%2CPM25"), "{line}");
    assert!(line.contains("BBOX=-122.75%2C37.3%2C-121.75%2C38.0"), "{line}");
    assert!(line.contains("dataType=B"), "{line}");
    assert!(line.contains("format=application%2Fjson"), "{line}");
    assert!(line.contains("API_KEY=SECRET-KEY-123"), "{line}");
}

#[tokio::test]
async fn test_null_body_is_empty_day() {
    let server = MockServer::start(vec![MockResponse::json(200, "null")]).await;
    let records = client_for(&server).fetch_window(&window()).await.unwrap();
    assert!(records.is_empty());
}

#[tokio::test]
async fn test_429_exposes_retry_after() {
    let server = MockServer::start(vec![
        MockResponse::json(429, r#"{"error": "quota"}"#).header("Retry-After", "17"),
    ])
    .await;

    let err = client_for(&server).fetch_window(&window()).await.unwrap_err();
    match err {
        FetchError::RateLimited { retry_after } => {
            assert_eq!(retry_after, Some(Duration::from_secs(17)));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_429_without_header() {
    let server = MockServer::start(vec![MockResponse::json(429, "")]).await;
    let err = client_for(&server).fetch_window(&window()).await.unwrap_err();
    assert!(matches!(err, FetchError::RateLimited { retry_after: None }));
}

#[tokio::test]
async fn test_http_error_carries_status_and_body() {
    let server = MockServer::start(vec![MockResponse::json(401, r#"{"message": "invalid key"}"#)]).await;
    let err = client_for(&server).fetch_window(&window()).await.unwrap_err();
    match err {
        FetchError::HttpError { status, body } => {
            assert_eq!(status, 401);
            assert!(body.contains("invalid key"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_malformed_bodies() {
    let server = MockServer::start(vec![
        MockResponse::json(200, "<html>maintenance</html>"),
        MockResponse::json(200, r#"{"WebServiceError": "busy"}"#),
    ])
    .await;
    let client = client_for(&server);

    assert!(matches!(
        client.fetch_window(&window()).await,
        Err(FetchError::ParseError(_))
    ));
    assert!(matches!(
        client.fetch_window(&window()).await,
        Err(FetchError::InvalidResponse(_))
    ));
}

#[tokio::test]
async fn test_connection_refused_is_network_failure() {
    // bind then drop to get a port with nothing listening
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let settings = AirNowSettings {
        base_url: format!("http://{addr}/aq/data/"),
        ..AirNowSettings::default()
    };
    let client = AirNowClient::new(reqwest::Client::new(), settings, "KEY".parse().unwrap());

    let err = client.fetch_window(&window()).await.unwrap_err();
    assert!(matches!(
        err,
        FetchError::ConnectionFailed(_) | FetchError::NetworkError(_)
    ));
}

#[tokio::test]
async fn test_backfill_through_http() {
    let server = MockServer::start(vec![
        MockResponse::json(200, r#"[{"Latitude": 37.8, "Longitude": -122.2}]"#),
        MockResponse::json(429, "").header("Retry-After", "0"),
        MockResponse::json(200, r#"[{"Latitude": 37.9, "Longitude": -122.1}, {"Latitude": 37.9, "Longitude": -122.1}]"#),
        MockResponse::json(200, "null"),
    ])
    .await;
    let dir = TempDir::new().unwrap();

    let mut config = BackfillConfig {
        start_date: start_date(),
        days: 3,
        api_key: Some("SECRET-KEY-123".parse().unwrap()),
        pacing: Pacing::fixed(Duration::from_millis(10)),
        retry: RetryPolicy::from_base_delay(3, Duration::from_millis(10)).unwrap(),
        checkpoint_path: dir.path().join("temp.json"),
        output_path: dir.path().join("out/airnow.json"),
        ..BackfillConfig::default()
    };
    config.airnow.base_url = server.url();

    let source = Arc::new(AirNowClient::from_config(&config).unwrap());
    let store = Arc::new(JsonFileStore::new(&config.checkpoint_path));
    let report = BackfillExecutor::new(config.clone(), source, store)
        .with_shutdown(ShutdownCoordinator::shared())
        .run()
        .await
        .unwrap();

    assert_eq!(report.records, 3);
    assert_eq!(report.stations, 2);
    assert!(report.failed.is_empty());

    let requests = server.requests();
    assert_eq!(requests.len(), 4);
    assert!(requests[1].contains("startDate=2025-05-11T00"));
    assert!(requests[2].contains("startDate=2025-05-11T00"));
    assert!(requests[3].contains("startDate=2025-05-10T00"));
    assert!(config.output_path.exists());
    assert!(!config.checkpoint_path.exists());
}

#[test]
fn test_from_config_requires_key() {
    let config = BackfillConfig::default();
    assert!(matches!(
        AirNowClient::from_config(&config),
        Err(FetchError::MissingCredential(_))
    ));
}
