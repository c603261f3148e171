//! End-to-end backfill runs against a scripted source

use crate::support::{records, start_date, test_config, ScriptedSource};
use airquality_data::backfill::{BackfillError, BackfillExecutor};
use airquality_data::fetcher::FetchError;
use airquality_data::resume::{CheckpointStore, JsonFileStore, MemoryStore};
use airquality_data::shutdown::ShutdownCoordinator;
use std::sync::Arc;
use tempfile::TempDir;

fn server_error() -> Result<Vec<airquality_data::Record>, FetchError> {
    Err(FetchError::HttpError {
        status: 500,
        body: "upstream unavailable".to_string(),
    })
}

#[tokio::test(start_paused = true)]
async fn test_three_days_first_fails_rest_combined() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path(), 3);
    let source = Arc::new(
        ScriptedSource::new(0)
            .script(0, vec![server_error(), server_error(), server_error()])
            .script(1, vec![Ok(records(1, 5))])
            .script(2, vec![Ok(records(2, 7))]),
    );
    let store = Arc::new(JsonFileStore::new(&config.checkpoint_path));

    let report = BackfillExecutor::new(config.clone(), source.clone(), store)
        .with_shutdown(ShutdownCoordinator::shared())
        .run()
        .await
        .unwrap();

    assert_eq!(report.records, 12);
    assert_eq!(report.failed, vec![start_date()]);
    assert_eq!(report.fetched, 2);
    assert_eq!(source.fetched_indices(), vec![0, 0, 0, 1, 2]);

    let written: Vec<serde_json::Value> =
        serde_json::from_str(&std::fs::read_to_string(&config.output_path).unwrap()).unwrap();
    assert_eq!(written.len(), 12);
    assert_eq!(written[0]["window"], 1);
    assert_eq!(written[11]["window"], 2);
    assert!(!config.checkpoint_path.exists());
}

#[tokio::test(start_paused = true)]
async fn test_every_window_failing_still_completes() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path(), 4);
    let mut source = ScriptedSource::new(0);
    for index in 0..4 {
        source = source.script(index, vec![server_error(), server_error(), server_error()]);
    }
    let source = Arc::new(source);

    let report = BackfillExecutor::new(config.clone(), source.clone(), Arc::new(MemoryStore::new()))
        .with_shutdown(ShutdownCoordinator::shared())
        .run()
        .await
        .unwrap();

    assert_eq!(report.failed.len(), 4);
    assert_eq!(report.records, 0);
    assert_eq!(source.calls().len(), 12);
    assert_eq!(std::fs::read_to_string(&config.output_path).unwrap().trim(), "[]");
}

#[tokio::test(start_paused = true)]
async fn test_output_is_pretty_printed_array() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path(), 2);
    let source = Arc::new(ScriptedSource::new(1));

    BackfillExecutor::new(config.clone(), source, Arc::new(MemoryStore::new()))
        .with_shutdown(ShutdownCoordinator::shared())
        .run()
        .await
        .unwrap();

    let text = std::fs::read_to_string(&config.output_path).unwrap();
    assert!(text.starts_with("[\n  {"));
    assert!(text.ends_with("]\n"));
}

#[tokio::test(start_paused = true)]
async fn test_empty_days_contribute_nothing() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path(), 3);
    let source = Arc::new(ScriptedSource::new(2).script(1, vec![Ok(Vec::new())]));

    let report = BackfillExecutor::new(config, source, Arc::new(MemoryStore::new()))
        .with_shutdown(ShutdownCoordinator::shared())
        .run()
        .await
        .unwrap();

    assert_eq!(report.records, 4);
    assert_eq!(report.fetched, 3);
    assert!(report.failed.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_station_count_in_report() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path(), 2);
    // same three stations both days
    let day = |window: u32| {
        (0..3)
            .map(|i| serde_json::json!({"Latitude": 37.5, "Longitude": -122.0 - f64::from(i), "window": window}))
            .collect::<Vec<_>>()
    };
    let source = Arc::new(
        ScriptedSource::new(0)
            .script(0, vec![Ok(day(0))])
            .script(1, vec![Ok(day(1))]),
    );

    let report = BackfillExecutor::new(config, source, Arc::new(MemoryStore::new()))
        .with_shutdown(ShutdownCoordinator::shared())
        .run()
        .await
        .unwrap();

    assert_eq!(report.records, 6);
    assert_eq!(report.stations, 3);
}

#[tokio::test(start_paused = true)]
async fn test_unwritable_checkpoint_is_fatal() {
    let dir = TempDir::new().unwrap();
    let mut config = test_config(dir.path(), 2);
    // a regular file where the checkpoint directory should be
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "not a directory").unwrap();
    config.checkpoint_path = blocker.join("temp.json");
    let store = Arc::new(JsonFileStore::new(&config.checkpoint_path));

    let result = BackfillExecutor::new(config.clone(), Arc::new(ScriptedSource::new(1)), store.clone())
        .with_shutdown(ShutdownCoordinator::shared())
        .run()
        .await;

    assert!(matches!(result, Err(BackfillError::Checkpoint(_))));
    assert!(store.load().unwrap_or(None).is_none());
    assert!(!config.output_path.exists());
}
