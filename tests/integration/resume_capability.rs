//! Integration tests for resumable backfills

use crate::support::{records, test_config, ScriptedSource};
use airquality_data::backfill::{BackfillError, BackfillExecutor};
use airquality_data::resume::{Checkpoint, CheckpointStore, JsonFileStore};
use airquality_data::shutdown::ShutdownCoordinator;
use std::sync::Arc;
use tempfile::TempDir;

fn read_output(path: &std::path::Path) -> Vec<serde_json::Value> {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_interrupted_run_resumes_after_last_checkpoint() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path(), 10);

    // First run: Ctrl+C right after the fourth day is fetched
    let shutdown = ShutdownCoordinator::shared();
    let first = Arc::new(ScriptedSource::new(2).shutdown_after(3, shutdown.clone()));
    let result = BackfillExecutor::new(
        config.clone(),
        first.clone(),
        Arc::new(JsonFileStore::new(&config.checkpoint_path)),
    )
    .with_shutdown(shutdown)
    .run()
    .await;

    assert!(matches!(
        result,
        Err(BackfillError::Interrupted { last_completed: Some(3) })
    ));
    assert_eq!(first.fetched_indices(), vec![0, 1, 2, 3]);
    assert!(!config.output_path.exists());

    let saved = JsonFileStore::new(&config.checkpoint_path).load().unwrap().unwrap();
    assert_eq!(saved.last_day, Some(3));
    assert_eq!(saved.record_count(), 8);

    // Second run picks up at day 4
    let second = Arc::new(ScriptedSource::new(2));
    let report = BackfillExecutor::new(
        config.clone(),
        second.clone(),
        Arc::new(JsonFileStore::new(&config.checkpoint_path)),
    )
    .with_shutdown(ShutdownCoordinator::shared())
    .run()
    .await
    .unwrap();

    assert_eq!(second.fetched_indices(), (4..10).collect::<Vec<_>>());
    assert_eq!(report.skipped, 4);
    assert_eq!(report.fetched, 6);
    assert_eq!(report.records, 20);
    assert!(!config.checkpoint_path.exists());

    // Same artifact as an uninterrupted run
    let resumed = read_output(&config.output_path);
    let clean_dir = TempDir::new().unwrap();
    let clean_config = test_config(clean_dir.path(), 10);
    BackfillExecutor::new(
        clean_config.clone(),
        Arc::new(ScriptedSource::new(2)),
        Arc::new(JsonFileStore::new(&clean_config.checkpoint_path)),
    )
    .with_shutdown(ShutdownCoordinator::shared())
    .run()
    .await
    .unwrap();
    assert_eq!(resumed, read_output(&clean_config.output_path));
}

#[tokio::test(start_paused = true)]
async fn test_each_window_contributes_exactly_once() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path(), 5);
    let store = Arc::new(JsonFileStore::new(&config.checkpoint_path));

    let mut checkpoint = Checkpoint::new();
    checkpoint.record_window(0, records(0, 3));
    checkpoint.record_window(1, records(1, 3));
    store.save(&checkpoint).unwrap();

    let source = Arc::new(ScriptedSource::new(3));
    let report = BackfillExecutor::new(config.clone(), source.clone(), store)
        .with_shutdown(ShutdownCoordinator::shared())
        .run()
        .await
        .unwrap();

    assert_eq!(source.fetched_indices(), vec![2, 3, 4]);
    assert_eq!(report.records, 15);

    let output = read_output(&config.output_path);
    for window in 0..5 {
        let count = output.iter().filter(|r| r["window"] == window).count();
        assert_eq!(count, 3, "window {window}");
    }
}

#[tokio::test(start_paused = true)]
async fn test_checkpoint_file_format() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path(), 3);
    let shutdown = ShutdownCoordinator::shared();
    let source = Arc::new(ScriptedSource::new(1).shutdown_after(0, shutdown.clone()));

    let _ = BackfillExecutor::new(
        config.clone(),
        source,
        Arc::new(JsonFileStore::new(&config.checkpoint_path)),
    )
    .with_shutdown(shutdown)
    .run()
    .await;

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&config.checkpoint_path).unwrap()).unwrap();
    assert_eq!(raw["last_day"], 0);
    assert_eq!(raw["results"].as_array().unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_checkpoint_written_by_earlier_tooling_is_honored() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path(), 3);
    std::fs::write(
        &config.checkpoint_path,
        r#"{"results": [{"SiteName": "Oakland", "Latitude": 37.8, "Longitude": -122.3}], "last_day": 1}"#,
    )
    .unwrap();

    let source = Arc::new(ScriptedSource::new(1));
    let report = BackfillExecutor::new(
        config.clone(),
        source.clone(),
        Arc::new(JsonFileStore::new(&config.checkpoint_path)),
    )
    .with_shutdown(ShutdownCoordinator::shared())
    .run()
    .await
    .unwrap();

    assert_eq!(source.fetched_indices(), vec![2]);
    assert_eq!(report.records, 2);
    assert_eq!(read_output(&config.output_path)[0]["SiteName"], "Oakland");
}

#[tokio::test(start_paused = true)]
async fn test_negative_last_day_means_nothing_completed() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path(), 2);
    std::fs::write(&config.checkpoint_path, r#"{"results": [], "last_day": -1}"#).unwrap();

    let source = Arc::new(ScriptedSource::new(1));
    BackfillExecutor::new(
        config.clone(),
        source.clone(),
        Arc::new(JsonFileStore::new(&config.checkpoint_path)),
    )
    .with_shutdown(ShutdownCoordinator::shared())
    .run()
    .await
    .unwrap();

    assert_eq!(source.fetched_indices(), vec![0, 1]);
}

#[tokio::test(start_paused = true)]
async fn test_corrupt_checkpoint_starts_fresh() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path(), 2);
    std::fs::write(&config.checkpoint_path, "{\"results\": [1, 2").unwrap();

    let source = Arc::new(ScriptedSource::new(1));
    let report = BackfillExecutor::new(
        config.clone(),
        source.clone(),
        Arc::new(JsonFileStore::new(&config.checkpoint_path)),
    )
    .with_shutdown(ShutdownCoordinator::shared())
    .run()
    .await
    .unwrap();

    assert_eq!(source.fetched_indices(), vec![0, 1]);
    assert_eq!(report.records, 2);
}

#[tokio::test(start_paused = true)]
async fn test_failed_window_before_checkpoint_is_not_retried_on_resume() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path(), 4);
    let shutdown = ShutdownCoordinator::shared();
    let failing = || {
        Err(airquality_data::fetcher::FetchError::ConnectionFailed(
            "refused".to_string(),
        ))
    };
    let first = Arc::new(
        ScriptedSource::new(1)
            .script(1, vec![failing(), failing(), failing()])
            .shutdown_after(2, shutdown.clone()),
    );

    let _ = BackfillExecutor::new(
        config.clone(),
        first,
        Arc::new(JsonFileStore::new(&config.checkpoint_path)),
    )
    .with_shutdown(shutdown)
    .run()
    .await;

    // Resume point is the last success, so day 1 stays a gap
    let second = Arc::new(ScriptedSource::new(1));
    let report = BackfillExecutor::new(
        config.clone(),
        second.clone(),
        Arc::new(JsonFileStore::new(&config.checkpoint_path)),
    )
    .with_shutdown(ShutdownCoordinator::shared())
    .run()
    .await
    .unwrap();

    assert_eq!(second.fetched_indices(), vec![3]);
    assert_eq!(report.records, 3);
}
