mod common;

use std::sync::Arc;
use std::time::Duration;

use checker_core::{tasks_from_urls, Status, UrlTask};
use checker_engine::{
    BatchScheduler, CheckSettings, EngineEvent, FetchBackend, NullSink, PhraseSignalExtractor,
    SettingsError,
};
use common::{urls_of, RecordingSink, TrackingBackend};
use futures_util::StreamExt;
use pretty_assertions::assert_eq;

fn settings(batch_size: usize, concurrency: usize) -> CheckSettings {
    CheckSettings {
        batch_size,
        concurrency,
        fetch_timeout: Duration::from_secs(5),
        ..CheckSettings::default()
    }
}

fn scheduler(settings: &CheckSettings, backend: Arc<TrackingBackend>) -> BatchScheduler {
    let backend: Arc<dyn FetchBackend> = backend;
    BatchScheduler::with_backend(
        settings,
        backend,
        Arc::new(PhraseSignalExtractor::default()),
    )
    .expect("valid settings")
}

fn tasks(urls: &[&str]) -> Vec<UrlTask> {
    tasks_from_urls(urls.iter().copied())
}

#[tokio::test]
async fn five_urls_in_batches_of_two_complete_in_input_order() {
    checker_logging::initialize_for_tests();
    let backend = Arc::new(TrackingBackend::default());
    let scheduler = scheduler(&settings(2, 2), backend.clone());
    let sink = RecordingSink::default();
    let input = ["video:1", "dead:2", "private:3", "broken:4", "video:5"];

    let report = scheduler.run(tasks(&input), &sink).await;

    assert_eq!(urls_of(&report.results), input.map(String::from).to_vec());
    assert!(report.failed_batches.is_empty());
    assert_eq!(report.results[1].status, Status::Dead);
    assert_eq!(report.results[2].status, Status::Private);
    assert_eq!(report.results[3].status, Status::failed("network error"));
    assert_eq!(backend.acquired(), 3);

    let events = sink.take();
    let dispatched = events
        .iter()
        .filter(|e| matches!(e, EngineEvent::BatchDispatched { .. }))
        .count();
    let completed = events
        .iter()
        .filter(|e| matches!(e, EngineEvent::BatchCompleted { .. }))
        .count();
    assert_eq!(dispatched, 3);
    assert_eq!(completed, 3);

    let percents: Vec<u8> = events
        .iter()
        .filter_map(|e| match e {
            EngineEvent::Progress(p) => Some(p.percent),
            _ => None,
        })
        .collect();
    assert_eq!(percents.len(), 3);
    assert!(percents.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(percents.last(), Some(&100));
    assert_eq!(events.last(), Some(&EngineEvent::RunFinished(report)));
}

#[tokio::test]
async fn no_more_than_the_concurrency_limit_run_at_once() {
    let backend = Arc::new(TrackingBackend::with_delay(Duration::from_millis(20)));
    let scheduler = scheduler(&settings(1, 3), backend.clone());
    let urls: Vec<String> = (0..8).map(|i| format!("video:{i}")).collect();

    let report = scheduler
        .run(tasks_from_urls(urls.iter().map(String::as_str)), &NullSink)
        .await;

    assert_eq!(report.results.len(), 8);
    assert_eq!(backend.acquired(), 8);
    assert_eq!(backend.peak(), 3);
}

#[tokio::test]
async fn failed_batch_is_recorded_and_the_run_continues() {
    let backend = Arc::new(TrackingBackend::refusing([1]));
    let scheduler = scheduler(&settings(2, 1), backend);
    let sink = RecordingSink::default();

    let input = tasks(&["video:a", "video:b", "video:c", "video:d", "video:e"]);

    let report = scheduler.run(input, &sink).await;

    let checked = urls_of(&report.results);
    assert_eq!(checked, vec!["video:a", "video:b", "video:e"]);
    assert_eq!(report.failed_batches.len(), 1);
    let failed = &report.failed_batches[0];
    assert_eq!(failed.batch_index, 1);
    assert_eq!(failed.urls, vec!["video:c", "video:d"]);
    assert!(failed.reason.contains("browser could not be launched"));
    assert_eq!(report.accounted_urls(), 5);

    let events = sink.take();
    let failed_events: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            EngineEvent::BatchFailed(f) => Some(f.batch_index),
            _ => None,
        })
        .collect();
    assert_eq!(failed_events, vec![1]);
    assert!(matches!(events.last(), Some(EngineEvent::RunFinished(_))));
}

#[tokio::test]
async fn panicking_batch_becomes_a_failed_batch() {
    let scheduler = scheduler(&settings(2, 2), Arc::new(TrackingBackend::default()));

    let input = tasks(&["video:a", "video:b", "panic:c", "video:d"]);

    let report = scheduler.run(input, &NullSink).await;

    assert_eq!(urls_of(&report.results), vec!["video:a", "video:b"]);
    assert_eq!(report.failed_batches.len(), 1);
    assert_eq!(report.failed_batches[0].batch_index, 1);
    assert_eq!(report.failed_batches[0].reason, "batch worker panicked");
    assert_eq!(report.accounted_urls(), 4);
}

#[tokio::test]
async fn empty_input_finishes_immediately() {
    let backend = Arc::new(TrackingBackend::default());
    let scheduler = scheduler(&settings(10, 5), backend.clone());
    let sink = RecordingSink::default();

    let report = scheduler.run(Vec::new(), &sink).await;

    assert!(report.results.is_empty());
    assert_eq!(backend.acquired(), 0);
    assert_eq!(sink.take(), vec![EngineEvent::RunFinished(report)]);
}

#[tokio::test]
async fn stream_ends_with_the_finished_report() {
    let scheduler = scheduler(&settings(3, 2), Arc::new(TrackingBackend::default()));

    let events: Vec<EngineEvent> = scheduler
        .stream(tasks(&["video:1", "dead:2", "private:3", "video:4"]))
        .collect()
        .await;

    let Some(EngineEvent::RunFinished(report)) = events.last() else {
        panic!("stream did not end with RunFinished: {events:?}");
    };
    assert_eq!(report.results.len(), 4);
    assert_eq!(
        events
            .iter()
            .filter(|e| matches!(e, EngineEvent::BatchCompleted { .. }))
            .count(),
        2
    );
}

fn zero(field: &'static str) -> Option<SettingsError> {
    Some(SettingsError::Zero { field })
}

#[test]
fn zero_settings_are_rejected() {
    let err = BatchScheduler::with_backend(
        &settings(0, 2),
        Arc::new(TrackingBackend::default()),
        Arc::new(PhraseSignalExtractor::default()),
    )
    .err();
    assert_eq!(err, zero("batch_size"));

    let err = BatchScheduler::with_backend(
        &settings(2, 0),
        Arc::new(TrackingBackend::default()),
        Arc::new(PhraseSignalExtractor::default()),
    )
    .err();
    assert_eq!(err, zero("concurrency"));
}
