use std::time::Duration;

use checker_core::{
    tasks_from_urls, update, Batch, CheckResult, Effect, Msg, RunPhase, RunState, Status,
};
use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;

fn init_logging() {
    checker_logging::initialize_for_tests();
}

fn dispatched(effects: &[Effect]) -> Vec<usize> {
    effects
        .iter()
        .filter_map(|effect| match effect {
            Effect::DispatchBatch(batch) => Some(batch.index),
            Effect::RunFinished => None,
        })
        .collect()
}

fn finished(effects: &[Effect]) -> bool {
    effects.contains(&Effect::RunFinished)
}

fn results_for(batch: &Batch) -> Vec<CheckResult> {
    let at = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
    batch
        .tasks
        .iter()
        .map(|task| CheckResult::new(task.index, task.url.clone(), Status::Active, at))
        .collect()
}

fn complete(state: RunState, batch_index: usize, secs: u64) -> (RunState, Vec<Effect>) {
    let batch = state.batch(batch_index).cloned().expect("batch exists");
    update(
        state,
        Msg::BatchCompleted {
            batch_index,
            results: results_for(&batch),
            elapsed: Duration::from_secs(secs),
        },
    )
}

#[test]
fn five_urls_batch_two_concurrency_two() {
    init_logging();
    let state = RunState::new(tasks_from_urls(["a", "b", "c", "d", "e"]), 2, 2);
    assert_eq!(state.total_batches(), 3);

    let (state, effects) = update(state, Msg::Start);
    assert_eq!(dispatched(&effects), vec![0, 1]);
    assert_eq!(state.view().queued, 1);

    let (state, effects) = complete(state, 1, 2);
    assert_eq!(dispatched(&effects), vec![2]);
    assert_eq!(state.view().progress.percent, 33);

    let (state, effects) = complete(state, 0, 3);
    assert!(dispatched(&effects).is_empty());
    assert!(!finished(&effects));
    assert_eq!(state.view().progress.percent, 67);

    let (state, effects) = complete(state, 2, 4);
    assert!(finished(&effects));
    let view = state.view();
    assert_eq!(view.phase, RunPhase::Finished);
    assert_eq!(view.progress.percent, 100);
    assert_eq!(view.progress.eta, Some(Duration::ZERO));

    let report = state.into_report();
    let urls: Vec<_> = report.results.iter().map(|r| r.url.as_str()).collect();
    assert_eq!(urls, vec!["a", "b", "c", "d", "e"]);
    assert!(report.failed_batches.is_empty());
}

#[test]
fn in_flight_never_exceeds_concurrency() {
    let tasks = tasks_from_urls((0..23).map(|i| format!("https://x.example/{i}")));
    let (mut state, effects) = update(RunState::new(tasks, 3, 4), Msg::Start);
    assert_eq!(state.total_batches(), 8);
    let mut pending = dispatched(&effects);
    assert_eq!(pending.len(), 4);
    let mut dispatch_count = pending.len();
    let mut secs = 0;

    // Complete newest first to exercise out-of-order completion.
    while let Some(batch_index) = pending.pop() {
        secs += 1;
        let (next, effects) = complete(state, batch_index, secs);
        state = next;
        assert!(state.in_flight() <= 4);
        let newly = dispatched(&effects);
        assert!(newly.len() <= 1);
        dispatch_count += newly.len();
        pending.extend(newly);
    }

    assert_eq!(dispatch_count, 8);
    assert_eq!(state.peak_in_flight(), 4);
    assert_eq!(state.phase(), RunPhase::Finished);
    assert_eq!(state.into_report().results.len(), 23);
}

#[test]
fn batches_beyond_concurrency_wait_for_a_slot() {
    let tasks = tasks_from_urls((0..10).map(|i| i.to_string()));
    let (state, effects) = update(RunState::new(tasks, 1, 3), Msg::Start);
    assert_eq!(dispatched(&effects), vec![0, 1, 2]);
    assert_eq!(state.view().queued, 7);
    assert_eq!(state.in_flight(), 3);
}

#[test]
fn failed_batch_releases_slot_and_is_reported() {
    let (state, effects) = update(
        RunState::new(tasks_from_urls(["a", "b", "c"]), 1, 1),
        Msg::Start,
    );
    assert_eq!(dispatched(&effects), vec![0]);

    let (state, effects) = update(
        state,
        Msg::BatchFailed {
            batch_index: 0,
            reason: "backend unavailable".into(),
            elapsed: Duration::from_secs(1),
        },
    );
    assert_eq!(dispatched(&effects), vec![1]);
    assert_eq!(state.view().failed_batches, 1);

    let (state, _) = complete(state, 1, 2);
    let (state, effects) = complete(state, 2, 3);
    assert!(finished(&effects));

    let report = state.into_report();
    assert_eq!(report.results.len(), 2);
    assert_eq!(report.failed_batches.len(), 1);
    assert_eq!(report.failed_batches[0].urls, vec!["a".to_string()]);
    assert_eq!(report.failed_batches[0].reason, "backend unavailable");
    assert_eq!(report.accounted_urls(), 3);
}

#[test]
fn unknown_or_repeated_completion_is_ignored() {
    let (state, _) = update(RunState::new(tasks_from_urls(["a", "b"]), 1, 1), Msg::Start);

    let (state, effects) = complete(state, 1, 1);
    assert!(effects.is_empty());
    assert_eq!(state.view().progress.completed_batches, 0);

    let (state, _) = complete(state, 0, 1);
    let (state, effects) = complete(state, 0, 2);
    assert!(effects.is_empty());
    assert_eq!(state.view().progress.completed_batches, 1);
}

#[test]
fn start_twice_dispatches_once() {
    let (state, first) = update(RunState::new(tasks_from_urls(["a"]), 1, 1), Msg::Start);
    let (_, second) = update(state, Msg::Start);
    assert_eq!(dispatched(&first), vec![0]);
    assert!(second.is_empty());
}

#[test]
fn empty_run_finishes_on_start() {
    let (state, effects) = update(RunState::new(Vec::new(), 10, 5), Msg::Start);
    assert_eq!(effects, vec![Effect::RunFinished]);
    assert!(state.view().is_done());
    assert_eq!(state.view().progress.percent, 100);
}
