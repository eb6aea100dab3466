use std::time::Duration;

use checker_core::ProgressTracker;

#[test]
fn eta_is_undefined_before_first_completion() {
    let tracker = ProgressTracker::new(4);
    let state = tracker.state();
    assert_eq!(state.completed_batches, 0);
    assert_eq!(state.percent, 0);
    assert_eq!(state.eta, None);
}

#[test]
fn eta_projects_running_average() {
    let mut tracker = ProgressTracker::new(4);

    let state = tracker.record_completion(Duration::from_secs(10));
    assert_eq!(state.percent, 25);
    assert_eq!(state.eta, Some(Duration::from_secs(30)));

    // Recomputed fresh: 30s over 2 batches = 15s each, 2 remaining.
    let state = tracker.record_completion(Duration::from_secs(30));
    assert_eq!(state.percent, 50);
    assert_eq!(state.eta, Some(Duration::from_secs(30)));
}

#[test]
fn progress_is_monotonic_and_hits_100_only_at_the_end() {
    let total = 7;
    let mut tracker = ProgressTracker::new(total);
    let mut last_percent = 0;
    let mut last_completed = 0;
    for i in 1..=total {
        let state = tracker.record_completion(Duration::from_millis(100 * i as u64));
        assert!(state.percent >= last_percent);
        assert!(state.completed_batches > last_completed);
        assert_eq!(state.percent == 100, state.completed_batches == total);
        last_percent = state.percent;
        last_completed = state.completed_batches;
    }
    assert!(tracker.state().is_complete());
}

#[test]
fn extra_completions_do_not_overshoot() {
    let mut tracker = ProgressTracker::new(1);
    tracker.record_completion(Duration::from_secs(1));
    let state = tracker.record_completion(Duration::from_secs(2));
    assert_eq!(state.completed_batches, 1);
    assert_eq!(state.percent, 100);
}
