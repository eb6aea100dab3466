use std::time::Duration;

/// Batch-level progress of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProgressState {
    pub total_batches: usize,
    pub completed_batches: usize,
    pub percent: u8,
    /// `None` until the first batch completes.
    pub eta: Option<Duration>,
}

impl ProgressState {
    pub fn is_complete(&self) -> bool {
        self.completed_batches >= self.total_batches
    }
}

/// Counts batch completions and projects the remaining time from the
/// running average batch duration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressTracker {
    state: ProgressState,
}

impl ProgressTracker {
    pub fn new(total_batches: usize) -> Self {
        Self {
            state: ProgressState {
                total_batches,
                completed_batches: 0,
                percent: percent_of(0, total_batches),
                eta: None,
            },
        }
    }

    /// Record one finished batch. `elapsed` is measured from the start of the run.
    ///
    /// Completions beyond the total are ignored so the counters never move backwards
    /// or overshoot.
    pub fn record_completion(&mut self, elapsed: Duration) -> ProgressState {
        let total = self.state.total_batches;
        if self.state.completed_batches >= total {
            return self.state;
        }
        let completed = self.state.completed_batches + 1;
        let remaining = total - completed;
        let per_batch = elapsed.div_f64(completed as f64);

        self.state = ProgressState {
            total_batches: total,
            completed_batches: completed,
            percent: percent_of(completed, total),
            eta: Some(per_batch.mul_f64(remaining as f64)),
        };
        self.state
    }

    pub fn state(&self) -> ProgressState {
        self.state
    }
}

/// Rounded percentage, held at 99 until the last batch is in.
fn percent_of(completed: usize, total: usize) -> u8 {
    if total == 0 || completed >= total {
        return 100;
    }
    let rounded = (200 * completed + total) / (2 * total);
    rounded.min(99) as u8
}
