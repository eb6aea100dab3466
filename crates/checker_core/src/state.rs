use std::collections::BTreeSet;

use crate::task::partition;
use crate::view_model::RunView;
use crate::{Batch, ProgressTracker, ResultAggregator, RunReport, UrlTask};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunPhase {
    #[default]
    Idle,
    Running,
    Finished,
}

/// Run-scoped state: batch queue, in-flight slots, progress and results.
///
/// Owned by exactly one scheduler loop and only changed through [`crate::update`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunState {
    phase: RunPhase,
    batches: Vec<Batch>,
    concurrency: usize,
    next_batch: usize,
    in_flight: BTreeSet<usize>,
    peak_in_flight: usize,
    progress: ProgressTracker,
    results: ResultAggregator,
}

impl RunState {
    /// Partition `tasks` into batches of `batch_size`, admitting at most
    /// `concurrency` batches at a time. Zero values are treated as one.
    pub fn new(tasks: Vec<UrlTask>, batch_size: usize, concurrency: usize) -> Self {
        let batches = partition(tasks, batch_size);
        let progress = ProgressTracker::new(batches.len());
        Self {
            phase: RunPhase::Idle,
            batches,
            concurrency: concurrency.max(1),
            next_batch: 0,
            in_flight: BTreeSet::new(),
            peak_in_flight: 0,
            progress,
            results: ResultAggregator::new(),
        }
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn total_batches(&self) -> usize {
        self.batches.len()
    }

    pub fn batch(&self, batch_index: usize) -> Option<&Batch> {
        self.batches.get(batch_index)
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Highest number of batches that were in flight at once.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight
    }

    pub fn queued(&self) -> usize {
        self.batches.len() - self.next_batch
    }

    pub fn view(&self) -> RunView {
        RunView {
            phase: self.phase,
            progress: self.progress.state(),
            in_flight: self.in_flight.len(),
            queued: self.queued(),
            results_so_far: self.results.result_count(),
            failed_batches: self.results.failed_batches().len(),
        }
    }

    pub fn into_report(self) -> RunReport {
        let failed_batches = self.results.failed_batches();
        RunReport {
            results: self.results.finalize(),
            failed_batches,
        }
    }

    pub(crate) fn begin(&mut self) {
        self.phase = RunPhase::Running;
    }

    /// Admit queued batches until every slot is taken or the queue is empty.
    pub(crate) fn fill_slots(&mut self) -> Vec<Batch> {
        let mut admitted = Vec::new();
        while self.in_flight.len() < self.concurrency && self.next_batch < self.batches.len() {
            let batch = self.batches[self.next_batch].clone();
            self.next_batch += 1;
            self.in_flight.insert(batch.index);
            admitted.push(batch);
        }
        self.peak_in_flight = self.peak_in_flight.max(self.in_flight.len());
        admitted
    }

    /// Free the slot held by `batch_index`. Returns `false` if it was not in flight.
    pub(crate) fn release(&mut self, batch_index: usize) -> bool {
        self.in_flight.remove(&batch_index)
    }

    pub(crate) fn progress_mut(&mut self) -> &mut ProgressTracker {
        &mut self.progress
    }

    pub(crate) fn results_mut(&mut self) -> &mut ResultAggregator {
        &mut self.results
    }

    /// Move to `Finished` once nothing is queued or running.
    pub(crate) fn finish_if_drained(&mut self) -> bool {
        if self.phase == RunPhase::Running
            && self.in_flight.is_empty()
            && self.next_batch >= self.batches.len()
        {
            self.phase = RunPhase::Finished;
            return true;
        }
        false
    }
}
