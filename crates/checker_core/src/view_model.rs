use crate::{ProgressState, RunPhase};

/// Read-only snapshot of a run for progress displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunView {
    pub phase: RunPhase,
    pub progress: ProgressState,
    pub in_flight: usize,
    pub queued: usize,
    pub results_so_far: usize,
    pub failed_batches: usize,
}

impl RunView {
    pub fn is_done(&self) -> bool {
        self.phase == RunPhase::Finished
    }
}
