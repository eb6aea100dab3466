use std::time::Duration;

use crate::CheckResult;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Begin dispatching batches.
    Start,
    /// A worker returned one result per URL of its batch.
    BatchCompleted {
        batch_index: usize,
        results: Vec<CheckResult>,
        /// Time since the run started.
        elapsed: Duration,
    },
    /// A worker could not process its batch at all.
    BatchFailed {
        batch_index: usize,
        reason: String,
        elapsed: Duration,
    },
}
