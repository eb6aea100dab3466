use std::collections::BTreeMap;

use crate::{CheckResult, FailedBatch};

/// Collects per-batch results in whatever order batches finish.
///
/// `finalize` restores submission order by sorting on `CheckResult::index`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultAggregator {
    batches: BTreeMap<usize, Vec<CheckResult>>,
    failed: BTreeMap<usize, FailedBatch>,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` if results for this batch were already recorded.
    pub fn add(&mut self, batch_index: usize, results: Vec<CheckResult>) -> bool {
        if self.is_recorded(batch_index) {
            return false;
        }
        self.batches.insert(batch_index, results);
        true
    }

    /// Returns `false` if this batch was already recorded.
    pub fn add_failed(&mut self, failed: FailedBatch) -> bool {
        if self.is_recorded(failed.batch_index) {
            return false;
        }
        self.failed.insert(failed.batch_index, failed);
        true
    }

    pub fn is_recorded(&self, batch_index: usize) -> bool {
        self.batches.contains_key(&batch_index) || self.failed.contains_key(&batch_index)
    }

    pub fn result_count(&self) -> usize {
        self.batches.values().map(Vec::len).sum()
    }

    pub fn failed_batches(&self) -> Vec<FailedBatch> {
        self.failed.values().cloned().collect()
    }

    pub fn finalize(self) -> Vec<CheckResult> {
        let mut results: Vec<CheckResult> = self.batches.into_values().flatten().collect();
        results.sort_by_key(|result| result.index);
        results
    }
}
