use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Classification outcome for one URL.
///
/// Serialized adjacently tagged, so a result row reads
/// `{"status": "Failed", "reason": "timeout"}` or `{"status": "Active"}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason")]
pub enum Status {
    Active,
    Dead,
    Private,
    Unknown,
    Failed(String),
}

impl Status {
    /// All labels, in the order exports list them.
    pub const LABELS: [&'static str; 5] = ["Active", "Dead", "Private", "Unknown", "Failed"];

    /// Stable label exposed to callers; never includes the failure reason.
    pub fn label(&self) -> &'static str {
        match self {
            Status::Active => "Active",
            Status::Dead => "Dead",
            Status::Private => "Private",
            Status::Unknown => "Unknown",
            Status::Failed(_) => "Failed",
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Status::Failed(reason) => Some(reason),
            _ => None,
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Status::Failed(reason.into())
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Status::Failed(_))
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Failed(reason) => write!(f, "Failed ({reason})"),
            other => f.write_str(other.label()),
        }
    }
}

/// Status of one submitted URL plus when it was determined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    pub index: usize,
    pub url: String,
    #[serde(flatten)]
    pub status: Status,
    pub checked_at: DateTime<Utc>,
}

impl CheckResult {
    pub fn new(
        index: usize,
        url: impl Into<String>,
        status: Status,
        checked_at: DateTime<Utc>,
    ) -> Self {
        Self {
            index,
            url: url.into(),
            status,
            checked_at,
        }
    }
}

/// A batch that produced no results because its fetching backend could not be used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedBatch {
    pub batch_index: usize,
    pub urls: Vec<String>,
    pub reason: String,
}

/// Final outcome of one classification run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RunReport {
    pub results: Vec<CheckResult>,
    pub failed_batches: Vec<FailedBatch>,
}

impl RunReport {
    /// URLs accounted for, either by a result or by a failed batch.
    pub fn accounted_urls(&self) -> usize {
        self.results.len()
            + self
                .failed_batches
                .iter()
                .map(|batch| batch.urls.len())
                .sum::<usize>()
    }

    /// Result count per status label, in `Status::LABELS` order.
    pub fn status_counts(&self) -> Vec<(&'static str, usize)> {
        Status::LABELS
            .iter()
            .map(|label| {
                let count = self
                    .results
                    .iter()
                    .filter(|r| r.status.label() == *label)
                    .count();
                (*label, count)
            })
            .collect()
    }
}
