use std::fmt;

use bytes::Bytes;
use checker_core::{CheckResult, FailedBatch, ProgressState, RunReport};

/// A page as returned by the origin, whatever its HTTP status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    pub final_url: String,
    pub http_status: u16,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl FetchedPage {
    pub fn html(final_url: impl Into<String>, http_status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            final_url: final_url.into(),
            http_status,
            content_type: Some("text/html; charset=utf-8".to_string()),
            body: body.into(),
        }
    }
}

/// Result of fetching one URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Content(FetchedPage),
    TimedOut,
    TransportError(FetchError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    Timeout,
    RedirectLimitExceeded,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::RedirectLimitExceeded => write!(f, "redirect limit exceeded"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::Network => write!(f, "network error"),
        }
    }
}

/// The fetching backend for a batch could not be obtained.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("fetch backend unavailable: {0}")]
pub struct BackendError(pub String);

/// A batch-fatal failure: none of the batch's URLs were processed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BatchError {
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("batch worker panicked")]
    WorkerPanicked,
}

/// Everything a run reports while it progresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    BatchDispatched {
        batch_index: usize,
        size: usize,
    },
    BatchCompleted {
        batch_index: usize,
        results: Vec<CheckResult>,
    },
    BatchFailed(FailedBatch),
    Progress(ProgressState),
    RunFinished(RunReport),
}
