use std::sync::Arc;
use std::time::Duration;

use checker_core::{classify, Batch, CheckResult, Status, UrlTask};
use checker_logging::{checker_debug, checker_warn};
use chrono::{DateTime, Utc};
use futures_util::{stream, StreamExt};

use crate::extract::SignalExtractor;
use crate::fetch::{FetchBackend, PageFetcher};
use crate::{BatchError, FetchOutcome};

/// Source of `checked_at` timestamps.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

pub fn system_clock() -> Clock {
    Arc::new(Utc::now)
}

/// Runs fetch -> extract -> classify for every URL of one batch.
pub struct BatchWorker {
    backend: Arc<dyn FetchBackend>,
    extractor: Arc<dyn SignalExtractor>,
    fetch_timeout: Duration,
    max_pages: usize,
    clock: Clock,
}

impl BatchWorker {
    pub fn new(
        backend: Arc<dyn FetchBackend>,
        extractor: Arc<dyn SignalExtractor>,
        fetch_timeout: Duration,
        max_pages: usize,
    ) -> Self {
        Self {
            backend,
            extractor,
            fetch_timeout,
            max_pages: max_pages.max(1),
            clock: system_clock(),
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// One result per task, in task order. Fails as a whole only if the backend
    /// cannot be acquired; individual URL failures become `Status::Failed`.
    pub async fn run(&self, batch: &Batch) -> Result<Vec<CheckResult>, BatchError> {
        let fetcher = self.backend.acquire().await?;
        let fetcher = fetcher.as_ref();

        let results = stream::iter(batch.tasks.iter().cloned())
            .map(|task| self.check_one(fetcher, task))
            .buffered(self.max_pages)
            .collect::<Vec<_>>()
            .await;

        checker_debug!("batch {} checked {} urls", batch.index, results.len());
        Ok(results)
    }

    async fn check_one(&self, fetcher: &dyn PageFetcher, task: UrlTask) -> CheckResult {
        let fetch = fetcher.fetch(&task.url, self.fetch_timeout);
        let outcome = tokio::time::timeout(self.fetch_timeout, fetch)
            .await
            .unwrap_or(FetchOutcome::TimedOut);
        let status = status_for_outcome(outcome, self.extractor.as_ref());
        if let Status::Failed(reason) = &status {
            checker_warn!("url #{} {} failed: {}", task.index, task.url, reason);
        }
        CheckResult::new(task.index, task.url, status, (self.clock)())
    }
}

/// Map a fetch outcome to a status. Incomplete fetches never reach the classifier.
pub fn status_for_outcome(outcome: FetchOutcome, extractor: &dyn SignalExtractor) -> Status {
    match outcome {
        FetchOutcome::TimedOut => Status::failed("timeout"),
        FetchOutcome::TransportError(err) => {
            checker_debug!("transport error: {}", err);
            Status::failed(err.kind.to_string())
        }
        FetchOutcome::Content(page) => classify(&extractor.extract(&page)),
    }
}
