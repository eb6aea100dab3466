#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use checker_core::CheckResult;
use checker_engine::{
    BackendError, EngineEvent, FailureKind, FetchBackend, FetchError, FetchOutcome, FetchedPage,
    PageFetcher, ProgressSink,
};
use chrono::{DateTime, TimeZone, Utc};

pub const VIDEO_PAGE: &str =
    r#"<html><body><video src="https://scontent.cdninstagram.com/v.mp4"></video></body></html>"#;
pub const PRIVATE_PAGE: &str =
    "<html><body><h2>This Account is Private</h2><p>Follow to see their photos.</p></body></html>";
pub const DEAD_PAGE: &str =
    "<html><body><h2>Sorry, this page isn't available.</h2></body></html>";

pub fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap()
}

/// Behaviour keyed on the URL scheme-like prefix:
/// `hang:` never answers, `broken:` fails in transport, `dead:` is a 404,
/// `private:` shows the private notice, `panic:` panics, anything else is a video page.
pub struct ScriptedFetcher {
    delay: Duration,
    _guard: Option<ActiveGuard>,
}

#[async_trait::async_trait]
impl PageFetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str, _timeout: Duration) -> FetchOutcome {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if url.starts_with("hang:") {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        if url.starts_with("panic:") {
            panic!("scripted panic for {url}");
        }
        if url.starts_with("broken:") {
            return FetchOutcome::TransportError(FetchError::new(
                FailureKind::Network,
                "connection reset",
            ));
        }
        if url.starts_with("dead:") {
            return FetchOutcome::Content(FetchedPage::html(url, 404, ""));
        }
        if url.starts_with("private:") {
            return FetchOutcome::Content(FetchedPage::html(url, 200, PRIVATE_PAGE));
        }
        FetchOutcome::Content(FetchedPage::html(url, 200, VIDEO_PAGE))
    }
}

/// Decrements the active-batch counter when the batch's fetcher is dropped.
pub struct ActiveGuard {
    active: Arc<AtomicUsize>,
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Backend that tracks how many batches hold a fetcher at once and can refuse
/// chosen acquisitions (0-based, in acquisition order).
#[derive(Default)]
pub struct TrackingBackend {
    pub delay: Duration,
    pub refuse: HashSet<usize>,
    acquired: AtomicUsize,
    active: Arc<AtomicUsize>,
    peak: AtomicUsize,
}

impl TrackingBackend {
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    pub fn refusing(refuse: impl IntoIterator<Item = usize>) -> Self {
        Self {
            refuse: refuse.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn acquired(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl FetchBackend for TrackingBackend {
    async fn acquire(&self) -> Result<Arc<dyn PageFetcher>, BackendError> {
        let n = self.acquired.fetch_add(1, Ordering::SeqCst);
        if self.refuse.contains(&n) {
            return Err(BackendError("browser could not be launched".to_string()));
        }
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        Ok(Arc::new(ScriptedFetcher {
            delay: self.delay,
            _guard: Some(ActiveGuard {
                active: self.active.clone(),
            }),
        }))
    }
}

#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<EngineEvent>>,
}

impl RecordingSink {
    pub fn take(&self) -> Vec<EngineEvent> {
        self.events.lock().unwrap().drain(..).collect()
    }
}

impl ProgressSink for RecordingSink {
    fn emit(&self, event: EngineEvent) {
        self.events.lock().unwrap().push(event);
    }
}

pub fn urls_of(results: &[CheckResult]) -> Vec<String> {
    results.iter().map(|r| r.url.clone()).collect()
}
