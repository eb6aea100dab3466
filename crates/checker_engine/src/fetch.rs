use std::sync::Arc;
use std::time::Duration;

use bytes::BytesMut;
use checker_logging::checker_debug;
use futures_util::StreamExt;
use reqwest::header::CONTENT_TYPE;
use reqwest::redirect::Policy;

use crate::settings::FetchSettings;
use crate::{BackendError, FailureKind, FetchError, FetchOutcome, FetchedPage};

/// Retrieves one URL. Implementations must not outlive `timeout` by much; the
/// worker enforces it as a hard bound regardless.
#[async_trait::async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str, timeout: Duration) -> FetchOutcome;
}

/// Hands out the fetching resource used by one batch.
///
/// Failing to acquire it fails the whole batch.
#[async_trait::async_trait]
pub trait FetchBackend: Send + Sync {
    async fn acquire(&self) -> Result<Arc<dyn PageFetcher>, BackendError>;
}

/// Backend that builds one pooled reqwest client per batch.
#[derive(Debug, Clone)]
pub struct ReqwestBackend {
    settings: FetchSettings,
}

impl ReqwestBackend {
    pub fn new(settings: FetchSettings) -> Self {
        Self { settings }
    }

    fn build_client(&self) -> Result<reqwest::Client, BackendError> {
        reqwest::Client::builder()
            .connect_timeout(self.settings.connect_timeout)
            .redirect(Policy::limited(self.settings.redirect_limit))
            .user_agent(self.settings.user_agent.clone())
            .build()
            .map_err(|err| BackendError(err.to_string()))
    }
}

#[async_trait::async_trait]
impl FetchBackend for ReqwestBackend {
    async fn acquire(&self) -> Result<Arc<dyn PageFetcher>, BackendError> {
        let client = self.build_client()?;
        Ok(Arc::new(ReqwestFetcher {
            client,
            max_bytes: self.settings.max_bytes,
        }))
    }
}

#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: reqwest::Client,
    max_bytes: u64,
}

impl ReqwestFetcher {
    pub fn new(settings: &FetchSettings) -> Result<Self, BackendError> {
        let client = ReqwestBackend::new(settings.clone()).build_client()?;
        Ok(Self {
            client,
            max_bytes: settings.max_bytes,
        })
    }

    async fn fetch_page(&self, url: &str, timeout: Duration) -> Result<FetchedPage, FetchError> {
        let parsed = reqwest::Url::parse(url)
            .map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))?;

        let response = self
            .client
            .get(parsed)
            .timeout(timeout)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let http_status = response.status().as_u16();
        if let Some(content_len) = response.content_length() {
            if content_len > self.max_bytes {
                return Err(too_large(self.max_bytes, content_len));
            }
        }

        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        let mut body = BytesMut::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = body.len() as u64 + chunk.len() as u64;
            if next_len > self.max_bytes {
                return Err(too_large(self.max_bytes, next_len));
            }
            body.extend_from_slice(&chunk);
        }

        checker_debug!(
            "fetched url={} status={} bytes={}",
            final_url,
            http_status,
            body.len()
        );

        Ok(FetchedPage {
            final_url,
            http_status,
            content_type,
            body: body.freeze(),
        })
    }
}

#[async_trait::async_trait]
impl PageFetcher for ReqwestFetcher {
    async fn fetch(&self, url: &str, timeout: Duration) -> FetchOutcome {
        match self.fetch_page(url, timeout).await {
            Ok(page) => FetchOutcome::Content(page),
            Err(err) if err.kind == FailureKind::Timeout => FetchOutcome::TimedOut,
            Err(err) => err.into(),
        }
    }
}

impl From<FetchError> for FetchOutcome {
    fn from(err: FetchError) -> Self {
        FetchOutcome::TransportError(err)
    }
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_redirect() {
        return FetchError::new(FailureKind::RedirectLimitExceeded, err.to_string());
    }
    FetchError::new(FailureKind::Network, err.to_string())
}

fn too_large(max_bytes: u64, actual: u64) -> FetchError {
    FetchError::new(
        FailureKind::TooLarge {
            max_bytes,
            actual: Some(actual),
        },
        "response too large",
    )
}
