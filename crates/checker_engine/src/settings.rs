use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str = concat!(
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 ",
    "(KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchSettings {
    pub connect_timeout: Duration,
    pub redirect_limit: usize,
    pub max_bytes: u64,
    pub user_agent: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            redirect_limit: 5,
            max_bytes: 5 * 1024 * 1024,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Tunables for one classification run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckSettings {
    /// URLs per batch.
    pub batch_size: usize,
    /// Batches processed at the same time.
    pub concurrency: usize,
    /// Hard upper bound on one URL's fetch.
    pub fetch_timeout: Duration,
    /// URLs fetched at the same time inside one batch.
    pub max_pages_per_batch: usize,
    pub fetch: FetchSettings,
}

impl Default for CheckSettings {
    fn default() -> Self {
        Self {
            batch_size: 10,
            concurrency: 5,
            fetch_timeout: Duration::from_secs(30),
            max_pages_per_batch: 5,
            fetch: FetchSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },
}

impl CheckSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        let checks = [
            ("batch_size", self.batch_size == 0),
            ("concurrency", self.concurrency == 0),
            ("fetch_timeout", self.fetch_timeout.is_zero()),
            ("max_pages_per_batch", self.max_pages_per_batch == 0),
            ("max_bytes", self.fetch.max_bytes == 0),
        ];
        match checks.into_iter().find(|(_, is_zero)| *is_zero) {
            Some((field, _)) => Err(SettingsError::Zero { field }),
            None => Ok(()),
        }
    }
}
