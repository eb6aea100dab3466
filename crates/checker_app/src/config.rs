use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use checker_engine::{
    CheckSettings, ExportOptions, ExtractorRules, FetchSettings, DEFAULT_USER_AGENT,
};
use checker_logging::checker_info;
use serde::{Deserialize, Serialize};

/// Run configuration as read from a RON file. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub batch_size: usize,
    pub concurrency: usize,
    pub fetch_timeout_secs: u64,
    pub max_pages_per_batch: usize,
    pub connect_timeout_secs: u64,
    pub redirect_limit: usize,
    pub max_bytes: u64,
    pub user_agent: String,
    pub output_dir: PathBuf,
    pub csv_filename: String,
    pub write_manifest: bool,
    /// Appended to the built-in "page gone" phrases.
    pub extra_dead_phrases: Vec<String>,
    /// Appended to the built-in "account is private" phrases.
    pub extra_private_phrases: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let settings = CheckSettings::default();
        Self {
            batch_size: settings.batch_size,
            concurrency: settings.concurrency,
            fetch_timeout_secs: settings.fetch_timeout.as_secs(),
            max_pages_per_batch: settings.max_pages_per_batch,
            connect_timeout_secs: settings.fetch.connect_timeout.as_secs(),
            redirect_limit: settings.fetch.redirect_limit,
            max_bytes: settings.fetch.max_bytes,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            output_dir: PathBuf::from("output"),
            csv_filename: ExportOptions::default().csv_filename,
            write_manifest: true,
            extra_dead_phrases: Vec::new(),
            extra_private_phrases: Vec::new(),
        }
    }
}

/// Command-line values that take precedence over the file.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub batch_size: Option<usize>,
    pub concurrency: Option<usize>,
    pub timeout_secs: Option<u64>,
    pub output_dir: Option<PathBuf>,
    pub no_manifest: bool,
}

impl AppConfig {
    /// Defaults when `path` is `None`; a named file must exist and parse.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config = ron::from_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        checker_info!("Loaded config from {:?}", path);
        Ok(config)
    }

    pub fn apply(&mut self, overrides: &CliOverrides) {
        if let Some(batch_size) = overrides.batch_size {
            self.batch_size = batch_size;
        }
        if let Some(concurrency) = overrides.concurrency {
            self.concurrency = concurrency;
        }
        if let Some(timeout_secs) = overrides.timeout_secs {
            self.fetch_timeout_secs = timeout_secs;
        }
        if let Some(output_dir) = &overrides.output_dir {
            self.output_dir = output_dir.clone();
        }
        if overrides.no_manifest {
            self.write_manifest = false;
        }
    }

    /// Engine settings, validated.
    pub fn check_settings(&self) -> Result<CheckSettings> {
        let settings = CheckSettings {
            batch_size: self.batch_size,
            concurrency: self.concurrency,
            fetch_timeout: Duration::from_secs(self.fetch_timeout_secs),
            max_pages_per_batch: self.max_pages_per_batch,
            fetch: FetchSettings {
                connect_timeout: Duration::from_secs(self.connect_timeout_secs),
                redirect_limit: self.redirect_limit,
                max_bytes: self.max_bytes,
                user_agent: self.user_agent.clone(),
            },
        };
        settings.validate().context("invalid configuration")?;
        Ok(settings)
    }

    pub fn extractor_rules(&self) -> ExtractorRules {
        let mut rules = ExtractorRules::default();
        rules
            .dead_phrases
            .extend(self.extra_dead_phrases.iter().cloned());
        rules
            .private_phrases
            .extend(self.extra_private_phrases.iter().cloned());
        rules
    }

    pub fn export_options(&self) -> ExportOptions {
        ExportOptions {
            csv_filename: self.csv_filename.clone(),
            manifest_filename: self
                .write_manifest
                .then(|| ExportOptions::default().manifest_filename)
                .flatten(),
        }
    }
}
