use std::fs;
use std::io;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use dashboard_core::Feed;
use dashboard_engine::{write_atomically, ClientSettings};
use engine_logging::engine_info;
use serde::{Deserialize, Serialize};
use url::Url;

use super::logging::LogDestination;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    pub token: Option<String>,
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
    pub poll: PollIntervals,
    /// Batch items in flight at once. 1 keeps sends strictly ordered.
    pub dispatch_concurrency: usize,
    pub log_destination: LogDestination,
    pub log_file: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: None,
            connect_timeout_ms: 10_000,
            request_timeout_ms: 30_000,
            poll: PollIntervals::default(),
            dispatch_concurrency: 1,
            log_destination: LogDestination::File,
            log_file: PathBuf::from("dashboard.log"),
        }
    }
}

/// Poll cadence per feed, in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollIntervals {
    pub running_tasks_ms: u64,
    pub applications_ms: u64,
    pub logs_ms: u64,
    pub running_count_ms: u64,
    pub contacts_ms: u64,
    pub scraped_contacts_ms: u64,
    pub resumes_ms: u64,
}

impl Default for PollIntervals {
    fn default() -> Self {
        Self {
            running_tasks_ms: 5_000,
            applications_ms: 5_000,
            logs_ms: 5_000,
            running_count_ms: 5_000,
            contacts_ms: 10_000,
            scraped_contacts_ms: 10_000,
            resumes_ms: 5_000,
        }
    }
}

impl PollIntervals {
    pub fn for_feed(&self, feed: Feed) -> Duration {
        let ms = match feed {
            Feed::RunningTasks => self.running_tasks_ms,
            Feed::Applications => self.applications_ms,
            Feed::Logs => self.logs_ms,
            Feed::RunningCount => self.running_count_ms,
            Feed::Contacts => self.contacts_ms,
            Feed::ScrapedContacts => self.scraped_contacts_ms,
            Feed::Resumes => self.resumes_ms,
        };
        // A zero interval would spin.
        Duration::from_millis(ms.max(100))
    }
}

impl AppConfig {
    /// Reads the config at `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                engine_info!("no config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(err) => {
                return Err(err).with_context(|| format!("reading {}", path.display()));
            }
        };
        ron::from_str(&text).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let text = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .context("serializing config")?;
        write_atomically(path, &text).with_context(|| format!("writing {}", path.display()))
    }

    pub fn client_settings(&self) -> Result<ClientSettings> {
        let base_url = Url::parse(&self.base_url)
            .with_context(|| format!("invalid base url {:?}", self.base_url))?;
        let mut settings = ClientSettings::new(base_url);
        settings.connect_timeout = Duration::from_millis(self.connect_timeout_ms);
        settings.request_timeout = Duration::from_millis(self.request_timeout_ms);
        Ok(settings)
    }

    pub fn concurrency(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.dispatch_concurrency).unwrap_or(NonZeroUsize::MIN)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
