//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Environment variable that overrides the configured webhook URL.
pub const WEBHOOK_ENV: &str = "WEBHOOK_URL";

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Feed endpoint and polling behavior
    #[serde(default)]
    pub feed: FeedConfig,

    /// Corridor keywords matched against incident locations.
    /// An empty list matches nothing.
    #[serde(default = "defaults::keywords")]
    pub keywords: Vec<String>,

    /// Webhook delivery settings
    #[serde(default)]
    pub notify: NotifyConfig,

    /// Path of the seen-incident state file
    #[serde(default = "defaults::state_path")]
    pub state_path: PathBuf,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Apply environment overrides. `WEBHOOK_URL` wins over the file value.
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(WEBHOOK_ENV) {
            if !url.trim().is_empty() {
                self.notify.webhook_url = Some(url);
            }
        }
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.feed.url.trim().is_empty() {
            return Err(AppError::config("feed.url is empty"));
        }
        if self.feed.poll_interval_secs == 0 {
            return Err(AppError::config("feed.poll_interval_secs must be > 0"));
        }
        if self.feed.timeout_secs == 0 {
            return Err(AppError::config("feed.timeout_secs must be > 0"));
        }
        if self.feed.user_agent.trim().is_empty() {
            return Err(AppError::config("feed.user_agent is empty"));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            feed: FeedConfig::default(),
            keywords: defaults::keywords(),
            notify: NotifyConfig::default(),
            state_path: defaults::state_path(),
        }
    }
}

/// Feed endpoint and polling behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Active-calls feed endpoint
    #[serde(default = "defaults::feed_url")]
    pub url: String,

    /// Seconds between poll cycles
    #[serde(default = "defaults::poll_interval")]
    pub poll_interval_secs: u64,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// User-Agent header; the feed rejects obviously non-browser clients
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: defaults::feed_url(),
            poll_interval_secs: defaults::poll_interval(),
            timeout_secs: defaults::timeout(),
            user_agent: defaults::user_agent(),
        }
    }
}

/// Webhook delivery settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Webhook URL; absent means log-only mode
    #[serde(default)]
    pub webhook_url: Option<String>,
}

mod defaults {
    use std::path::PathBuf;

    pub fn feed_url() -> String {
        "https://www1.cityoforlando.net/opd/activecalls/activecadpolice.xml".into()
    }
    pub fn poll_interval() -> u64 {
        60
    }
    pub fn timeout() -> u64 {
        10
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
         AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36"
            .into()
    }
    pub fn keywords() -> Vec<String> {
        vec![
            "MILLS".into(),
            "ORANGE".into(),
            "ORLANDO AVE".into(),
            "17/92".into(),
            "US 17".into(),
            "LEE RD".into(),
            "VIRGINIA DR".into(),
            "HORATIO".into(),
        ]
    }
    pub fn state_path() -> PathBuf {
        PathBuf::from("seen_incidents.json")
    }
}
