//! Scrappit configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::domain::PriorityWeights;
use crate::scheduler::SchedulerConfig;

/// Main Scrappit configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,

    /// HTTP client configuration
    pub client: ClientConfig,

    /// Worker scheduling
    pub scheduler: SchedulerConfig,

    /// Default priority weights
    pub priorities: PriorityWeights,
}

impl Config {
    /// Validate configuration before use
    pub fn validate(&self) -> Result<()> {
        if self.client.user_agents.is_empty() {
            return Err(eyre::eyre!("client.user-agents must contain at least one User-Agent"));
        }
        if let Some(index) = self.client.user_agents.iter().position(|ua| ua.trim().is_empty()) {
            return Err(eyre::eyre!("client.user-agents[{}] is blank", index));
        }
        let idle = self.scheduler.idle_sleep_ms;
        if !idle.is_finite() || idle <= 0.0 {
            return Err(eyre::eyre!("scheduler.idle-sleep-ms must be a positive number, got {}", idle));
        }
        if self.client.max_attempts == 0 {
            return Err(eyre::eyre!("client.max-attempts must be at least 1"));
        }
        let url = reqwest::Url::parse(&self.client.base_url)
            .context(format!("Invalid client.base-url: {}", self.client.base_url))?;
        if url.host_str().is_none() {
            return Err(eyre::eyre!("client.base-url has no host: {}", self.client.base_url));
        }
        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .scrappit.yml
        let local_config = PathBuf::from(".scrappit.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/scrappit/scrappit.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("scrappit").join("scrappit.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is set up
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        Self::load(config_path).ok().and_then(|config| config.log_level)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// HTTP client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// API base URL; endpoints are appended with a `.json` suffix
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// Attempts per fetch before giving up
    #[serde(rename = "max-attempts")]
    pub max_attempts: u32,

    /// User-Agent pool rotated when throttled
    #[serde(rename = "user-agents")]
    pub user_agents: Vec<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.reddit.com".to_string(),
            timeout_secs: 10,
            max_attempts: 3,
            user_agents: default_user_agents(),
        }
    }
}

impl ClientConfig {
    /// Get the per-request timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_user_agents() -> Vec<String> {
    [
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
        "Mozilla/5.0 (X11; Linux x86_64; rv:125.0) Gecko/20100101 Firefox/125.0",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
        "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}
