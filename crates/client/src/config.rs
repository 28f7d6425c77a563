//! Client configuration, read from the environment.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Silent refresh cadence: 14 minutes, inside a 15 minute access-token lifetime.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_millis(840_000);

pub const DEFAULT_API_URL: &str = "http://localhost:8080";

const ENV_API_URL: &str = "ADMINPANEL_API_URL";
const ENV_REFRESH_INTERVAL_MS: &str = "ADMINPANEL_REFRESH_INTERVAL_MS";
const ENV_DATA_DIR: &str = "ADMINPANEL_DATA_DIR";

const FLAG_FILE: &str = "session.json";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} has invalid value '{value}': {reason}")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// REST API base URL (no trailing slash needed).
    pub api_url: String,
    pub refresh_interval: Duration,
    /// Where the session marker is persisted.
    pub data_dir: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            data_dir: default_data_dir(),
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `ADMINPANEL_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
            config.api_url = url.trim().to_string();
        }

        if let Some(raw) = lookup(ENV_REFRESH_INTERVAL_MS) {
            config.refresh_interval = parse_interval(&raw)?;
        }

        if let Some(dir) = lookup(ENV_DATA_DIR).filter(|v| !v.trim().is_empty()) {
            config.data_dir = PathBuf::from(dir);
        }

        Ok(config)
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    /// Path of the persisted session marker.
    pub fn flag_file(&self) -> PathBuf {
        self.data_dir.join(FLAG_FILE)
    }

    /// Base URL stored avatars are served from (`<base>/files/<name>`).
    pub fn files_base_url(&self) -> &str {
        self.api_url.trim_end_matches('/')
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("adminpanel")
}

fn parse_interval(raw: &str) -> Result<Duration, ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidValue {
        var: ENV_REFRESH_INTERVAL_MS,
        value: raw.to_string(),
        reason: reason.to_string(),
    };

    let millis: u64 = raw
        .trim()
        .parse()
        .map_err(|_| invalid("expected milliseconds as an integer"))?;
    if millis == 0 {
        return Err(invalid("must be greater than zero"));
    }
    Ok(Duration::from_millis(millis))
}
