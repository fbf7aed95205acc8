use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{TrackError, TrackResult};

pub const DEFAULT_BATCH_SIZE: usize = 50;
pub const MAX_BATCH_SIZE: usize = 1000;
pub const DEFAULT_TIMEOUT_MS: u64 = 1000;

pub const ENV_SERVER_URL: &str = "BEACON_SERVER_URL";
pub const ENV_BATCH_SIZE: &str = "BEACON_BATCH_SIZE";
pub const ENV_TIMEOUT_MS: &str = "BEACON_TIMEOUT_MS";

/// Per-instance settings of the tracking facade.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeaconConfig {
    /// Sent as the top-level `project` of every event unless the event
    /// carries its own `$project` property.
    pub project: Option<String>,
    /// Attach `$lib_detail` (caller file and line) to the `lib` block.
    pub lib_detail: bool,
    /// Default `$app_version` for the `lib` block.
    pub app_version: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub url: String,
    pub max_size: usize,
    pub request_timeout_ms: u64,
    /// Append one line per flush with the server's answer.
    pub response_log: Option<PathBuf>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_size: DEFAULT_BATCH_SIZE,
            request_timeout_ms: DEFAULT_TIMEOUT_MS,
            response_log: None,
        }
    }
}

impl BatchConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn from_env() -> TrackResult<Self> {
        let mut config = Self {
            url: read_env(ENV_SERVER_URL).unwrap_or_default(),
            ..Self::default()
        };
        if let Some(raw) = read_env(ENV_BATCH_SIZE) {
            config.max_size = parse_env(ENV_BATCH_SIZE, &raw)?;
        }
        if let Some(raw) = read_env(ENV_TIMEOUT_MS) {
            config.request_timeout_ms = parse_env(ENV_TIMEOUT_MS, &raw)?;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> TrackResult<()> {
        if self.url.is_empty() {
            return Err(TrackError::Config("batch url must not be empty".into()));
        }
        if self.max_size == 0 || self.max_size > MAX_BATCH_SIZE {
            return Err(TrackError::Config(format!(
                "batch max_size must be within 1..={MAX_BATCH_SIZE}, got {}",
                self.max_size
            )));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    pub url: String,
    /// `false` marks every request as a dry run: validated, never stored.
    pub write_data: bool,
    pub request_timeout_ms: u64,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            write_data: true,
            request_timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl DebugConfig {
    pub fn new(url: impl Into<String>, write_data: bool) -> Self {
        Self {
            url: url.into(),
            write_data,
            ..Self::default()
        }
    }

    pub fn from_env() -> TrackResult<Self> {
        let mut config = Self {
            url: read_env(ENV_SERVER_URL).unwrap_or_default(),
            ..Self::default()
        };
        if let Some(raw) = read_env(ENV_TIMEOUT_MS) {
            config.request_timeout_ms = parse_env(ENV_TIMEOUT_MS, &raw)?;
        }
        if config.url.is_empty() {
            return Err(TrackError::Config("debug url must not be empty".into()));
        }
        Ok(config)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileConfig {
    pub path: PathBuf,
}

fn read_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T: std::str::FromStr>(name: &str, raw: &str) -> TrackResult<T> {
    raw.trim()
        .parse()
        .map_err(|_| TrackError::Config(format!("{name} is not a valid number: '{raw}'")))
}
