//! Simulator configuration.
//!
//! Values resolve in layers: command-line flags, then environment (handled by
//! the CLI), then an optional JSON file, then the defaults below.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use wb_channel::ClientProfile;

pub const DEFAULT_MAX_COMPLETIONS: u32 = 2000;
pub const DEFAULT_HEARTBEAT_PERIOD: Duration = Duration::from_secs(10);
pub const DEFAULT_WARMUP_DELAY: Duration = Duration::from_secs(1);
pub const DEFAULT_MIN_REQUEST_DELAY: Duration = Duration::from_millis(500);
pub const DEFAULT_MAX_REQUEST_DELAY: Duration = Duration::from_millis(2500);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("max_completions must be at least 1")]
    ZeroQuota,

    #[error("heartbeat period must be greater than zero")]
    ZeroHeartbeatPeriod,

    #[error("request delay range is inverted: min {min_ms} ms > max {max_ms} ms")]
    InvertedDelayRange { min_ms: u128, max_ms: u128 },
}

/// Per-session behavior shared by every simulated client in a run.
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    /// Completions after which a session closes.
    pub max_completions: u32,
    /// Interval between `ClientHeartbeat` frames.
    pub heartbeat_period: Duration,
    /// Pause between channel-group subscription and the first request.
    pub warmup_delay: Duration,
    /// Lower bound of the uniform delay between completions.
    pub min_request_delay: Duration,
    /// Upper bound of the uniform delay between completions.
    pub max_request_delay: Duration,
    pub profile: ClientProfile,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            max_completions: DEFAULT_MAX_COMPLETIONS,
            heartbeat_period: DEFAULT_HEARTBEAT_PERIOD,
            warmup_delay: DEFAULT_WARMUP_DELAY,
            min_request_delay: DEFAULT_MIN_REQUEST_DELAY,
            max_request_delay: DEFAULT_MAX_REQUEST_DELAY,
            profile: ClientProfile::default(),
        }
    }
}

impl SimulatorConfig {
    pub fn with_max_completions(mut self, max_completions: u32) -> Self {
        self.max_completions = max_completions;
        self
    }

    pub fn with_heartbeat_period(mut self, period: Duration) -> Self {
        self.heartbeat_period = period;
        self
    }

    pub fn with_warmup_delay(mut self, delay: Duration) -> Self {
        self.warmup_delay = delay;
        self
    }

    pub fn with_request_delay(mut self, min: Duration, max: Duration) -> Self {
        self.min_request_delay = min;
        self.max_request_delay = max;
        self
    }

    pub fn with_profile(mut self, profile: ClientProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Overlay the values a config file sets.
    pub fn apply_file(mut self, file: &FileConfig) -> Self {
        if let Some(max_completions) = file.max_completions {
            self.max_completions = max_completions;
        }
        if let Some(ms) = file.heartbeat_period_ms {
            self.heartbeat_period = Duration::from_millis(ms);
        }
        if let Some(ms) = file.warmup_delay_ms {
            self.warmup_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = file.min_request_delay_ms {
            self.min_request_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = file.max_request_delay_ms {
            self.max_request_delay = Duration::from_millis(ms);
        }

        let mut profile = self.profile;
        if let Some(platform) = non_blank(&file.platform) {
            profile = profile.with_platform(platform);
        }
        if let Some(version) = non_blank(&file.client_version) {
            profile = profile.with_client_version(version);
        }
        if let Some(version) = non_blank(&file.plugin_version) {
            profile = profile.with_plugin_version(version);
        }
        if let Some(language) = non_blank(&file.language) {
            profile = profile.with_language(language);
        }
        if let Some(filename) = non_blank(&file.filename) {
            profile = profile.with_filename(filename);
        }
        self.profile = profile;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_completions == 0 {
            return Err(ConfigError::ZeroQuota);
        }
        if self.heartbeat_period.is_zero() {
            return Err(ConfigError::ZeroHeartbeatPeriod);
        }
        if self.min_request_delay > self.max_request_delay {
            return Err(ConfigError::InvertedDelayRange {
                min_ms: self.min_request_delay.as_millis(),
                max_ms: self.max_request_delay.as_millis(),
            });
        }
        Ok(())
    }
}

/// JSON config file shape. Durations are milliseconds; unknown fields are rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub endpoint: Option<String>,
    pub max_completions: Option<u32>,
    pub heartbeat_period_ms: Option<u64>,
    pub warmup_delay_ms: Option<u64>,
    pub min_request_delay_ms: Option<u64>,
    pub max_request_delay_ms: Option<u64>,
    pub platform: Option<String>,
    pub client_version: Option<String>,
    pub plugin_version: Option<String>,
    pub language: Option<String>,
    pub filename: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Configured endpoint, if set to something other than whitespace.
    pub fn endpoint(&self) -> Option<&str> {
        non_blank(&self.endpoint)
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}
