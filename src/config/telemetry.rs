use std::path::PathBuf;
use std::time::Duration;

use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;
use tracing::warn;

use crate::ControlState;
use crate::Error;
use crate::Result;

/// Sampling cadence and retention settings
///
/// These are the start-up values of the runtime control parameters; after
/// start they live in the `ControlSurface` and this struct is not consulted
/// again.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TelemetryConfig {
    /// Whether sampling starts enabled
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Delay after activation before the first sample (seconds)
    #[serde(default = "default_grace_period_in_sec")]
    pub grace_period_in_sec: u64,

    /// Time between consecutive samples (seconds)
    #[serde(default = "default_scrape_interval_in_sec")]
    pub scrape_interval_in_sec: u64,

    /// Maximum age of a retained snapshot (seconds)
    #[serde(default = "default_history_keep_interval_in_sec")]
    pub history_keep_interval_in_sec: u64,

    /// Shared directory the uploader reads snapshot files from
    #[serde(default = "default_telemetry_dir")]
    pub telemetry_dir: PathBuf,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            grace_period_in_sec: default_grace_period_in_sec(),
            scrape_interval_in_sec: default_scrape_interval_in_sec(),
            history_keep_interval_in_sec: default_history_keep_interval_in_sec(),
            telemetry_dir: default_telemetry_dir(),
        }
    }
}

impl TelemetryConfig {
    pub fn validate(&self) -> Result<()> {
        if self.scrape_interval_in_sec == 0 {
            return Err(Error::Config(ConfigError::Message(
                "scrape_interval_in_sec must be greater than 0".into(),
            )));
        }

        if self.telemetry_dir.as_os_str().is_empty() {
            return Err(Error::Config(ConfigError::Message(
                "telemetry_dir path cannot be empty".into(),
            )));
        }

        // Accepted: the store always keeps the newest file.
        if self.history_keep_interval_in_sec < self.scrape_interval_in_sec {
            warn!(
                keep = self.history_keep_interval_in_sec,
                scrape = self.scrape_interval_in_sec,
                "history keep interval is shorter than scrape interval, only the newest snapshot will be retained"
            );
        }

        Ok(())
    }

    /// Initial control state derived from this configuration
    pub fn control_state(&self) -> ControlState {
        ControlState {
            enabled: self.enabled,
            grace_period: Duration::from_secs(self.grace_period_in_sec),
            scrape_interval: Duration::from_secs(self.scrape_interval_in_sec),
            history_keep_interval: Duration::from_secs(self.history_keep_interval_in_sec),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_grace_period_in_sec() -> u64 {
    20
}

/// One sample per day
fn default_scrape_interval_in_sec() -> u64 {
    86_400
}

/// One week of history
fn default_history_keep_interval_in_sec() -> u64 {
    604_800
}

fn default_telemetry_dir() -> PathBuf {
    PathBuf::from("/usr/local/percona/telemetry/psmdb")
}
