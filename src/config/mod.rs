//! Configuration management module for the telemetry collector.
//!
//! Provides hierarchical configuration loading and validation with:
//! - Default values as code base
//! - Configuration file support (`CONFIG_PATH`)
//! - Environment variable overrides (`TELEMETRY__` prefix)
//! - Component-wise validation
mod cluster;
mod server;
mod telemetry;
pub use cluster::*;
pub use server::*;
pub use telemetry::*;

use std::env;
use std::fmt::Debug;
use std::path::Path;

use config::Config;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::ProcessKind;
use crate::Result;

pub(crate) const ENV_PREFIX: &str = "TELEMETRY";

/// Main configuration container for the collector
///
/// Combines all subsystem configurations with hierarchical override support:
/// 1. Default values from code implementation
/// 2. Configuration file specified by `CONFIG_PATH`
/// 3. Environment variables (highest priority)
#[derive(Serialize, Deserialize, Clone, Default)]
pub struct TelemetryNodeConfig {
    /// Host server identity and build metadata
    #[serde(default)]
    pub server: ServerConfig,
    /// Role this node plays in a cluster deployment
    #[serde(default)]
    pub cluster: ClusterConfig,
    /// Sampling cadence, retention and output directory
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}
impl Debug for TelemetryNodeConfig {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("TelemetryNodeConfig")
            .field("server", &self.server)
            .field("telemetry", &self.telemetry)
            .finish()
    }
}
impl TelemetryNodeConfig {
    /// Loads configuration from hierarchical sources without validation.
    ///
    /// Configuration sources are merged in the following order (later sources override earlier):
    /// 1. Type defaults (lowest priority)
    /// 2. Configuration file from `CONFIG_PATH` environment variable (if set)
    /// 3. Environment variables with `TELEMETRY__` prefix (highest priority)
    ///
    /// # Note
    /// Validation is deferred so that further overrides can be applied via
    /// `with_override_config()`. Callers MUST call `validate()` before use.
    ///
    /// # Examples
    /// ```ignore
    /// std::env::set_var("TELEMETRY__TELEMETRY__SCRAPE_INTERVAL_IN_SEC", "5");
    /// let cfg = TelemetryNodeConfig::new()?.validate()?;
    /// ```
    pub fn new() -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Ok(config_path) = env::var("CONFIG_PATH") {
            builder = builder.add_source(File::with_name(&config_path).required(true));
        }

        builder = builder.add_source(env_source());

        let config: Self = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Applies additional configuration overrides from file without validation.
    ///
    /// Merging order (later sources override earlier):
    /// 1. Current configuration values
    /// 2. New configuration file
    /// 3. Latest environment variables (highest priority)
    pub fn with_override_config(
        &self,
        path: &str,
    ) -> Result<Self> {
        let config: Self = Config::builder()
            .add_source(Config::try_from(self)?)
            .add_source(File::with_name(path))
            .add_source(env_source())
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    /// Validates configuration and returns validated instance.
    ///
    /// # Errors
    /// - Empty paths
    /// - Zero scrape interval
    /// - Replica set or shard roles declared on a router process
    /// - Replica set member without a replication id
    pub fn validate(self) -> Result<Self> {
        self.server.validate()?;
        self.cluster.validate()?;
        self.telemetry.validate()?;

        if self.server.process_kind == ProcessKind::Mongos && self.cluster.declares_storage_role() {
            return Err(Error::Config(ConfigError::Message(
                "a mongos process cannot declare replica set or shard roles".into(),
            )));
        }
        Ok(self)
    }
}

fn env_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .ignore_empty(true)
        .try_parsing(true)
}

/// Ensures directory path is valid and writable
pub(super) fn validate_directory(
    path: &Path,
    name: &str,
) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Err(Error::Config(ConfigError::Message(format!(
            "{name} path cannot be empty"
        ))));
    }

    #[cfg(not(test))]
    {
        use std::fs;
        if !path.exists() {
            fs::create_dir_all(path).map_err(|e| {
                Error::Config(ConfigError::Message(format!(
                    "Failed to create {} directory at {}: {}",
                    name,
                    path.display(),
                    e
                )))
            })?;
        }

        let test_file = path.join(".permission_test");
        fs::write(&test_file, b"test").map_err(|e| {
            Error::Config(ConfigError::Message(format!(
                "No write permission in {} directory {}: {}",
                name,
                path.display(),
                e
            )))
        })?;
        fs::remove_file(&test_file).ok();
    }

    Ok(())
}
