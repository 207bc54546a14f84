use std::path::PathBuf;

use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use super::validate_directory;
use crate::BuildInfo;
use crate::Error;
use crate::ProcessKind;
use crate::Result;

/// Host server settings the collector reads but never changes
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    /// Database files directory; the identity record lives here
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,

    /// Storage node (`mongod`) or router (`mongos`)
    #[serde(default)]
    pub process_kind: ProcessKind,

    #[serde(default = "default_storage_engine")]
    pub storage_engine: String,

    #[serde(default = "default_pillar_version")]
    pub pillar_version: String,

    /// Enabled enhanced-build features; non-empty marks a pro build
    #[serde(default)]
    pub pro_features: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            log_dir: default_log_dir(),
            process_kind: ProcessKind::default(),
            storage_engine: default_storage_engine(),
            pillar_version: default_pillar_version(),
            pro_features: vec![],
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.db_path.as_os_str().is_empty() {
            return Err(Error::Config(ConfigError::Message(
                "db_path cannot be empty".into(),
            )));
        }
        if self.storage_engine.trim().is_empty() {
            return Err(Error::Config(ConfigError::Message(
                "storage_engine cannot be empty".into(),
            )));
        }
        if self.pillar_version.trim().is_empty() {
            return Err(Error::Config(ConfigError::Message(
                "pillar_version cannot be empty".into(),
            )));
        }
        if self.pro_features.iter().any(|f| f.trim().is_empty()) {
            return Err(Error::Config(ConfigError::Message(
                "pro_features cannot contain empty names".into(),
            )));
        }

        validate_directory(&self.log_dir, "log_dir")?;
        Ok(())
    }

    /// Build metadata stamped on every snapshot
    pub fn build_info(&self) -> BuildInfo {
        BuildInfo {
            process_kind: self.process_kind,
            storage_engine: self.storage_engine.clone(),
            pillar_version: self.pillar_version.clone(),
            pro_features: self.pro_features.clone(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("/data/db")
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("./logs")
}

fn default_storage_engine() -> String {
    "wiredTiger".to_string()
}

fn default_pillar_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
