//! Telemetry Collector Error Hierarchy
//!
//! Errors are grouped by concern. None of them is ever allowed to escape the
//! scheduler loop: the collector is best-effort and reports failures through
//! logs only. They surface to callers of the builder, the control surface and
//! the retention store so that embedding code and tests can inspect them.

use std::path::PathBuf;

use config::ConfigError;
use tokio::task::JoinError;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration loading or validation failures
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Snapshot directory and identity record I/O failures
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Instance identity record failures
    #[error(transparent)]
    Identity(#[from] IdentityError),

    /// Rejected runtime parameter mutation
    #[error("Invalid telemetry parameter: {0}")]
    InvalidParameter(String),

    /// Collector task panicked or was cancelled
    #[error("Background task failed: {0}")]
    TaskFailed(#[from] JoinError),

    #[error("{0}")]
    SignalSenderClosed(String),
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Disk I/O failures during snapshot write/prune
    #[error(transparent)]
    IoError(#[from] std::io::Error),

    /// I/O failure with the offending path attached
    #[error("Error occurred at path: {path}")]
    PathError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Snapshot document could not be rendered
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    /// Every candidate file name for a capture was already taken
    #[error("No free snapshot file name left in {dir}")]
    NameExhausted { dir: PathBuf },
}

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// Identity record exists but could not be parsed
    #[error("Identity record at {path} is corrupt: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    /// Identity record could not be persisted
    #[error("Failed to persist identity record at {path}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StorageError {
    pub(crate) fn at(
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        StorageError::PathError {
            path: path.into(),
            source,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Storage(StorageError::IoError(e))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Storage(StorageError::Serialization(e))
    }
}
