use std::path::Path;
use std::path::PathBuf;

use crate::constants::SNAPSHOT_FILE_EXTENSION;
use crate::constants::SNAPSHOT_TEMP_PREFIX;

/// Naming conventions of the telemetry directory.
///
/// Finalized files are `<captured_at_ms>-<instance_id>.json`; in-flight files
/// carry the temp prefix and are invisible to listing.
#[derive(Debug, Clone)]
pub(crate) struct SnapshotPathManager {
    pub(crate) base_dir: PathBuf,
}

/// Decoded name of a finalized snapshot file
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ParsedName {
    pub(crate) captured_at_ms: u64,
    pub(crate) instance_id: String,
}

impl SnapshotPathManager {
    pub(crate) fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub(crate) fn file_name(
        captured_at_ms: u64,
        instance_id: &str,
    ) -> String {
        format!("{captured_at_ms}-{instance_id}.{SNAPSHOT_FILE_EXTENSION}")
    }

    pub(crate) fn final_path(
        &self,
        captured_at_ms: u64,
        instance_id: &str,
    ) -> PathBuf {
        self.base_dir.join(Self::file_name(captured_at_ms, instance_id))
    }

    pub(crate) fn temp_path(
        &self,
        captured_at_ms: u64,
        instance_id: &str,
    ) -> PathBuf {
        self.base_dir.join(format!(
            "{SNAPSHOT_TEMP_PREFIX}{}",
            Self::file_name(captured_at_ms, instance_id)
        ))
    }

    /// `None` for temp files and anything not written by this store
    pub(crate) fn parse_file_name(path: &Path) -> Option<ParsedName> {
        let name = path.file_name()?.to_str()?;
        if name.starts_with(SNAPSHOT_TEMP_PREFIX) {
            return None;
        }
        let stem = name.strip_suffix(&format!(".{SNAPSHOT_FILE_EXTENSION}"))?;
        let (ts, instance_id) = stem.split_once('-')?;
        if instance_id.is_empty() || ts.is_empty() || !ts.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        Some(ParsedName {
            captured_at_ms: ts.parse().ok()?,
            instance_id: instance_id.to_string(),
        })
    }
}
