//! Retention store: one file per capture in a directory shared by every
//! instance on the host.
//!
//! Snapshot files are independent. A write goes to a hidden temp file that
//! is renamed into place once fully synced, so a crash mid-write can only
//! leave a temp file behind and never damages other captures.
//!
//! Pruning is age based and keyed on the capture time encoded in the file
//! name. The newest file of an instance is never pruned, which keeps at
//! least one snapshot present even when the keep interval is shorter than
//! the scrape interval.

mod path_manager;
pub(crate) use path_manager::*;


use std::fs;
use std::io::ErrorKind;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use tracing::debug;
use tracing::trace;
use tracing::warn;

use crate::constants::SNAPSHOT_NAME_ATTEMPTS;
use crate::Error;
use crate::Result;
use crate::Snapshot;
use crate::StorageError;

/// A retained snapshot file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotFile {
    pub path: PathBuf,
    pub instance_id: String,
    pub captured_at_ms: u64,
}

#[derive(Debug, Clone)]
pub struct RetentionStore {
    paths: SnapshotPathManager,
}

impl RetentionStore {
    /// The directory is created lazily on first write if it does not exist
    /// yet, so a missing or temporarily unwritable directory does not stop
    /// the collector from starting.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        if let Err(e) = fs::create_dir_all(&dir) {
            warn!(dir = %dir.display(), error = %e, "telemetry directory not available yet");
        }
        Self {
            paths: SnapshotPathManager::new(dir),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.paths.base_dir
    }

    /// Persists one snapshot as a new file and returns its path.
    ///
    /// If a file for the same instance and millisecond already exists, the
    /// timestamp in the name is bumped until a free name is found; an
    /// existing capture is never overwritten.
    pub fn write(
        &self,
        snapshot: &Snapshot,
    ) -> Result<PathBuf> {
        let dir = self.dir();
        fs::create_dir_all(dir).map_err(|e| StorageError::at(dir, e))?;

        let body = snapshot.to_json_pretty()?;
        let instance_id = snapshot.instance_id.as_str();

        for attempt in 0..SNAPSHOT_NAME_ATTEMPTS {
            let ts = snapshot.captured_at_ms.saturating_add(attempt);
            let final_path = self.paths.final_path(ts, instance_id);
            if final_path.exists() {
                trace!(path = %final_path.display(), "snapshot name taken");
                continue;
            }

            let temp_path = self.paths.temp_path(ts, instance_id);
            if let Err(e) = write_synced(&temp_path, &body) {
                fs::remove_file(&temp_path).ok();
                return Err(StorageError::at(temp_path, e).into());
            }
            if let Err(e) = fs::rename(&temp_path, &final_path) {
                fs::remove_file(&temp_path).ok();
                return Err(StorageError::at(final_path, e).into());
            }

            debug!(path = %final_path.display(), "snapshot written");
            return Ok(final_path);
        }

        Err(StorageError::NameExhausted { dir: dir.to_path_buf() }.into())
    }

    /// Retained files of one instance, oldest first
    pub fn list(
        &self,
        instance_id: &str,
    ) -> Result<Vec<SnapshotFile>> {
        let mut files = self.list_all()?;
        files.retain(|f| f.instance_id == instance_id);
        Ok(files)
    }

    /// Retained files of every instance sharing the directory, oldest first
    pub fn list_all(&self) -> Result<Vec<SnapshotFile>> {
        let dir = self.dir();
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => return Err(StorageError::at(dir, e).into()),
        };

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StorageError::at(dir, e))?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            if let Some(parsed) = SnapshotPathManager::parse_file_name(&path) {
                files.push(SnapshotFile {
                    path,
                    instance_id: parsed.instance_id,
                    captured_at_ms: parsed.captured_at_ms,
                });
            }
        }
        files.sort_by(|a, b| {
            a.captured_at_ms
                .cmp(&b.captured_at_ms)
                .then_with(|| a.instance_id.cmp(&b.instance_id))
        });
        Ok(files)
    }

    /// Deletes files of `instance_id` captured before `now_ms - keep`.
    ///
    /// The newest file of the instance always survives. Returns how many
    /// files were deleted; pruning an already pruned set deletes nothing.
    pub fn prune(
        &self,
        instance_id: &str,
        now_ms: u64,
        keep: Duration,
    ) -> Result<usize> {
        let mut files = self.list(instance_id)?;
        // newest survives
        if files.pop().is_none() {
            return Ok(0);
        }

        let keep_ms = u64::try_from(keep.as_millis()).unwrap_or(u64::MAX);
        let cutoff = now_ms.saturating_sub(keep_ms);
        let expired: Vec<_> = files.into_iter().filter(|f| f.captured_at_ms < cutoff).collect();

        let deleted = self.remove_files(&expired)?;
        if deleted > 0 {
            debug!(instance_id, deleted, cutoff, "pruned expired snapshots");
        }
        Ok(deleted)
    }

    /// Deletes every retained file of `instance_id`
    pub fn purge(
        &self,
        instance_id: &str,
    ) -> Result<usize> {
        let files = self.list(instance_id)?;
        let deleted = self.remove_files(&files)?;
        debug!(instance_id, deleted, "purged instance snapshots");
        Ok(deleted)
    }

    /// Attempts every removal; reports the first failure after the pass
    fn remove_files(
        &self,
        files: &[SnapshotFile],
    ) -> Result<usize> {
        let mut deleted = 0;
        let mut first_error: Option<Error> = None;

        for file in files {
            match fs::remove_file(&file.path) {
                Ok(()) => deleted += 1,
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    warn!(path = %file.path.display(), error = %e, "failed to delete snapshot");
                    if first_error.is_none() {
                        first_error = Some(StorageError::at(&file.path, e).into());
                    }
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(deleted),
        }
    }
}

fn write_synced(
    path: &Path,
    body: &[u8],
) -> std::io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(body)?;
    file.sync_all()
}
