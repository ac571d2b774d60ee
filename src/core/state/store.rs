//! File-backed checkpoint store
//!
//! Keeps the latest checkpoint of each scan at
//! `<dir>/<scan_id>.checkpoint.json`. Writes go to a temporary sibling first
//! and are renamed into place, so a reader never sees a torn file.

use super::checkpoint::Checkpoint;
use super::recorder::CheckpointSink;
use crate::domain::context::ResultExt;
use crate::domain::{CheckpointWriteError, EtlError, Result, ScanId};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

const CHECKPOINT_SUFFIX: &str = ".checkpoint.json";

/// Latest-checkpoint-per-scan store on the local filesystem
#[derive(Debug, Clone)]
pub struct FileCheckpointStore {
    dir: PathBuf,
}

impl FileCheckpointStore {
    /// Store rooted at `dir` (created on first write)
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Root directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the checkpoint file for a scan
    pub fn path_for(&self, scan_id: &ScanId) -> PathBuf {
        self.dir
            .join(format!("{}{}", scan_id.as_str(), CHECKPOINT_SUFFIX))
    }

    /// Latest checkpoint for a scan, if one was ever written
    ///
    /// # Errors
    ///
    /// Returns [`EtlError::State`] if the file exists but cannot be parsed.
    pub async fn load_latest(&self, scan_id: &ScanId) -> Result<Option<Checkpoint>> {
        let path = self.path_for(scan_id);
        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", path.display()))
            }
        };

        let checkpoint = serde_json::from_str(&contents).map_err(|e| {
            EtlError::State(format!("Corrupt checkpoint {}: {e}", path.display()))
        })?;
        Ok(Some(checkpoint))
    }

    /// Every stored checkpoint, newest first
    ///
    /// Unreadable files are skipped with a warning.
    pub async fn list(&self) -> Result<Vec<Checkpoint>> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to list {}", self.dir.display()))
            }
        };

        let mut checkpoints = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(scan) = name.to_str().and_then(|n| n.strip_suffix(CHECKPOINT_SUFFIX)) else {
                continue;
            };
            let Ok(scan_id) = ScanId::new(scan) else {
                continue;
            };

            match self.load_latest(&scan_id).await {
                Ok(Some(checkpoint)) => checkpoints.push(checkpoint),
                Ok(None) => {}
                Err(e) => tracing::warn!(scan_id = %scan_id, error = %e, "Skipping checkpoint"),
            }
        }

        checkpoints.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(checkpoints)
    }

    /// Remove the checkpoint of a scan; `false` if there was none
    pub async fn remove(&self, scan_id: &ScanId) -> Result<bool> {
        match tokio::fs::remove_file(self.path_for(scan_id)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl CheckpointSink for FileCheckpointStore {
    async fn save(&self, checkpoint: &Checkpoint) -> std::result::Result<(), CheckpointWriteError> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let path = self.path_for(&checkpoint.scan_id);
        let tmp = path.with_extension("json.tmp");
        let bytes = serde_json::to_vec_pretty(checkpoint)?;

        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }
}
