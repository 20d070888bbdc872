// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `SnapshotStore` trait and the file-backed implementation.

use crate::snapshot::JobSnapshot;
use archon_core::JobId;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from snapshot persistence.
///
/// A failed save is fatal to the affected job's consistency guarantee: the
/// registry refuses to apply a transition it could not durably record.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("encode error: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Durable key/value store for job snapshots.
///
/// `save` must be atomic per job (a crash mid-save leaves either the old or
/// the new snapshot, never a torn one) and visible to a later `load_all`.
pub trait SnapshotStore: Send + Sync {
    fn save(&self, id: &JobId, snapshot: &JobSnapshot) -> Result<(), StoreError>;

    fn load_all(&self) -> Result<Vec<JobSnapshot>, StoreError>;

    /// Remove a snapshot. Hook for the external retention policy that evicts
    /// terminal jobs; the engine itself never deletes a live job.
    fn remove(&self, id: &JobId) -> Result<(), StoreError>;
}

/// One JSON document per job under a root directory.
///
/// Writes go through a temp file and rename so a crash never leaves a torn
/// snapshot behind.
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open (and create if needed) a snapshot directory.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn job_path(&self, id: &JobId) -> PathBuf {
        self.root.join(format!("{}.json", id))
    }
}

impl SnapshotStore for FileStore {
    fn save(&self, id: &JobId, snapshot: &JobSnapshot) -> Result<(), StoreError> {
        let path = self.job_path(id);
        let tmp = path.with_extension("json.tmp");

        let encoded = serde_json::to_vec_pretty(snapshot)?;
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(&encoded)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &path)?;

        tracing::debug!(job_id = %id, bytes = encoded.len(), "saved snapshot");
        Ok(())
    }

    fn load_all(&self) -> Result<Vec<JobSnapshot>, StoreError> {
        let mut snapshots = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match read_snapshot(&path) {
                Ok(snapshot) => snapshots.push(snapshot),
                // A single corrupt file should not block recovery of the rest
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping undecodable snapshot");
                }
            }
        }
        tracing::info!(count = snapshots.len(), root = %self.root.display(), "loaded snapshots");
        Ok(snapshots)
    }

    fn remove(&self, id: &JobId) -> Result<(), StoreError> {
        let path = self.job_path(id);
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }
}

fn read_snapshot(path: &Path) -> Result<JobSnapshot, StoreError> {
    let bytes = fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
