//! Schedule-state checkpoint
//!
//! The only state that must survive a crash is whether offline
//! scheduling was deliberately disabled. The file store writes
//! atomically (temp file, fsync, rename) so a crash mid-write never
//! leaves a torn checkpoint.

use crate::models::ScheduleCheckpoint;
use anyhow::{Context, Result};
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::PathBuf;
use tracing::debug;

/// Durable store for the schedule-enable state
pub trait CheckpointStore: Send + Sync {
    /// Persist the current schedule-disabled flag
    fn store(&self, disabled: bool) -> Result<()>;

    /// Read back the last persisted flag; `None` when no checkpoint
    /// has ever been written
    fn recover(&self) -> Result<Option<bool>>;
}

/// File-backed checkpoint store
pub struct FileCheckpoint {
    path: PathBuf,
}

impl FileCheckpoint {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CheckpointStore for FileCheckpoint {
    fn store(&self, disabled: bool) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
        }

        let record = ScheduleCheckpoint::new(disabled);
        let json = serde_json::to_vec(&record).context("Failed to serialize checkpoint")?;

        let temp_path = self.path.with_extension("tmp");
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)
            .with_context(|| format!("Failed to create temp file {:?}", temp_path))?;
        file.write_all(&json).context("Failed to write checkpoint")?;
        file.sync_all().context("Failed to sync checkpoint file")?;

        std::fs::rename(&temp_path, &self.path)
            .with_context(|| format!("Failed to rename {:?} to {:?}", temp_path, self.path))?;

        debug!(path = %self.path.display(), disabled, "Checkpoint stored");
        Ok(())
    }

    fn recover(&self) -> Result<Option<bool>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let mut file = File::open(&self.path)
            .with_context(|| format!("Failed to open checkpoint {:?}", self.path))?;
        let mut data = Vec::new();
        file.read_to_end(&mut data)
            .context("Failed to read checkpoint file")?;

        let record: ScheduleCheckpoint =
            serde_json::from_slice(&data).context("Failed to deserialize checkpoint")?;
        Ok(Some(record.schedule_disabled))
    }
}
