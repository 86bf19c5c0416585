//! Local data-disk discovery for the disk cpu adapter

use arbiter_lib::adapter::DiskProvider;
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::debug;

/// Counts the configured data-disk mount paths that are present
pub struct MountedDisks {
    paths: Vec<PathBuf>,
}

impl MountedDisks {
    pub fn new(paths: Vec<String>) -> Self {
        Self {
            paths: paths.into_iter().map(PathBuf::from).collect(),
        }
    }
}

#[async_trait]
impl DiskProvider for MountedDisks {
    async fn disk_count(&self) -> anyhow::Result<usize> {
        let mut count = 0;
        for path in &self.paths {
            match tokio::fs::metadata(path).await {
                Ok(meta) if meta.is_dir() => count += 1,
                Ok(_) => debug!(path = %path.display(), "Disk path is not a directory"),
                Err(e) => debug!(path = %path.display(), error = %e, "Disk path not present"),
            }
        }
        Ok(count)
    }
}
