//! Disk-derived cpu stage
//!
//! Shuffle-heavy offline work is disk bound, so advertising more cpu
//! than the local disks can feed just queues work. This stage caps cpu
//! at a per-disk grant and recalibrates the disk count in a background
//! loop rather than on the adapt path.

use super::ResourceAdapter;
use crate::models::ResourceAllocation;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::interval;
use tracing::{debug, info, warn};

/// Source of the local data-disk count
#[async_trait]
pub trait DiskProvider: Send + Sync {
    async fn disk_count(&self) -> anyhow::Result<usize>;
}

/// Caps cpu at `disks * millis_per_disk`
pub struct DiskCpuAdapter {
    disks: Arc<dyn DiskProvider>,
    millis_per_disk: u64,
    refresh_interval: Duration,
    cached_disks: AtomicU64,
}

impl DiskCpuAdapter {
    pub fn new(
        disks: Arc<dyn DiskProvider>,
        millis_per_disk: u64,
        refresh_interval: Duration,
    ) -> Self {
        Self {
            disks,
            millis_per_disk,
            refresh_interval,
            cached_disks: AtomicU64::new(0),
        }
    }

    async fn refresh(&self) {
        match self.disks.disk_count().await {
            Ok(count) => {
                let previous = self.cached_disks.swap(count as u64, Ordering::SeqCst);
                if previous != count as u64 {
                    info!(disks = count, "Local disk count changed");
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to refresh disk count, keeping cached value");
            }
        }
    }
}

#[async_trait]
impl ResourceAdapter for DiskCpuAdapter {
    fn name(&self) -> &'static str {
        "disk_cpu"
    }

    async fn adapt(&self, allocation: &mut ResourceAllocation) -> bool {
        // A zero grant or an unrefreshed disk count means no clamp.
        let limit = self.cached_disks.load(Ordering::SeqCst) * self.millis_per_disk;
        if limit > 0 && allocation.cpu_millis() > limit {
            debug!(
                cpu_millis = allocation.cpu_millis(),
                limit, "Capping cpu at disk-derived limit"
            );
            allocation.set_cpu_millis(limit);
        }
        false
    }

    async fn run(&self, mut shutdown: broadcast::Receiver<()>) {
        if self.millis_per_disk == 0 {
            return;
        }

        // The first tick fires immediately, seeding the cache.
        let mut ticker = interval(self.refresh_interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.refresh().await;
                }
                _ = shutdown.recv() => {
                    info!("Shutting down disk recalibration loop");
                    break;
                }
            }
        }
    }
}
