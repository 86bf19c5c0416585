//! Resource adapter pipeline
//!
//! A candidate offline allocation passes through a fixed sequence of
//! adapters before the decision engine ever sees it. The order is a
//! construction-time invariant: each stage assumes the clamping done by
//! the stages before it. The pipeline short-circuits once any stage
//! reports that the allocation reached the floor capacity, since later
//! stages could push the value back above or inconsistently around it.

mod disk_cpu;
mod min_compare;
mod overcommit;
mod reserve;
mod round_off;

pub use disk_cpu::{DiskCpuAdapter, DiskProvider};
pub use min_compare::MinCompareAdapter;
pub use overcommit::OverCommitAdapter;
pub use reserve::ReserveAdapter;
pub use round_off::RoundOffAdapter;

use crate::control::ControlPlane;
use crate::models::ResourceAllocation;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::warn;

/// One stage of the allocation clamp pipeline
#[async_trait]
pub trait ResourceAdapter: Send + Sync {
    fn name(&self) -> &'static str;

    /// Mutate the allocation in place. Returns true when the allocation
    /// has been clamped to the floor capacity.
    async fn adapt(&self, allocation: &mut ResourceAllocation) -> bool;

    /// Background recalibration loop; most adapters have none.
    async fn run(&self, shutdown: broadcast::Receiver<()>) {
        let _ = shutdown;
    }
}

/// Settings for the standard adapter pipeline
#[derive(Debug, Clone)]
pub struct AdapterConfig {
    /// Fraction of the candidate cpu to advertise, in (0, 1]
    pub overcommit_ratio: f64,
    /// Cpu withheld for the enforcement daemon itself, millicores
    pub reserve_cpu_millis: u64,
    /// Memory withheld for the enforcement daemon itself, bytes
    pub reserve_memory_bytes: u64,
    /// Cpu rounding step in millicores; 0 disables rounding
    pub round_cpu_step_millis: u64,
    /// Memory rounding step in MB; 0 disables rounding
    pub round_mem_step_mb: u64,
    /// Cpu granted per local disk, millicores; 0 disables the clamp
    pub millis_per_disk: u64,
    /// How often to recount local disks
    pub disk_refresh_interval: Duration,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            overcommit_ratio: 1.0,
            reserve_cpu_millis: 0,
            reserve_memory_bytes: 0,
            round_cpu_step_millis: 0,
            round_mem_step_mb: 0,
            millis_per_disk: 0,
            disk_refresh_interval: Duration::from_secs(60),
        }
    }
}

/// Build the five standard adapters in their required order:
/// minimum-comparison, over-commit, reservation, rounding, disk cpu.
pub fn standard_pipeline(
    config: &AdapterConfig,
    control: Arc<dyn ControlPlane>,
    disks: Arc<dyn DiskProvider>,
) -> Vec<Arc<dyn ResourceAdapter>> {
    vec![
        Arc::new(MinCompareAdapter::new(control)),
        Arc::new(OverCommitAdapter::new(config.overcommit_ratio)),
        Arc::new(ReserveAdapter::new(
            config.reserve_cpu_millis,
            config.reserve_memory_bytes,
        )),
        Arc::new(RoundOffAdapter::new(
            config.round_cpu_step_millis,
            config.round_mem_step_mb,
        )),
        Arc::new(DiskCpuAdapter::new(
            disks,
            config.millis_per_disk,
            config.disk_refresh_interval,
        )),
    ]
}

/// Run the adapters in order, stopping after the first stage that
/// clamps to the floor. Returns whether the floor was hit.
pub async fn run_pipeline(
    adapters: &[Arc<dyn ResourceAdapter>],
    allocation: &mut ResourceAllocation,
) -> bool {
    for adapter in adapters {
        if adapter.adapt(allocation).await {
            warn!(
                adapter = adapter.name(),
                cpu_millis = allocation.cpu_millis(),
                memory_mb = allocation.memory_mb(),
                "Allocation clamped to minimum capacity"
            );
            return true;
        }
    }
    false
}
