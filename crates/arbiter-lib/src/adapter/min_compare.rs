//! Floor comparison stage

use super::ResourceAdapter;
use crate::control::ControlPlane;
use crate::models::{ResourceAllocation, MEM_UNIT};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Clamps the allocation to the control plane's floor capacity when the
/// candidate has fallen to or below it on both resource kinds. Runs
/// first so later stages never see a sub-floor allocation.
pub struct MinCompareAdapter {
    control: Arc<dyn ControlPlane>,
}

impl MinCompareAdapter {
    pub fn new(control: Arc<dyn ControlPlane>) -> Self {
        Self { control }
    }
}

#[async_trait]
impl ResourceAdapter for MinCompareAdapter {
    fn name(&self) -> &'static str {
        "min_compare"
    }

    async fn adapt(&self, allocation: &mut ResourceAllocation) -> bool {
        let min = self.control.min_capacity().await;
        let min_cpu = min.millicores.max(0) as u64;
        let min_mem_bytes = min.memory_mb.max(0) as u64 * MEM_UNIT;

        if allocation.cpu_millis() <= min_cpu && allocation.memory_bytes() <= min_mem_bytes {
            debug!(
                cpu_millis = allocation.cpu_millis(),
                memory_bytes = allocation.memory_bytes(),
                "Candidate at or below floor, clamping to minimum capacity"
            );
            allocation.set_cpu_millis(min_cpu);
            allocation.set_memory_bytes(min_mem_bytes);
            return true;
        }
        false
    }
}
