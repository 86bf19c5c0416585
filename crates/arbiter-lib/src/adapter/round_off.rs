//! Rounding stage

use super::ResourceAdapter;
use crate::models::{ResourceAllocation, MEM_UNIT};
use async_trait::async_trait;

/// Rounds the already-reserved quantities down to configured steps so
/// the daemon advertises stable, coarse values. A step of 0 disables
/// rounding for that resource kind.
pub struct RoundOffAdapter {
    cpu_step_millis: u64,
    mem_step_mb: u64,
}

impl RoundOffAdapter {
    pub fn new(cpu_step_millis: u64, mem_step_mb: u64) -> Self {
        Self {
            cpu_step_millis,
            mem_step_mb,
        }
    }
}

#[async_trait]
impl ResourceAdapter for RoundOffAdapter {
    fn name(&self) -> &'static str {
        "round_off"
    }

    async fn adapt(&self, allocation: &mut ResourceAllocation) -> bool {
        if self.cpu_step_millis > 0 {
            let cpu = allocation.cpu_millis();
            allocation.set_cpu_millis(cpu - cpu % self.cpu_step_millis);
        }
        if self.mem_step_mb > 0 {
            let mb = allocation.memory_mb();
            allocation.set_memory_bytes((mb - mb % self.mem_step_mb) * MEM_UNIT);
        }
        false
    }
}
