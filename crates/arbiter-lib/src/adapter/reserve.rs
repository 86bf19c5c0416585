//! Daemon reservation stage

use super::ResourceAdapter;
use crate::models::ResourceAllocation;
use async_trait::async_trait;

/// Withholds the enforcement daemon's own resource needs from the
/// candidate so the advertised capacity never starves the daemon
/// itself. Subtraction saturates at zero.
pub struct ReserveAdapter {
    cpu_millis: u64,
    memory_bytes: u64,
}

impl ReserveAdapter {
    pub fn new(cpu_millis: u64, memory_bytes: u64) -> Self {
        Self {
            cpu_millis,
            memory_bytes,
        }
    }
}

#[async_trait]
impl ResourceAdapter for ReserveAdapter {
    fn name(&self) -> &'static str {
        "reserve"
    }

    async fn adapt(&self, allocation: &mut ResourceAllocation) -> bool {
        allocation.set_cpu_millis(allocation.cpu_millis().saturating_sub(self.cpu_millis));
        allocation.set_memory_bytes(allocation.memory_bytes().saturating_sub(self.memory_bytes));
        false
    }
}
