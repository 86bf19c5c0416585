//! Cpu over-commit stage

use super::ResourceAdapter;
use crate::models::ResourceAllocation;
use async_trait::async_trait;
use tracing::warn;

/// Scales the candidate cpu by a configured ratio.
///
/// The ratio expresses how much of the predicted headroom to actually
/// advertise and must stay in (0, 1]: the pipeline never grants more
/// than the caller requested.
pub struct OverCommitAdapter {
    ratio: f64,
}

impl OverCommitAdapter {
    pub fn new(ratio: f64) -> Self {
        let ratio = if !(0.0..=1.0).contains(&ratio) || ratio == 0.0 {
            warn!(ratio, "Over-commit ratio outside (0, 1], using 1.0");
            1.0
        } else {
            ratio
        };
        Self { ratio }
    }
}

#[async_trait]
impl ResourceAdapter for OverCommitAdapter {
    fn name(&self) -> &'static str {
        "overcommit"
    }

    async fn adapt(&self, allocation: &mut ResourceAllocation) -> bool {
        let scaled = (allocation.cpu_millis() as f64 * self.ratio) as u64;
        allocation.set_cpu_millis(scaled);
        false
    }
}
