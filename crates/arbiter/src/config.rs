//! Arbiter configuration

use anyhow::Result;
use arbiter_lib::adapter::AdapterConfig;
use arbiter_lib::models::{RangeBand, RangeResource};
use arbiter_lib::EngineConfig;
use serde::Deserialize;
use std::time::Duration;

/// Node arbiter configuration, loaded from `ARBITER_`-prefixed
/// environment variables with defaults for local runs
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ArbiterConfig {
    /// Base URL of the enforcement daemon's admin endpoint
    pub control_base_url: String,

    /// Path of the schedule-state checkpoint file
    pub checkpoint_path: String,

    /// Port for the health/metrics API
    pub api_port: u16,

    /// Minimum seconds between applied capacity increases
    pub capacity_inc_interval_secs: u64,

    /// Seconds to wait before re-checking a freshly started process
    pub process_grace_secs: u64,

    /// Poll interval while waiting for the daemon at startup
    pub ready_poll_interval_secs: u64,

    /// How often to sample the enforced capacity for metrics
    pub capacity_poll_interval_secs: u64,

    /// Hysteresis band: cpu ratio / min / max (millicores)
    pub range_cpu_ratio: f64,
    pub range_cpu_min: f64,
    pub range_cpu_max: f64,

    /// Hysteresis band: memory ratio / min / max (MB)
    pub range_mem_ratio: f64,
    pub range_mem_min: f64,
    pub range_mem_max: f64,

    /// Fraction of candidate cpu to advertise, in (0, 1]
    pub overcommit_ratio: f64,

    /// Cpu withheld for the daemon itself, millicores
    pub reserve_cpu_millis: u64,

    /// Memory withheld for the daemon itself, MB
    pub reserve_memory_mb: u64,

    /// Cpu rounding step in millicores; 0 disables rounding
    pub round_cpu_step_millis: u64,

    /// Memory rounding step in MB; 0 disables rounding
    pub round_mem_step_mb: u64,

    /// Cpu granted per local data disk, millicores; 0 disables
    pub millis_per_disk: u64,

    /// Seconds between local disk recounts
    pub disk_refresh_secs: u64,

    /// Comma-separated local data-disk mount paths
    pub disk_paths: String,
}

impl Default for ArbiterConfig {
    fn default() -> Self {
        Self {
            control_base_url: "http://127.0.0.1:10670".to_string(),
            checkpoint_path: "/var/lib/capacity-arbiter/schedule.json".to_string(),
            api_port: 8080,
            capacity_inc_interval_secs: 600,
            process_grace_secs: 10,
            ready_poll_interval_secs: 2,
            capacity_poll_interval_secs: 30,
            range_cpu_ratio: 0.0,
            range_cpu_min: 0.0,
            range_cpu_max: 0.0,
            range_mem_ratio: 0.0,
            range_mem_min: 0.0,
            range_mem_max: 0.0,
            overcommit_ratio: 1.0,
            reserve_cpu_millis: 0,
            reserve_memory_mb: 0,
            round_cpu_step_millis: 0,
            round_mem_step_mb: 0,
            millis_per_disk: 0,
            disk_refresh_secs: 60,
            disk_paths: String::new(),
        }
    }
}

impl ArbiterConfig {
    /// Load configuration from the environment
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("ARBITER"))
            .build()?;

        Ok(config.try_deserialize().unwrap_or_default())
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            resource_range: RangeResource {
                cpu_milli: RangeBand {
                    ratio: self.range_cpu_ratio,
                    min: self.range_cpu_min,
                    max: self.range_cpu_max,
                },
                mem_mb: RangeBand {
                    ratio: self.range_mem_ratio,
                    min: self.range_mem_min,
                    max: self.range_mem_max,
                },
            },
            capacity_inc_interval: Duration::from_secs(self.capacity_inc_interval_secs),
            process_grace: Duration::from_secs(self.process_grace_secs),
            ready_poll_interval: Duration::from_secs(self.ready_poll_interval_secs),
            capacity_poll_interval: Duration::from_secs(self.capacity_poll_interval_secs),
        }
    }

    pub fn adapter_config(&self) -> AdapterConfig {
        AdapterConfig {
            overcommit_ratio: self.overcommit_ratio,
            reserve_cpu_millis: self.reserve_cpu_millis,
            reserve_memory_bytes: self.reserve_memory_mb * arbiter_lib::models::MEM_UNIT,
            round_cpu_step_millis: self.round_cpu_step_millis,
            round_mem_step_mb: self.round_mem_step_mb,
            millis_per_disk: self.millis_per_disk,
            disk_refresh_interval: Duration::from_secs(self.disk_refresh_secs),
        }
    }

    pub fn disk_paths(&self) -> Vec<String> {
        self.disk_paths
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect()
    }
}
