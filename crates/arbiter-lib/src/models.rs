//! Core data models for the capacity arbiter

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Megabyte, used when converting memory bytes to the daemon's MB unit
pub const MEM_UNIT: u64 = 1024 * 1024;

/// Millicores per vcore
pub const CPU_UNIT: i64 = 1000;

/// Resource kinds the arbiter adapts
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Cpu,
    Memory,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceKind::Cpu => write!(f, "cpu"),
            ResourceKind::Memory => write!(f, "memory"),
        }
    }
}

/// A candidate resource allocation for the offline workload.
///
/// Cpu is tracked in millicores and memory in bytes. The adapter
/// pipeline mutates the allocation in place; every stage leaves the
/// quantities non-negative and in these units.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceAllocation {
    quantities: BTreeMap<ResourceKind, u64>,
}

impl ResourceAllocation {
    pub fn new(cpu_millis: u64, memory_bytes: u64) -> Self {
        let mut quantities = BTreeMap::new();
        quantities.insert(ResourceKind::Cpu, cpu_millis);
        quantities.insert(ResourceKind::Memory, memory_bytes);
        Self { quantities }
    }

    pub fn get(&self, kind: ResourceKind) -> u64 {
        self.quantities.get(&kind).copied().unwrap_or(0)
    }

    pub fn set(&mut self, kind: ResourceKind, quantity: u64) {
        self.quantities.insert(kind, quantity);
    }

    pub fn cpu_millis(&self) -> u64 {
        self.get(ResourceKind::Cpu)
    }

    pub fn memory_bytes(&self) -> u64 {
        self.get(ResourceKind::Memory)
    }

    pub fn set_cpu_millis(&mut self, millis: u64) {
        self.set(ResourceKind::Cpu, millis);
    }

    pub fn set_memory_bytes(&mut self, bytes: u64) {
        self.set(ResourceKind::Memory, bytes);
    }

    /// Memory in whole megabytes, rounded down
    pub fn memory_mb(&self) -> u64 {
        self.memory_bytes() / MEM_UNIT
    }
}

/// Capacity currently enforced by the batch scheduler's node daemon.
///
/// Authoritative ground truth: only the control plane sets it, the
/// arbiter reads it for comparison.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NmCapacity {
    pub vcores: i64,
    pub millicores: i64,
    pub memory_mb: i64,
}

impl NmCapacity {
    pub fn from_allocation(allocation: &ResourceAllocation) -> Self {
        let millicores = allocation.cpu_millis() as i64;
        Self {
            vcores: millicores / CPU_UNIT,
            millicores,
            memory_mb: allocation.memory_mb() as i64,
        }
    }
}

/// The floor capacity the daemon must never be driven below
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinCapacity {
    pub vcores: i64,
    pub millicores: i64,
    pub memory_mb: i64,
}

impl MinCapacity {
    /// Structural comparison against an enforced capacity: at the floor
    /// only when all three fields match.
    pub fn matches(&self, capacity: &NmCapacity) -> bool {
        self.vcores == capacity.vcores
            && self.millicores == capacity.millicores
            && self.memory_mb == capacity.memory_mb
    }
}

/// Hysteresis band policy for one resource kind
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RangeBand {
    /// Band width as a ratio of current capacity
    pub ratio: f64,
    /// Absolute lower bound on the band width; 0 means no lower bound
    pub min: f64,
    /// Absolute upper bound on the band width
    pub max: f64,
}

/// Hysteresis policy for both adapted resource kinds
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RangeResource {
    pub cpu_milli: RangeBand,
    pub mem_mb: RangeBand,
}

/// Durable record of the schedule-enable state, replayed at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleCheckpoint {
    pub schedule_disabled: bool,
    pub updated_at: i64,
}

impl ScheduleCheckpoint {
    pub fn new(schedule_disabled: bool) -> Self {
        Self {
            schedule_disabled,
            updated_at: chrono::Utc::now().timestamp(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_from_allocation() {
        let alloc = ResourceAllocation::new(4500, 8192 * MEM_UNIT);
        let cap = NmCapacity::from_allocation(&alloc);
        assert_eq!(cap.vcores, 4);
        assert_eq!(cap.millicores, 4500);
        assert_eq!(cap.memory_mb, 8192);
    }

    #[test]
    fn test_min_capacity_requires_all_fields_equal() {
        let min = MinCapacity {
            vcores: 1,
            millicores: 1000,
            memory_mb: 1024,
        };
        let at_floor = NmCapacity {
            vcores: 1,
            millicores: 1000,
            memory_mb: 1024,
        };
        let partial = NmCapacity {
            vcores: 1,
            millicores: 1000,
            memory_mb: 2048,
        };
        assert!(min.matches(&at_floor));
        assert!(!min.matches(&partial));
    }

    #[test]
    fn test_allocation_missing_kind_reads_zero() {
        let alloc = ResourceAllocation::default();
        assert_eq!(alloc.cpu_millis(), 0);
        assert_eq!(alloc.memory_bytes(), 0);
    }
}
