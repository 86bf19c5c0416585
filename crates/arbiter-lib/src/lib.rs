//! Node-local capacity arbitration library
//!
//! This crate decides how much compute capacity the co-located batch
//! scheduler's node daemon may advertise for offline work:
//! - Adapter pipeline clamping candidate allocations
//! - Hysteresis-banded capacity decisions with a growth throttle
//! - Crash-recoverable schedule enable/disable state machine
//! - Liveness supervision of the enforcement process
//! - Prometheus metrics and health tracking

pub mod adapter;
pub mod alarm;
pub mod checkpoint;
pub mod control;
pub mod engine;
pub mod health;
pub mod hysteresis;
pub mod models;
pub mod observability;

pub use alarm::{AlarmSink, ChannelAlarm, LogAlarm};
pub use checkpoint::{CheckpointStore, FileCheckpoint};
pub use control::{ControlPlane, ControlPlaneError};
pub use engine::{CapacityEngine, Decision, EngineConfig};
pub use health::{ComponentHealth, ComponentStatus, HealthRegistry};
pub use models::*;
pub use observability::ArbiterMetrics;
