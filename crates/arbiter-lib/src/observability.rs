//! Prometheus metrics for the capacity arbiter
//!
//! Metrics register once into the default registry; `ArbiterMetrics`
//! is a cheap cloneable handle to that global instance.

use crate::models::{NmCapacity, ResourceAllocation};
use prometheus::{register_gauge_vec, register_int_counter, register_int_gauge, GaugeVec, IntCounter, IntGauge};
use std::sync::OnceLock;

static GLOBAL_METRICS: OnceLock<ArbiterMetricsInner> = OnceLock::new();

struct ArbiterMetricsInner {
    schedule_disabled: IntGauge,
    offline_resource: GaugeVec,
    enforced_capacity: GaugeVec,
    capacity_increases: IntCounter,
    capacity_decreases: IntCounter,
    throttled_increases: IntCounter,
    process_restarts: IntCounter,
}

impl ArbiterMetricsInner {
    fn new() -> Self {
        Self {
            schedule_disabled: register_int_gauge!(
                "capacity_arbiter_schedule_disabled",
                "Whether offline scheduling is currently disabled (1) or enabled (0)"
            )
            .expect("Failed to register schedule_disabled"),

            offline_resource: register_gauge_vec!(
                "capacity_arbiter_offline_resource",
                "Latest adapted offline allocation, cpu in millicores and memory in MB",
                &["resource"]
            )
            .expect("Failed to register offline_resource"),

            enforced_capacity: register_gauge_vec!(
                "capacity_arbiter_enforced_capacity",
                "Capacity currently enforced by the node daemon",
                &["resource"]
            )
            .expect("Failed to register enforced_capacity"),

            capacity_increases: register_int_counter!(
                "capacity_arbiter_capacity_increases_total",
                "Number of applied capacity increases"
            )
            .expect("Failed to register capacity_increases"),

            capacity_decreases: register_int_counter!(
                "capacity_arbiter_capacity_decreases_total",
                "Number of applied capacity decreases"
            )
            .expect("Failed to register capacity_decreases"),

            throttled_increases: register_int_counter!(
                "capacity_arbiter_throttled_increases_total",
                "Capacity increases skipped by the growth throttle"
            )
            .expect("Failed to register throttled_increases"),

            process_restarts: register_int_counter!(
                "capacity_arbiter_process_restarts_total",
                "Enforcement process restarts issued by the liveness supervisor"
            )
            .expect("Failed to register process_restarts"),
        }
    }
}

/// Handle to the arbiter's Prometheus metrics
#[derive(Clone)]
pub struct ArbiterMetrics {
    _private: (),
}

impl Default for ArbiterMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ArbiterMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(ArbiterMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &ArbiterMetricsInner {
        GLOBAL_METRICS.get().expect("Metrics not initialized")
    }

    /// Record the schedule-disabled state as a 0/1 gauge
    pub fn set_schedule_disabled(&self, disabled: bool) {
        self.inner().schedule_disabled.set(disabled as i64);
    }

    /// Reset and report the latest adapted offline allocation
    pub fn reset_offline_allocation(&self, allocation: &ResourceAllocation) {
        let gauges = &self.inner().offline_resource;
        gauges.reset();
        gauges
            .with_label_values(&["cpu"])
            .set(allocation.cpu_millis() as f64);
        gauges
            .with_label_values(&["memory"])
            .set(allocation.memory_mb() as f64);
    }

    /// Report the capacity the daemon currently enforces
    pub fn set_enforced_capacity(&self, capacity: &NmCapacity) {
        let gauges = &self.inner().enforced_capacity;
        gauges
            .with_label_values(&["vcores"])
            .set(capacity.vcores as f64);
        gauges
            .with_label_values(&["millicores"])
            .set(capacity.millicores as f64);
        gauges
            .with_label_values(&["memory_mb"])
            .set(capacity.memory_mb as f64);
    }

    pub fn inc_capacity_increases(&self) {
        self.inner().capacity_increases.inc();
    }

    pub fn inc_capacity_decreases(&self) {
        self.inner().capacity_decreases.inc();
    }

    pub fn inc_throttled_increases(&self) {
        self.inner().throttled_increases.inc();
    }

    pub fn inc_process_restarts(&self) {
        self.inner().process_restarts.inc();
    }
}
