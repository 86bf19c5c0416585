//! Capacity adaptation engine
//!
//! One engine instance owns the adapter pipeline, the growth throttle,
//! and the schedule-enable state for a single node. A cycle is driven
//! externally through [`CapacityEngine::adapt_and_apply`]: the caller
//! hands over a predicted offline allocation plus the currently
//! conflicting resource kinds, the engine clamps the allocation,
//! decides whether the daemon's capacity should move, applies the
//! change through the control plane, and finally verifies the
//! enforcement process survived the apply.

use crate::adapter::{self, ResourceAdapter};
use crate::alarm::AlarmSink;
use crate::checkpoint::CheckpointStore;
use crate::control::ControlPlane;
use crate::health::{components, ComponentHealth, HealthRegistry};
use crate::hysteresis;
use crate::models::{NmCapacity, RangeResource, ResourceAllocation};
use crate::observability::ArbiterMetrics;
use anyhow::Result;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, RwLock};
use tokio::time::{interval, sleep};
use tracing::{debug, error, info, warn};

/// Engine tuning knobs
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Hysteresis policy around the enforced capacity
    pub resource_range: RangeResource,
    /// Minimum real-time interval between applied capacity increases
    pub capacity_inc_interval: Duration,
    /// Grace period before re-checking a freshly started process
    pub process_grace: Duration,
    /// Poll interval while waiting for the control plane at startup
    pub ready_poll_interval: Duration,
    /// How often the background loop samples the enforced capacity
    pub capacity_poll_interval: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            resource_range: RangeResource::default(),
            capacity_inc_interval: Duration::from_secs(10 * 60),
            process_grace: Duration::from_secs(10),
            ready_poll_interval: Duration::from_secs(2),
            capacity_poll_interval: Duration::from_secs(30),
        }
    }
}

/// Outcome of one decision step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    /// Whether the daemon's capacity should move at all
    pub changed: bool,
    /// Whether the move grows capacity on both resource kinds
    pub increase: bool,
}

/// Node-local capacity arbitration engine
pub struct CapacityEngine {
    config: EngineConfig,
    control: Arc<dyn ControlPlane>,
    checkpoint: Arc<dyn CheckpointStore>,
    alarm: Arc<dyn AlarmSink>,
    metrics: ArbiterMetrics,
    health: HealthRegistry,
    adapters: Vec<Arc<dyn ResourceAdapter>>,
    schedule_disabled: RwLock<bool>,
    last_capacity_increase: Mutex<Option<Instant>>,
}

impl CapacityEngine {
    pub fn new(
        config: EngineConfig,
        control: Arc<dyn ControlPlane>,
        checkpoint: Arc<dyn CheckpointStore>,
        alarm: Arc<dyn AlarmSink>,
        adapters: Vec<Arc<dyn ResourceAdapter>>,
        health: HealthRegistry,
    ) -> Self {
        Self {
            config,
            control,
            checkpoint,
            alarm,
            metrics: ArbiterMetrics::new(),
            health,
            adapters,
            schedule_disabled: RwLock::new(false),
            last_capacity_increase: Mutex::new(None),
        }
    }

    /// Run one full adaptation cycle: clamp, decide, apply, verify.
    ///
    /// A failed apply is logged and returned, but the liveness check
    /// still runs: no error in a cycle is fatal, the next cycle retries.
    pub async fn adapt_and_apply(
        &self,
        mut allocation: ResourceAllocation,
        conflicting_resources: &[String],
    ) -> Result<()> {
        let decision = self
            .decide(&mut allocation, !conflicting_resources.is_empty())
            .await;
        self.metrics.reset_offline_allocation(&allocation);

        let apply_result = if decision.changed {
            self.apply(&allocation, decision.increase, conflicting_resources)
                .await
        } else {
            debug!("No capacity change needed this cycle");
            Ok(())
        };
        if let Err(ref e) = apply_result {
            error!(error = %e, "Capacity update failed");
        }

        self.ensure_process_running().await;

        apply_result
    }

    /// Classify the candidate allocation against the enforced capacity.
    /// The allocation is mutated in place by the adapter pipeline.
    pub async fn decide(&self, allocation: &mut ResourceAllocation, conflicting: bool) -> Decision {
        let reached_min = adapter::run_pipeline(&self.adapters, allocation).await;

        // Conflict correction takes priority over hysteresis and floor
        // bookkeeping, and is applied as a non-increase.
        if conflicting {
            return Decision {
                changed: true,
                increase: false,
            };
        }

        let capacity = match self.control.capacity().await {
            Ok(capacity) => {
                self.health.register(components::CONTROL_PLANE).await;
                capacity
            }
            Err(e) => {
                // Fail open: force a re-apply to get back to a known
                // capacity rather than drifting on a stale read.
                warn!(error = %e, "Failed to read enforced capacity, forcing a capacity re-apply");
                self.health
                    .update(
                        components::CONTROL_PLANE,
                        ComponentHealth::degraded(e.to_string()),
                    )
                    .await;
                return Decision {
                    changed: true,
                    increase: true,
                };
            }
        };

        if reached_min {
            let min = self.control.min_capacity().await;
            if min.matches(&capacity) {
                debug!("Capacity already at the floor, nothing to update");
                return Decision {
                    changed: false,
                    increase: false,
                };
            }
            info!(?capacity, "Driving capacity down to the floor");
            return Decision {
                changed: true,
                increase: false,
            };
        }

        let cpu = allocation.cpu_millis() as i64;
        let mem_mb = allocation.memory_mb() as i64;
        let (range_cpu, range_mem) =
            hysteresis::range_resource(&self.config.resource_range, &capacity);
        if (cpu - capacity.millicores).abs() as f64 <= range_cpu
            && (mem_mb - capacity.memory_mb).abs() as f64 <= range_mem
        {
            debug!(
                cpu_millis = cpu,
                memory_mb = mem_mb,
                "Candidate within hysteresis band, keeping current capacity"
            );
            return Decision {
                changed: false,
                increase: false,
            };
        }

        // A one-sided increase tightens the other resource kind, so it
        // is applied without the growth throttle.
        let increase = cpu > capacity.millicores && mem_mb > capacity.memory_mb;
        Decision {
            changed: true,
            increase,
        }
    }

    async fn apply(
        &self,
        allocation: &ResourceAllocation,
        increase: bool,
        conflicting_resources: &[String],
    ) -> Result<()> {
        let target = NmCapacity::from_allocation(allocation);
        if increase {
            if self.growth_throttled() {
                info!(?target, "Skipping capacity increase, last growth too recent");
                self.metrics.inc_throttled_increases();
                return Ok(());
            }
            info!(?target, "Increasing daemon capacity");
            self.control
                .ensure_capacity(&target, conflicting_resources, false)
                .await?;
            *self.last_capacity_increase.lock().unwrap() = Some(Instant::now());
            self.metrics.inc_capacity_increases();
        } else {
            info!(?target, "Decreasing daemon capacity");
            self.control
                .ensure_capacity(&target, conflicting_resources, true)
                .await?;
            self.metrics.inc_capacity_decreases();
        }
        Ok(())
    }

    fn growth_throttled(&self) -> bool {
        match *self.last_capacity_increase.lock().unwrap() {
            Some(last) => last.elapsed() < self.config.capacity_inc_interval,
            None => false,
        }
    }

    /// Whether offline scheduling is currently disabled
    pub async fn is_schedule_disabled(&self) -> bool {
        *self.schedule_disabled.read().await
    }

    /// Stop the daemon from scheduling new offline work.
    ///
    /// Transition order: alarm, control-plane command, in-memory flag,
    /// metric, checkpoint. A command failure aborts before the flag
    /// flips so recorded state never runs ahead of reality.
    pub async fn disable_scheduling(&self) -> Result<()> {
        let mut disabled = self.schedule_disabled.write().await;
        if *disabled {
            debug!("Scheduling is already disabled");
            return Ok(());
        }

        self.alarm.send("offline scheduling is closing");
        info!("Disabling offline scheduling");
        if let Err(e) = self.control.disable_scheduling().await {
            error!(error = %e, "Disable scheduling command failed");
            return Err(e.into());
        }
        *disabled = true;
        self.metrics.set_schedule_disabled(true);
        self.store_checkpoint(true);
        Ok(())
    }

    /// Let the daemon schedule offline work again
    pub async fn enable_scheduling(&self) -> Result<()> {
        let mut disabled = self.schedule_disabled.write().await;
        if !*disabled {
            return Ok(());
        }

        self.alarm.send("offline scheduling is opening");
        info!("Enabling offline scheduling");
        if let Err(e) = self.control.enable_scheduling().await {
            error!(error = %e, "Enable scheduling command failed");
            return Err(e.into());
        }
        *disabled = false;
        self.metrics.set_schedule_disabled(false);
        self.store_checkpoint(false);
        Ok(())
    }

    fn store_checkpoint(&self, disabled: bool) {
        // The control plane already agreed to the transition; a failed
        // write only loses crash recovery, so it must not unwind it.
        if let Err(e) = self.checkpoint.store(disabled) {
            error!(error = %e, "Failed to persist schedule checkpoint");
        }
    }

    /// Replay the persisted schedule state after a restart.
    ///
    /// A checkpoint holding `disabled` re-runs the full disable
    /// transition so the control plane is re-asserted and listeners are
    /// re-notified; a crash must not silently resume scheduling that
    /// was deliberately turned off.
    pub async fn recover(&self) -> Result<()> {
        self.metrics.set_schedule_disabled(false);
        match self.checkpoint.recover() {
            Ok(Some(true)) => {
                info!("Checkpoint shows scheduling disabled, re-asserting after restart");
                self.disable_scheduling().await?;
            }
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "Failed to read schedule checkpoint, assuming enabled");
            }
        }
        Ok(())
    }

    /// Block until the control plane answers a status query. Used at
    /// startup before the first adaptation cycle; retries forever.
    pub async fn wait_process_ready(&self) {
        loop {
            match self.control.status().await {
                Ok(_) => {
                    info!("Enforcement daemon control plane is ready");
                    self.health.register(components::ENFORCEMENT_PROCESS).await;
                    return;
                }
                Err(_) => {
                    debug!("Enforcement daemon not ready, polling again");
                    sleep(self.config.ready_poll_interval).await;
                }
            }
        }
    }

    /// Verify the enforcement process is alive, restarting it once if
    /// not. A process that stays down after an apparently successful
    /// start is escalated through the alarm sink, not retried.
    pub async fn ensure_process_running(&self) {
        let running = match self.control.status().await {
            Ok(running) => running,
            Err(e) => {
                error!(error = %e, "Enforcement process status check failed");
                return;
            }
        };
        if running {
            self.health.register(components::ENFORCEMENT_PROCESS).await;
            return;
        }

        info!("Enforcement process not running, restarting");
        if let Err(e) = self.control.start_process().await {
            error!(error = %e, "Enforcement process start failed");
            self.health
                .update(
                    components::ENFORCEMENT_PROCESS,
                    ComponentHealth::unhealthy(e.to_string()),
                )
                .await;
            return;
        }
        self.metrics.inc_process_restarts();

        info!(
            grace_secs = self.config.process_grace.as_secs(),
            "Start issued, re-checking after grace interval"
        );
        sleep(self.config.process_grace).await;
        match self.control.status().await {
            Ok(true) => {
                info!("Enforcement process recovered");
                self.health.register(components::ENFORCEMENT_PROCESS).await;
            }
            Ok(false) => {
                let msg = format!(
                    "enforcement process started but still not running after {:?}",
                    self.config.process_grace
                );
                error!(message = %msg, "Enforcement process did not come back");
                self.alarm.send(&msg);
                self.health
                    .update(
                        components::ENFORCEMENT_PROCESS,
                        ComponentHealth::unhealthy(msg),
                    )
                    .await;
            }
            Err(e) => {
                error!(error = %e, "Enforcement process status check failed after restart");
            }
        }
    }

    /// Start the adapters' recalibration loops and the enforced-capacity
    /// metrics loop. Every loop exits when the shutdown channel fires.
    pub fn start(&self, shutdown: &broadcast::Sender<()>) {
        for adapter in &self.adapters {
            let adapter = adapter.clone();
            let rx = shutdown.subscribe();
            tokio::spawn(async move {
                adapter.run(rx).await;
            });
        }

        let control = self.control.clone();
        let metrics = self.metrics.clone();
        let poll_interval = self.config.capacity_poll_interval;
        let mut rx = shutdown.subscribe();
        tokio::spawn(async move {
            let mut ticker = interval(poll_interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Ok(capacity) = control.capacity().await {
                            metrics.set_enforced_capacity(&capacity);
                        }
                    }
                    _ = rx.recv() => {
                        info!("Shutting down capacity metrics loop");
                        break;
                    }
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::testing::MockControlPlane;
    use crate::control::ControlPlaneError;
    use crate::models::{MinCapacity, RangeBand, MEM_UNIT};
    use async_trait::async_trait;
    use std::sync::atomic::Ordering;

    struct MemoryCheckpoint {
        state: Mutex<Option<bool>>,
        stores: Mutex<Vec<bool>>,
    }

    impl MemoryCheckpoint {
        fn new(state: Option<bool>) -> Self {
            Self {
                state: Mutex::new(state),
                stores: Mutex::new(Vec::new()),
            }
        }

        fn store_count(&self) -> usize {
            self.stores.lock().unwrap().len()
        }

        fn last_stored(&self) -> Option<bool> {
            self.stores.lock().unwrap().last().copied()
        }
    }

    impl CheckpointStore for MemoryCheckpoint {
        fn store(&self, disabled: bool) -> Result<()> {
            *self.state.lock().unwrap() = Some(disabled);
            self.stores.lock().unwrap().push(disabled);
            Ok(())
        }

        fn recover(&self) -> Result<Option<bool>> {
            Ok(*self.state.lock().unwrap())
        }
    }

    #[derive(Default)]
    struct CountingAlarm {
        messages: Mutex<Vec<String>>,
    }

    impl CountingAlarm {
        fn count(&self) -> usize {
            self.messages.lock().unwrap().len()
        }
    }

    impl AlarmSink for CountingAlarm {
        fn send(&self, message: &str) {
            self.messages.lock().unwrap().push(message.to_string());
        }
    }

    /// Clamps straight to the floor, standing in for the full pipeline
    struct FloorAdapter {
        min: MinCapacity,
    }

    #[async_trait]
    impl ResourceAdapter for FloorAdapter {
        fn name(&self) -> &'static str {
            "floor"
        }

        async fn adapt(&self, allocation: &mut ResourceAllocation) -> bool {
            allocation.set_cpu_millis(self.min.millicores as u64);
            allocation.set_memory_bytes(self.min.memory_mb as u64 * MEM_UNIT);
            true
        }
    }

    fn current_capacity() -> NmCapacity {
        NmCapacity {
            vcores: 4,
            millicores: 4000,
            memory_mb: 8192,
        }
    }

    fn floor_capacity() -> MinCapacity {
        MinCapacity {
            vcores: 1,
            millicores: 1000,
            memory_mb: 1024,
        }
    }

    fn test_config() -> EngineConfig {
        EngineConfig {
            resource_range: RangeResource {
                cpu_milli: RangeBand {
                    ratio: 0.1,
                    min: 0.0,
                    max: 100_000.0,
                },
                mem_mb: RangeBand {
                    ratio: 0.1,
                    min: 0.0,
                    max: 100_000.0,
                },
            },
            capacity_inc_interval: Duration::from_secs(3600),
            process_grace: Duration::ZERO,
            ready_poll_interval: Duration::from_millis(5),
            capacity_poll_interval: Duration::from_secs(60),
        }
    }

    struct Fixture {
        engine: CapacityEngine,
        control: Arc<MockControlPlane>,
        checkpoint: Arc<MemoryCheckpoint>,
        alarm: Arc<CountingAlarm>,
    }

    fn fixture_with(
        control: MockControlPlane,
        checkpoint: MemoryCheckpoint,
        adapters: Vec<Arc<dyn ResourceAdapter>>,
    ) -> Fixture {
        let control = Arc::new(control);
        let checkpoint = Arc::new(checkpoint);
        let alarm = Arc::new(CountingAlarm::default());
        let engine = CapacityEngine::new(
            test_config(),
            control.clone(),
            checkpoint.clone(),
            alarm.clone(),
            adapters,
            HealthRegistry::new(),
        );
        Fixture {
            engine,
            control,
            checkpoint,
            alarm,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(
            MockControlPlane::with_capacity(current_capacity(), floor_capacity()),
            MemoryCheckpoint::new(None),
            Vec::new(),
        )
    }

    fn allocation(cpu_millis: u64, memory_mb: u64) -> ResourceAllocation {
        ResourceAllocation::new(cpu_millis, memory_mb * MEM_UNIT)
    }

    #[tokio::test]
    async fn conflict_overrides_hysteresis() {
        let f = fixture();
        // Well inside the band; only the conflict forces a change.
        let mut candidate = allocation(4300, 8500);
        let decision = f.engine.decide(&mut candidate, true).await;
        assert_eq!(
            decision,
            Decision {
                changed: true,
                increase: false
            }
        );
    }

    #[tokio::test]
    async fn within_band_is_no_change() {
        let f = fixture();
        // Band is 400 millicores / 819 MB around 4000/8192.
        let mut candidate = allocation(4300, 8500);
        let decision = f.engine.decide(&mut candidate, false).await;
        assert!(!decision.changed);
    }

    #[tokio::test]
    async fn either_delta_out_of_band_changes() {
        let f = fixture();
        // Memory delta (308 MB) stays in band, cpu delta (1000) does not.
        let mut candidate = allocation(5000, 8500);
        let decision = f.engine.decide(&mut candidate, false).await;
        assert_eq!(
            decision,
            Decision {
                changed: true,
                increase: true
            }
        );
    }

    #[tokio::test]
    async fn one_sided_growth_is_not_an_increase() {
        let f = fixture();
        // Cpu grows past the band, memory shrinks: change, not growth.
        let mut candidate = allocation(5000, 7000);
        let decision = f.engine.decide(&mut candidate, false).await;
        assert_eq!(
            decision,
            Decision {
                changed: true,
                increase: false
            }
        );
    }

    #[tokio::test]
    async fn capacity_fetch_failure_fails_open() {
        let f = fixture();
        *f.control.capacity.lock().unwrap() = None;
        let mut candidate = allocation(4300, 8500);
        let decision = f.engine.decide(&mut candidate, false).await;
        assert_eq!(
            decision,
            Decision {
                changed: true,
                increase: true
            }
        );
    }

    #[tokio::test]
    async fn zero_band_treats_any_delta_as_change() {
        let mut f = fixture();
        f.engine.config.resource_range = RangeResource::default();
        let mut candidate = allocation(4010, 8192);
        let decision = f.engine.decide(&mut candidate, false).await;
        assert!(decision.changed);
        assert!(!decision.increase);
    }

    #[tokio::test]
    async fn floor_reached_with_capacity_above_floor_drives_down() {
        let f = fixture_with(
            MockControlPlane::with_capacity(current_capacity(), floor_capacity()),
            MemoryCheckpoint::new(None),
            vec![Arc::new(FloorAdapter {
                min: floor_capacity(),
            })],
        );
        let mut candidate = allocation(500, 512);
        let decision = f.engine.decide(&mut candidate, false).await;
        assert_eq!(
            decision,
            Decision {
                changed: true,
                increase: false
            }
        );
        assert_eq!(candidate.cpu_millis(), 1000);
        assert_eq!(candidate.memory_mb(), 1024);
    }

    #[tokio::test]
    async fn floor_reached_with_capacity_at_floor_is_no_change() {
        let at_floor = NmCapacity {
            vcores: 1,
            millicores: 1000,
            memory_mb: 1024,
        };
        let f = fixture_with(
            MockControlPlane::with_capacity(at_floor, floor_capacity()),
            MemoryCheckpoint::new(None),
            vec![Arc::new(FloorAdapter {
                min: floor_capacity(),
            })],
        );
        let mut candidate = allocation(500, 512);
        let decision = f.engine.decide(&mut candidate, false).await;
        assert!(!decision.changed);
    }

    #[tokio::test]
    async fn growth_is_throttled_within_the_interval() {
        let f = fixture();

        f.engine
            .adapt_and_apply(allocation(6000, 16_384), &[])
            .await
            .unwrap();
        assert_eq!(f.control.ensure_calls.lock().unwrap().len(), 1);
        let (target, _, is_decrease) = f.control.ensure_calls.lock().unwrap()[0].clone();
        assert!(!is_decrease);
        assert_eq!(target.vcores, 6);
        assert_eq!(target.millicores, 6000);
        assert_eq!(target.memory_mb, 16_384);

        // Second growth inside the hour-long window is skipped.
        f.engine
            .adapt_and_apply(allocation(6000, 16_384), &[])
            .await
            .unwrap();
        assert_eq!(f.control.ensure_calls.lock().unwrap().len(), 1);

        // A shrink in the same window goes straight through.
        f.engine
            .adapt_and_apply(allocation(2000, 4096), &[])
            .await
            .unwrap();
        let calls = f.control.ensure_calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert!(calls[1].2, "shrink must carry is_decrease");
    }

    #[tokio::test]
    async fn conflict_bypasses_the_growth_throttle() {
        let f = fixture();
        f.engine
            .adapt_and_apply(allocation(6000, 16_384), &[])
            .await
            .unwrap();

        let conflicting = vec!["memory".to_string()];
        f.engine
            .adapt_and_apply(allocation(4300, 8500), &conflicting)
            .await
            .unwrap();

        let calls = f.control.ensure_calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].1, conflicting);
        assert!(calls[1].2, "conflict change is applied as a decrease");
    }

    #[tokio::test]
    async fn apply_failure_is_returned_but_cycle_completes() {
        let f = fixture();
        f.control.fail_ensure.store(true, Ordering::SeqCst);
        // Process is down; the supervisor must still run.
        f.control.push_status(Ok(false));
        f.control.push_status(Ok(true));

        let result = f.engine.adapt_and_apply(allocation(6000, 16_384), &[]).await;
        assert!(result.is_err());
        assert_eq!(f.control.start_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn no_change_cycle_still_checks_liveness() {
        let f = fixture();
        f.control.push_status(Ok(false));
        f.control.push_status(Ok(true));

        f.engine
            .adapt_and_apply(allocation(4300, 8500), &[])
            .await
            .unwrap();

        assert!(f.control.ensure_calls.lock().unwrap().is_empty());
        assert_eq!(f.control.start_calls.load(Ordering::SeqCst), 1);
        assert_eq!(f.alarm.count(), 0);
    }

    #[tokio::test]
    async fn double_disable_is_a_noop() {
        let f = fixture();

        f.engine.disable_scheduling().await.unwrap();
        f.engine.disable_scheduling().await.unwrap();

        assert!(f.engine.is_schedule_disabled().await);
        assert_eq!(f.control.disable_calls.load(Ordering::SeqCst), 1);
        assert_eq!(f.alarm.count(), 1);
        assert_eq!(f.checkpoint.store_count(), 1);
        assert_eq!(f.checkpoint.last_stored(), Some(true));
    }

    #[tokio::test]
    async fn disable_failure_aborts_the_transition() {
        let f = fixture();
        f.control.fail_disable.store(true, Ordering::SeqCst);

        let result = f.engine.disable_scheduling().await;
        assert!(result.is_err());
        assert!(!f.engine.is_schedule_disabled().await);
        assert_eq!(f.checkpoint.store_count(), 0);
        // The alarm precedes the command, so it already fired.
        assert_eq!(f.alarm.count(), 1);
    }

    #[tokio::test]
    async fn enable_after_disable_restores_state() {
        let f = fixture();

        f.engine.disable_scheduling().await.unwrap();
        f.engine.enable_scheduling().await.unwrap();

        assert!(!f.engine.is_schedule_disabled().await);
        assert_eq!(f.control.enable_calls.load(Ordering::SeqCst), 1);
        assert_eq!(f.checkpoint.last_stored(), Some(false));
        assert_eq!(f.checkpoint.recover().unwrap(), Some(false));
    }

    #[tokio::test]
    async fn enable_when_already_enabled_is_a_noop() {
        let f = fixture();
        f.engine.enable_scheduling().await.unwrap();
        assert_eq!(f.control.enable_calls.load(Ordering::SeqCst), 0);
        assert_eq!(f.alarm.count(), 0);
    }

    #[tokio::test]
    async fn recovery_replays_a_disabled_checkpoint() {
        let f = fixture_with(
            MockControlPlane::with_capacity(current_capacity(), floor_capacity()),
            MemoryCheckpoint::new(Some(true)),
            Vec::new(),
        );

        f.engine.recover().await.unwrap();

        assert!(f.engine.is_schedule_disabled().await);
        assert_eq!(f.control.disable_calls.load(Ordering::SeqCst), 1);
        // The replayed transition re-notifies listeners.
        assert_eq!(f.alarm.count(), 1);
    }

    #[tokio::test]
    async fn recovery_without_a_checkpoint_keeps_scheduling_on() {
        let f = fixture();
        f.engine.recover().await.unwrap();
        assert!(!f.engine.is_schedule_disabled().await);
        assert_eq!(f.control.disable_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn supervisor_restarts_a_dead_process() {
        let f = fixture();
        f.control.push_status(Ok(false));
        f.control.push_status(Ok(true));

        f.engine.ensure_process_running().await;

        assert_eq!(f.control.start_calls.load(Ordering::SeqCst), 1);
        assert_eq!(f.alarm.count(), 0);
    }

    #[tokio::test]
    async fn supervisor_alarms_when_process_stays_down() {
        let f = fixture();
        f.control.push_status(Ok(false));
        f.control.push_status(Ok(false));

        f.engine.ensure_process_running().await;

        assert_eq!(f.control.start_calls.load(Ordering::SeqCst), 1);
        assert_eq!(f.alarm.count(), 1);
    }

    #[tokio::test]
    async fn supervisor_reports_start_failure_without_alarm() {
        let f = fixture();
        f.control.push_status(Ok(false));
        f.control.fail_start.store(true, Ordering::SeqCst);

        f.engine.ensure_process_running().await;

        assert_eq!(f.control.start_calls.load(Ordering::SeqCst), 1);
        assert_eq!(f.alarm.count(), 0);
    }

    #[tokio::test]
    async fn supervisor_takes_no_action_on_status_error() {
        let f = fixture();
        f.control
            .push_status(Err(ControlPlaneError::Unavailable("down".to_string())));

        f.engine.ensure_process_running().await;

        assert_eq!(f.control.start_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn running_process_needs_no_supervision() {
        let f = fixture();
        f.control.push_status(Ok(true));

        f.engine.ensure_process_running().await;

        assert_eq!(f.control.start_calls.load(Ordering::SeqCst), 0);
    }
}
