//! Control-plane contract for the batch scheduler's node daemon
//!
//! The arbiter never touches the enforcement process directly; every
//! capacity, scheduling, and process operation goes through this trait.
//! Implementations live with the binary (HTTP admin client) and in test
//! code (mocks).

use crate::models::{MinCapacity, NmCapacity};
use async_trait::async_trait;
use thiserror::Error;

/// Errors surfaced by the control plane
#[derive(Debug, Error)]
pub enum ControlPlaneError {
    /// A status or capacity query could not be answered
    #[error("control plane unavailable: {0}")]
    Unavailable(String),
    /// A command (start/stop/enable/disable/ensure) was rejected or failed
    #[error("control plane command failed: {0}")]
    Command(String),
    /// A configuration property could not be read or written
    #[error("property {key}: {message}")]
    Property { key: String, message: String },
}

/// Live process and property control plane of the enforcement daemon
#[async_trait]
pub trait ControlPlane: Send + Sync {
    /// Currently enforced capacity; may fail transiently
    async fn capacity(&self) -> Result<NmCapacity, ControlPlaneError>;

    /// The configured floor capacity
    async fn min_capacity(&self) -> MinCapacity;

    /// Drive the daemon to the target capacity. May restart the
    /// enforcement process as a side effect.
    async fn ensure_capacity(
        &self,
        target: &NmCapacity,
        conflicting_resources: &[String],
        is_decrease: bool,
    ) -> Result<(), ControlPlaneError>;

    /// Whether the enforcement process is currently running
    async fn status(&self) -> Result<bool, ControlPlaneError>;

    async fn start_process(&self) -> Result<(), ControlPlaneError>;

    async fn stop_process(&self) -> Result<(), ControlPlaneError>;

    /// Stop the daemon from accepting new offline work
    async fn disable_scheduling(&self) -> Result<(), ControlPlaneError>;

    /// Resume accepting offline work
    async fn enable_scheduling(&self) -> Result<(), ControlPlaneError>;

    /// Read a daemon configuration property
    async fn get_property(&self, key: &str) -> Result<String, ControlPlaneError>;

    /// Write a daemon configuration property
    async fn set_property(&self, key: &str, value: &str) -> Result<(), ControlPlaneError>;
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scriptable control-plane mock shared by the unit tests

    use super::*;
    use std::collections::{HashMap, VecDeque};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    pub(crate) struct MockControlPlane {
        /// `None` makes `capacity()` fail with `Unavailable`
        pub capacity: Mutex<Option<NmCapacity>>,
        pub min: Mutex<MinCapacity>,
        /// Scripted `status()` responses; empty means `Ok(true)`
        pub statuses: Mutex<VecDeque<Result<bool, ControlPlaneError>>>,
        pub fail_ensure: AtomicBool,
        pub fail_start: AtomicBool,
        pub fail_disable: AtomicBool,
        pub fail_enable: AtomicBool,
        pub ensure_calls: Mutex<Vec<(NmCapacity, Vec<String>, bool)>>,
        pub start_calls: AtomicUsize,
        pub stop_calls: AtomicUsize,
        pub disable_calls: AtomicUsize,
        pub enable_calls: AtomicUsize,
        pub properties: Mutex<HashMap<String, String>>,
    }

    impl MockControlPlane {
        pub fn with_capacity(capacity: NmCapacity, min: MinCapacity) -> Self {
            let mock = Self::default();
            *mock.capacity.lock().unwrap() = Some(capacity);
            *mock.min.lock().unwrap() = min;
            mock
        }

        pub fn push_status(&self, status: Result<bool, ControlPlaneError>) {
            self.statuses.lock().unwrap().push_back(status);
        }
    }

    #[async_trait]
    impl ControlPlane for MockControlPlane {
        async fn capacity(&self) -> Result<NmCapacity, ControlPlaneError> {
            self.capacity
                .lock()
                .unwrap()
                .ok_or_else(|| ControlPlaneError::Unavailable("no capacity".to_string()))
        }

        async fn min_capacity(&self) -> MinCapacity {
            *self.min.lock().unwrap()
        }

        async fn ensure_capacity(
            &self,
            target: &NmCapacity,
            conflicting_resources: &[String],
            is_decrease: bool,
        ) -> Result<(), ControlPlaneError> {
            if self.fail_ensure.load(Ordering::SeqCst) {
                return Err(ControlPlaneError::Command("ensure failed".to_string()));
            }
            self.ensure_calls.lock().unwrap().push((
                *target,
                conflicting_resources.to_vec(),
                is_decrease,
            ));
            Ok(())
        }

        async fn status(&self) -> Result<bool, ControlPlaneError> {
            self.statuses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(true))
        }

        async fn start_process(&self) -> Result<(), ControlPlaneError> {
            self.start_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_start.load(Ordering::SeqCst) {
                return Err(ControlPlaneError::Command("start failed".to_string()));
            }
            Ok(())
        }

        async fn stop_process(&self) -> Result<(), ControlPlaneError> {
            self.stop_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn disable_scheduling(&self) -> Result<(), ControlPlaneError> {
            if self.fail_disable.load(Ordering::SeqCst) {
                return Err(ControlPlaneError::Command("disable failed".to_string()));
            }
            self.disable_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn enable_scheduling(&self) -> Result<(), ControlPlaneError> {
            if self.fail_enable.load(Ordering::SeqCst) {
                return Err(ControlPlaneError::Command("enable failed".to_string()));
            }
            self.enable_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn get_property(&self, key: &str) -> Result<String, ControlPlaneError> {
            self.properties
                .lock()
                .unwrap()
                .get(key)
                .cloned()
                .ok_or_else(|| ControlPlaneError::Property {
                    key: key.to_string(),
                    message: "not set".to_string(),
                })
        }

        async fn set_property(&self, key: &str, value: &str) -> Result<(), ControlPlaneError> {
            self.properties
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }
    }
}
