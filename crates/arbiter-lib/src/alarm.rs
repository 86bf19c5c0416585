//! Operator alarm sink
//!
//! Alarms are fire-and-forget: a failed or dropped alarm must never
//! affect the decision or apply path.

use tokio::sync::mpsc;
use tracing::warn;

/// Best-effort alarm channel to the operator
pub trait AlarmSink: Send + Sync {
    fn send(&self, message: &str);
}

/// Alarm sink that only logs, the default for standalone runs
#[derive(Debug, Default, Clone)]
pub struct LogAlarm;

impl AlarmSink for LogAlarm {
    fn send(&self, message: &str) {
        warn!(event = "alarm", message = %message, "Operator alarm");
    }
}

/// Alarm sink backed by a bounded channel to a forwarding task.
///
/// A full queue drops the alarm with a log line rather than blocking
/// the caller.
pub struct ChannelAlarm {
    tx: mpsc::Sender<String>,
}

impl ChannelAlarm {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }
}

impl AlarmSink for ChannelAlarm {
    fn send(&self, message: &str) {
        if let Err(e) = self.tx.try_send(message.to_string()) {
            warn!(error = %e, "Alarm queue full, dropping alarm");
        }
    }
}
