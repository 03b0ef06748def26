//! [`Watchdog`] – worker health monitor.
//!
//! Every worker loop calls [`Watchdog::heartbeat`] once per processed
//! message.  The watchdog records the timestamp of each heartbeat and
//! considers a worker *stalled* once its deadline has passed.  A supervisor
//! can call [`Watchdog::stalled`] to obtain the list of stalled worker ids.
//! Workers that are merely idle (blocked on an empty channel) should use a
//! deadline long enough to cover expected quiet periods, or be exempted
//! from registration.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

// ────────────────────────────────────────────────────────────────────────────
// Public types
// ────────────────────────────────────────────────────────────────────────────

/// Health state reported for a single worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerHealth {
    /// The worker has sent a heartbeat within its deadline.
    Healthy,
    /// The worker has not sent a heartbeat within its deadline.
    Stalled,
}

struct WorkerEntry {
    last_heartbeat: Instant,
    deadline: Duration,
}

// ────────────────────────────────────────────────────────────────────────────
// Watchdog
// ────────────────────────────────────────────────────────────────────────────

/// Tracks heartbeats from registered workers and detects stalls.
///
/// Cloning yields another handle onto the same registry, so the runtime can
/// hand one to every worker.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use elfos_kernel::watchdog::{Watchdog, WorkerHealth};
///
/// let wd = Watchdog::new();
/// wd.register("echo-behavior", Duration::from_secs(5));
/// wd.heartbeat("echo-behavior");
///
/// assert_eq!(wd.health("echo-behavior"), Some(WorkerHealth::Healthy));
/// ```
#[derive(Clone, Default)]
pub struct Watchdog {
    workers: Arc<Mutex<HashMap<String, WorkerEntry>>>,
}

impl Watchdog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `worker_id` with a maximum heartbeat `deadline`.
    ///
    /// The last-heartbeat timestamp starts at now, so the worker begins
    /// healthy.  Re-registering resets the deadline.
    pub fn register(&self, worker_id: &str, deadline: Duration) {
        self.workers.lock().expect("watchdog lock poisoned").insert(
            worker_id.to_string(),
            WorkerEntry {
                last_heartbeat: Instant::now(),
                deadline,
            },
        );
    }

    /// Record a heartbeat.  Unregistered ids are ignored.
    pub fn heartbeat(&self, worker_id: &str) {
        if let Some(entry) = self
            .workers
            .lock()
            .expect("watchdog lock poisoned")
            .get_mut(worker_id)
        {
            entry.last_heartbeat = Instant::now();
        }
    }

    /// Health of one worker, or `None` when unregistered.
    pub fn health(&self, worker_id: &str) -> Option<WorkerHealth> {
        self.workers
            .lock()
            .expect("watchdog lock poisoned")
            .get(worker_id)
            .map(|entry| {
                if entry.last_heartbeat.elapsed() > entry.deadline {
                    WorkerHealth::Stalled
                } else {
                    WorkerHealth::Healthy
                }
            })
    }

    /// Ids of every worker past its deadline, sorted for stable output.
    pub fn stalled(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .workers
            .lock()
            .expect("watchdog lock poisoned")
            .iter()
            .filter(|(_, entry)| entry.last_heartbeat.elapsed() > entry.deadline)
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// Drop a worker from monitoring (on clean shutdown).
    pub fn deregister(&self, worker_id: &str) {
        self.workers
            .lock()
            .expect("watchdog lock poisoned")
            .remove(worker_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_registration_is_healthy() {
        let wd = Watchdog::new();
        wd.register("sensor", Duration::from_secs(60));
        assert_eq!(wd.health("sensor"), Some(WorkerHealth::Healthy));
        assert!(wd.stalled().is_empty());
    }

    #[test]
    fn missed_deadline_reports_stalled() {
        let wd = Watchdog::new();
        wd.register("sensor", Duration::from_millis(1));
        std::thread::sleep(Duration::from_millis(10));
        assert_eq!(wd.health("sensor"), Some(WorkerHealth::Stalled));
        assert_eq!(wd.stalled(), vec!["sensor".to_string()]);
    }

    #[test]
    fn heartbeat_resets_the_deadline() {
        let wd = Watchdog::new();
        wd.register("sensor", Duration::from_millis(50));
        std::thread::sleep(Duration::from_millis(20));
        wd.heartbeat("sensor");
        assert_eq!(wd.health("sensor"), Some(WorkerHealth::Healthy));
    }

    #[test]
    fn deregistered_worker_is_unknown() {
        let wd = Watchdog::new();
        wd.register("sensor", Duration::from_secs(1));
        wd.deregister("sensor");
        assert_eq!(wd.health("sensor"), None);
    }
}
