//! RAII cleanup for a run.
//!
//! The guard stops resource sampling and releases the active-run marker when
//! it goes out of scope, whichever way `execute` exits.

use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};

use crate::monitor::ResourceMonitor;

pub struct RunGuard<'a> {
    strategy: String,
    monitor: &'a ResourceMonitor,
    active: &'a AtomicBool,
    completed: bool,
}

impl<'a> RunGuard<'a> {
    /// Mark a run as active on `active`.
    ///
    /// Overlapping runs on one orchestrator are not supported; a second
    /// acquisition is logged but not refused.
    pub fn acquire(
        strategy: impl Into<String>,
        monitor: &'a ResourceMonitor,
        active: &'a AtomicBool,
    ) -> Self {
        let strategy = strategy.into();
        if active.swap(true, Ordering::SeqCst) {
            warn!(strategy = %strategy, "Run started while another run is active");
        }
        debug!(strategy = %strategy, "Run guard acquired");

        Self {
            strategy,
            monitor,
            active,
            completed: false,
        }
    }

    /// Mark the run as finished successfully.
    pub fn mark_completed(&mut self) {
        self.completed = true;
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.monitor.stop();
        self.active.store(false, Ordering::SeqCst);

        if self.is_completed() {
            debug!(strategy = %self.strategy, "Run cleanup complete");
        } else {
            warn!(strategy = %self.strategy, "Run aborted, cleanup complete");
        }
    }
}
