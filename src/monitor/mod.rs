//! Resource monitor
//!
//! Reports the capacity the orchestrator may schedule against and tracks the
//! peak usage observed across runs. Capacity is a configured descriptor, not
//! a live OS probe.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tracing::debug;

use crate::models::{ModuleRef, ResourceUsage};

/// Capacity available to a run
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemResources {
    pub cpu_percent: f64,
    pub memory_mb: f64,
    pub network_mbps: f64,
    pub concurrency_allowed: bool,
}

impl Default for SystemResources {
    fn default() -> Self {
        Self {
            cpu_percent: 400.0,
            memory_mb: 16384.0,
            network_mbps: 1000.0,
            concurrency_allowed: true,
        }
    }
}

/// Aggregate resource demand of a module set
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceDemand {
    pub cpu: f64,
    pub memory: f64,
    pub network: f64,
}

impl ResourceDemand {
    /// Sum the declared requirements of every module
    pub fn of(modules: &[ModuleRef]) -> Self {
        modules.iter().fold(Self::default(), |mut acc, module| {
            let req = module.resource_requirements();
            acc.cpu += req.cpu;
            acc.memory += req.memory;
            acc.network += req.network;
            acc
        })
    }
}

/// Capacity oracle with sampling markers
#[derive(Debug)]
pub struct ResourceMonitor {
    capacity: SystemResources,
    sampling: AtomicBool,
    peak: Mutex<ResourceUsage>,
}

impl ResourceMonitor {
    pub fn new(capacity: SystemResources) -> Self {
        Self {
            capacity,
            sampling: AtomicBool::new(false),
            peak: Mutex::new(ResourceUsage::default()),
        }
    }

    /// Capacity available for scheduling
    pub fn system_resources(&self) -> SystemResources {
        self.capacity
    }

    /// Whether `demand` fits inside the available capacity
    pub fn has_capacity_for(&self, demand: &ResourceDemand) -> bool {
        demand.cpu <= self.capacity.cpu_percent
            && demand.memory <= self.capacity.memory_mb
            && demand.network <= self.capacity.network_mbps
    }

    /// Begin sampling. Calling twice is a no-op.
    pub fn start(&self) {
        if !self.sampling.swap(true, Ordering::SeqCst) {
            debug!("Resource sampling started");
        }
    }

    /// Stop sampling. Calling twice is a no-op.
    pub fn stop(&self) {
        if self.sampling.swap(false, Ordering::SeqCst) {
            debug!("Resource sampling stopped");
        }
    }

    pub fn is_sampling(&self) -> bool {
        self.sampling.load(Ordering::SeqCst)
    }

    /// Fold a run's aggregated usage into the observed peak
    pub fn record(&self, usage: &ResourceUsage) {
        let mut peak = self.peak.lock().unwrap_or_else(|e| e.into_inner());
        peak.peak_cpu = peak.peak_cpu.max(usage.peak_cpu);
        peak.peak_memory = peak.peak_memory.max(usage.peak_memory);
        peak.network_traffic = peak.network_traffic.max(usage.network_traffic);
        peak.concurrent_tests = peak.concurrent_tests.max(usage.concurrent_tests);
    }

    /// Highest usage observed so far
    pub fn peak_usage(&self) -> ResourceUsage {
        *self.peak.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for ResourceMonitor {
    fn default() -> Self {
        Self::new(SystemResources::default())
    }
}
