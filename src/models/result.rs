//! Execution result models
//!
//! Per-module results, aggregated run results and derived metrics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use super::ResourceRequirements;

/// Resource usage attributed to a module or a whole run
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceUsage {
    pub peak_cpu: f64,
    pub peak_memory: f64,
    pub network_traffic: f64,
    pub concurrent_tests: usize,
}

impl ResourceUsage {
    /// Snapshot built from a module's declared requirements
    pub fn from_requirements(req: &ResourceRequirements, concurrent_tests: usize) -> Self {
        Self {
            peak_cpu: req.cpu,
            peak_memory: req.memory,
            network_traffic: req.network,
            concurrent_tests,
        }
    }

    /// Combined usage of modules that ran at the same time
    pub fn concurrent_batch<'a>(usages: impl IntoIterator<Item = &'a ResourceUsage>) -> Self {
        usages
            .into_iter()
            .fold(ResourceUsage::default(), |mut acc, usage| {
                acc.peak_cpu += usage.peak_cpu;
                acc.peak_memory += usage.peak_memory;
                acc.network_traffic += usage.network_traffic;
                acc.concurrent_tests += 1;
                acc
            })
    }

    /// Fold a step that ran after the previous ones: peaks are maxima,
    /// traffic accumulates
    pub fn merge_step(&mut self, step: &ResourceUsage) {
        self.peak_cpu = self.peak_cpu.max(step.peak_cpu);
        self.peak_memory = self.peak_memory.max(step.peak_memory);
        self.network_traffic += step.network_traffic;
        self.concurrent_tests = self.concurrent_tests.max(step.concurrent_tests);
    }
}

/// Result of a single module execution
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModuleResult {
    pub module: String,
    pub success: bool,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration: Duration,
    pub error: Option<String>,
    pub retry_count: u32,
    pub resource_usage: ResourceUsage,
    pub details: Option<serde_json::Value>,
}

impl ModuleResult {
    pub fn new(
        module: impl Into<String>,
        success: bool,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        duration: Duration,
    ) -> Self {
        Self {
            module: module.into(),
            success,
            start_time,
            end_time,
            duration,
            error: None,
            retry_count: 0,
            resource_usage: ResourceUsage::default(),
            details: None,
        }
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn with_usage(mut self, usage: ResourceUsage) -> Self {
        self.resource_usage = usage;
        self
    }

    pub fn with_details(mut self, details: Option<serde_json::Value>) -> Self {
        self.details = details;
        self
    }

    pub fn symbol(&self) -> &'static str {
        if self.success {
            "✓"
        } else {
            "✗"
        }
    }
}

impl fmt::Display for ModuleResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} [{}ms]",
            self.symbol(),
            self.module,
            self.duration.as_millis()
        )?;
        if let Some(err) = &self.error {
            write!(f, " - {err}")?;
        }
        Ok(())
    }
}

/// Metrics derived from a finished run
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OptimizationMetrics {
    /// Fraction of modules that ran alongside others
    pub parallelization_ratio: f64,
    /// Mean utilisation of CPU, memory and network against reference ceilings
    pub resource_efficiency: f64,
    /// Fraction of sequential time saved
    pub time_optimization: f64,
    /// Time spent retrying failed modules
    pub failure_recovery_time: Duration,
}

/// Aggregated result of one `execute` call
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub strategy: String,
    pub success: bool,
    /// Module results in completion order
    pub modules: Vec<ModuleResult>,
    pub total_duration: Duration,
    pub resource_usage: ResourceUsage,
    pub optimization_metrics: Option<OptimizationMetrics>,
}

impl ExecutionResult {
    pub fn new(
        strategy: impl Into<String>,
        modules: Vec<ModuleResult>,
        total_duration: Duration,
        resource_usage: ResourceUsage,
    ) -> Self {
        let success = modules.iter().all(|m| m.success);
        Self {
            strategy: strategy.into(),
            success,
            modules,
            total_duration,
            resource_usage,
            optimization_metrics: None,
        }
    }

    /// Look up a module's result by name
    pub fn module(&self, name: &str) -> Option<&ModuleResult> {
        self.modules.iter().find(|m| m.module == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.module(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn passed(&self) -> usize {
        self.modules.iter().filter(|m| m.success).count()
    }

    pub fn failed(&self) -> usize {
        self.modules.len() - self.passed()
    }

    /// Sum of each module's own duration
    pub fn sequential_duration(&self) -> Duration {
        self.modules.iter().map(|m| m.duration).sum()
    }

    pub fn pass_rate(&self) -> f64 {
        if self.modules.is_empty() {
            0.0
        } else {
            (self.passed() as f64 / self.modules.len() as f64) * 100.0
        }
    }
}

impl fmt::Display for ExecutionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Strategy: {}", self.strategy)?;
        writeln!(f, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;
        for result in &self.modules {
            writeln!(f, "  {result}")?;
        }
        writeln!(f, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;
        writeln!(
            f,
            "Total: {} | Pass: {} | Fail: {}",
            self.modules.len(),
            self.passed(),
            self.failed()
        )?;
        writeln!(
            f,
            "Pass Rate: {:.1}% | Duration: {}ms",
            self.pass_rate(),
            self.total_duration.as_millis()
        )
    }
}
