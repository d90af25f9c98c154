//! Optimization metrics
//!
//! Derived from a finished [`ExecutionResult`]; never an input to scheduling.

use std::time::Duration;

use crate::models::{ExecutionResult, OptimizationMetrics};

/// Reference CPU ceiling (%)
pub const REFERENCE_CPU: f64 = 100.0;
/// Reference memory ceiling (MB)
pub const REFERENCE_MEMORY_MB: f64 = 8192.0;
/// Reference network ceiling (Mbps)
pub const REFERENCE_NETWORK_MBPS: f64 = 100.0;

/// Compute metrics for a completed run
pub fn derive(result: &ExecutionResult) -> OptimizationMetrics {
    OptimizationMetrics {
        parallelization_ratio: parallelization_ratio(result),
        resource_efficiency: resource_efficiency(result),
        time_optimization: time_optimization(
            result.total_duration,
            result.sequential_duration(),
            result.len(),
        ),
        failure_recovery_time: failure_recovery_time(result),
    }
}

fn parallelization_ratio(result: &ExecutionResult) -> f64 {
    if result.is_empty() {
        return 0.0;
    }
    let concurrent = result
        .modules
        .iter()
        .filter(|m| m.resource_usage.concurrent_tests > 1)
        .count();
    concurrent as f64 / result.len() as f64
}

fn resource_efficiency(result: &ExecutionResult) -> f64 {
    let usage = &result.resource_usage;
    let cpu = usage.peak_cpu / REFERENCE_CPU;
    let memory = usage.peak_memory / REFERENCE_MEMORY_MB;
    let network = usage.network_traffic / REFERENCE_NETWORK_MBPS;
    (cpu + memory + network) / 3.0
}

/// Fraction of the summed module time saved, clamped to [0, 1]
fn time_optimization(actual: Duration, sequential: Duration, modules: usize) -> f64 {
    if modules <= 1 || sequential.is_zero() {
        return 0.0;
    }
    (1.0 - actual.as_secs_f64() / sequential.as_secs_f64()).clamp(0.0, 1.0)
}

fn failure_recovery_time(result: &ExecutionResult) -> Duration {
    result
        .modules
        .iter()
        .filter(|m| !m.success)
        .map(|m| m.duration * m.retry_count)
        .sum()
}
