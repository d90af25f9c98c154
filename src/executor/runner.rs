//! Module runner
//!
//! Result shaping shared by every strategy: timing, failure capture and the
//! per-module resource snapshot.

use chrono::Utc;
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, warn};

use crate::models::{ModuleRef, ModuleResult, ResourceUsage};
use crate::utils::Timer;

/// Run one module and shape its result.
///
/// An error returned by the module, or a panic inside it, becomes a failed
/// result with zero usage.
pub async fn run_module(module: &ModuleRef, concurrent_tests: usize) -> ModuleResult {
    let name = module.name().to_string();
    debug!("Starting {}", name);

    let timer = Timer::start(&name);
    let start_time = Utc::now();
    let outcome = AssertUnwindSafe(module.execute()).catch_unwind().await;
    let end_time = Utc::now();
    let duration = timer.stop();

    let outcome = match outcome {
        Ok(outcome) => outcome,
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            error!("Module {} panicked: {}", name, message);
            return ModuleResult::new(&name, false, start_time, end_time, duration)
                .with_error(format!("module panicked: {message}"));
        }
    };

    match outcome {
        Ok(outcome) => {
            let usage =
                ResourceUsage::from_requirements(&module.resource_requirements(), concurrent_tests);
            let mut result = ModuleResult::new(&name, outcome.success, start_time, end_time, duration)
                .with_usage(usage)
                .with_details(outcome.details);
            if let Some(err) = outcome.error {
                result = result.with_error(err);
            }
            if !result.success {
                warn!("  {}", result);
            } else {
                debug!("  {}", result);
            }
            result
        }
        Err(e) => {
            error!("Module {} failed with error: {:#}", name, e);
            ModuleResult::new(&name, false, start_time, end_time, duration).with_error(e.to_string())
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Launch every module at once and wait for all of them.
///
/// Results are returned in completion order. One module failing does not
/// affect its siblings; a task lost to the runtime is reported as failed.
pub async fn run_concurrent(modules: &[ModuleRef], concurrent_tests: usize) -> Vec<ModuleResult> {
    let batch_start = Instant::now();
    let started_at = Utc::now();

    let mut pending: FuturesUnordered<_> = modules
        .iter()
        .map(|module| {
            let module = Arc::clone(module);
            let name = module.name().to_string();
            let handle = tokio::spawn(async move { run_module(&module, concurrent_tests).await });
            async move { (name, handle.await) }
        })
        .collect();

    let mut results = Vec::with_capacity(modules.len());
    while let Some((name, joined)) = pending.next().await {
        match joined {
            Ok(result) => results.push(result),
            Err(e) => {
                error!("Module {} task aborted: {}", name, e);
                results.push(
                    ModuleResult::new(name, false, started_at, Utc::now(), batch_start.elapsed())
                        .with_error(format!("module task aborted: {e}")),
                );
            }
        }
    }

    results
}

/// Usage of one concurrent batch, folded into the run total
pub fn fold_batch(total: &mut ResourceUsage, batch: &[ModuleResult]) {
    if batch.is_empty() {
        return;
    }
    total.merge_step(&ResourceUsage::concurrent_batch(
        batch.iter().map(|r| &r.resource_usage),
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ModuleOutcome, ResourceRequirements, TestModule};
    use crate::modules::SimulatedModule;
    use async_trait::async_trait;
    use std::time::Duration;

    struct PanickingModule {
        deps: Vec<String>,
    }

    #[async_trait]
    impl TestModule for PanickingModule {
        fn name(&self) -> &str {
            "panics"
        }

        fn dependencies(&self) -> &[String] {
            &self.deps
        }

        fn resource_requirements(&self) -> ResourceRequirements {
            ResourceRequirements::new(10.0, 10.0, 0.0, true)
        }

        fn estimated_duration(&self) -> Duration {
            Duration::ZERO
        }

        async fn execute(&self) -> anyhow::Result<ModuleOutcome> {
            panic!("module blew up");
        }
    }

    #[tokio::test]
    async fn test_successful_module_snapshot() {
        let module: ModuleRef = Arc::new(
            SimulatedModule::new("bedrock")
                .with_resources(ResourceRequirements::new(25.0, 512.0, 10.0, true))
                .with_duration(Duration::from_millis(5)),
        );

        let result = run_module(&module, 3).await;
        assert!(result.success);
        assert_eq!(result.retry_count, 0);
        assert!(result.end_time >= result.start_time);
        assert!(result.duration >= Duration::from_millis(5));
        assert_eq!(result.resource_usage.peak_cpu, 25.0);
        assert_eq!(result.resource_usage.peak_memory, 512.0);
        assert_eq!(result.resource_usage.network_traffic, 10.0);
        assert_eq!(result.resource_usage.concurrent_tests, 3);
    }

    #[tokio::test]
    async fn test_reported_failure_keeps_usage() {
        let module: ModuleRef = Arc::new(
            SimulatedModule::new("ui")
                .with_footprint(10.0, 100.0)
                .with_duration(Duration::from_millis(1))
                .failing("button missing"),
        );

        let result = run_module(&module, 1).await;
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("button missing"));
        assert_eq!(result.resource_usage.peak_cpu, 10.0);
    }

    #[tokio::test]
    async fn test_module_error_zeroes_usage() {
        let module: ModuleRef = Arc::new(
            SimulatedModule::new("opensearch")
                .with_footprint(50.0, 1024.0)
                .with_duration(Duration::from_millis(1))
                .erroring("cluster unreachable"),
        );

        let result = run_module(&module, 1).await;
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("cluster unreachable"));
        assert_eq!(result.resource_usage, ResourceUsage::default());
    }

    #[tokio::test]
    async fn test_panic_becomes_failed_result() {
        let module: ModuleRef = Arc::new(PanickingModule { deps: Vec::new() });

        let result = run_module(&module, 1).await;
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("module panicked: module blew up"));
        assert_eq!(result.resource_usage, ResourceUsage::default());
    }

    #[tokio::test]
    async fn test_concurrent_batch_survives_panics_and_errors() {
        let modules: Vec<ModuleRef> = vec![
            Arc::new(PanickingModule { deps: Vec::new() }),
            Arc::new(
                SimulatedModule::new("slow")
                    .with_duration(Duration::from_millis(30)),
            ),
            Arc::new(
                SimulatedModule::new("broken")
                    .with_duration(Duration::from_millis(1))
                    .erroring("boom"),
            ),
        ];

        let results = run_concurrent(&modules, modules.len()).await;
        assert_eq!(results.len(), 3);

        let by_name = |n: &str| results.iter().find(|r| r.module == n).unwrap();
        assert!(!by_name("panics").success);
        assert_eq!(
            by_name("panics").error.as_deref(),
            Some("module panicked: module blew up")
        );
        assert!(by_name("slow").success);
        assert_eq!(by_name("slow").resource_usage.concurrent_tests, 3);
        assert!(!by_name("broken").success);

        // completion order: the slow module finishes last
        assert_eq!(results.last().unwrap().module, "slow");
    }

    #[test]
    fn test_fold_batch_sums_members() {
        let now = Utc::now();
        let batch: Vec<ModuleResult> = [10.0, 20.0]
            .iter()
            .enumerate()
            .map(|(i, cpu)| {
                ModuleResult::new(format!("m{i}"), true, now, now, Duration::ZERO).with_usage(
                    ResourceUsage {
                        peak_cpu: *cpu,
                        peak_memory: 100.0,
                        network_traffic: 1.0,
                        concurrent_tests: 2,
                    },
                )
            })
            .collect();

        let mut total = ResourceUsage::default();
        fold_batch(&mut total, &batch);
        assert_eq!(total.peak_cpu, 30.0);
        assert_eq!(total.peak_memory, 200.0);
        assert_eq!(total.concurrent_tests, 2);

        fold_batch(&mut total, &[]);
        assert_eq!(total.peak_cpu, 30.0);
    }
}
