//! Parallel execution
//!
//! Launches every concurrency-eligible module at once, then runs the
//! exclusive ones sequentially. No capacity ceiling is applied.

use async_trait::async_trait;
use tracing::info;

use super::runner::{fold_batch, run_concurrent, run_module};
use super::ExecutionStrategy;
use crate::error::OrchestratorError;
use crate::models::{ExecutionResult, ModuleRef, ResourceUsage};
use crate::utils::Timer;

/// Maximum-throughput strategy
#[derive(Debug, Default, Clone, Copy)]
pub struct ParallelStrategy;

impl ParallelStrategy {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ExecutionStrategy for ParallelStrategy {
    fn name(&self) -> &str {
        "parallel"
    }

    fn description(&self) -> &str {
        "Run all concurrent modules together, then exclusive modules one at a time"
    }

    async fn execute(&self, modules: &[ModuleRef]) -> Result<ExecutionResult, OrchestratorError> {
        let timer = Timer::start(self.name());

        let (concurrent, exclusive): (Vec<ModuleRef>, Vec<ModuleRef>) = modules
            .iter()
            .cloned()
            .partition(|m| m.resource_requirements().concurrent);

        info!(
            "Running {} modules in parallel, {} exclusive afterwards",
            concurrent.len(),
            exclusive.len()
        );

        let mut usage = ResourceUsage::default();
        let mut results = run_concurrent(&concurrent, concurrent.len()).await;
        fold_batch(&mut usage, &results);

        for module in &exclusive {
            let result = run_module(module, 1).await;
            usage.merge_step(&result.resource_usage);
            results.push(result);
        }

        Ok(ExecutionResult::new(self.name(), results, timer.stop(), usage))
    }
}
