//! Sequential execution
//!
//! Runs modules strictly one at a time, in input order.

use async_trait::async_trait;
use tracing::info;

use super::runner::run_module;
use super::ExecutionStrategy;
use crate::error::OrchestratorError;
use crate::models::{ExecutionResult, ModuleRef, ResourceUsage};
use crate::utils::Timer;

/// One module at a time, every module runs
#[derive(Debug, Default, Clone, Copy)]
pub struct SequentialStrategy;

impl SequentialStrategy {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ExecutionStrategy for SequentialStrategy {
    fn name(&self) -> &str {
        "sequential"
    }

    fn description(&self) -> &str {
        "Run modules one at a time in dependency order"
    }

    async fn execute(&self, modules: &[ModuleRef]) -> Result<ExecutionResult, OrchestratorError> {
        info!("Running {} modules sequentially", modules.len());

        let timer = Timer::start(self.name());
        let mut usage = ResourceUsage::default();
        let mut results = Vec::with_capacity(modules.len());

        for module in modules {
            let result = run_module(module, 1).await;
            usage.merge_step(&result.resource_usage);
            results.push(result);
        }

        Ok(ExecutionResult::new(self.name(), results, timer.stop(), usage))
    }
}
