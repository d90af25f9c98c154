//! Strict dependency-ordered execution
//!
//! Re-resolves the dependency order itself and stops at the first failure.

use async_trait::async_trait;
use tracing::{info, warn};

use super::runner::run_module;
use super::ExecutionStrategy;
use crate::error::OrchestratorError;
use crate::models::{ExecutionResult, ModuleRef, ResourceUsage};
use crate::resolver::DependencyResolver;
use crate::utils::Timer;

/// Fail-fast, one module at a time, in resolved order
#[derive(Debug, Default, Clone, Copy)]
pub struct DependencyAwareStrategy {
    resolver: DependencyResolver,
}

impl DependencyAwareStrategy {
    pub fn new() -> Self {
        Self {
            resolver: DependencyResolver::new(),
        }
    }
}

#[async_trait]
impl ExecutionStrategy for DependencyAwareStrategy {
    fn name(&self) -> &str {
        "dependency-aware"
    }

    fn description(&self) -> &str {
        "Run modules strictly in dependency order, stopping at the first failure"
    }

    async fn execute(&self, modules: &[ModuleRef]) -> Result<ExecutionResult, OrchestratorError> {
        let ordered = self.resolver.resolve(modules)?;
        info!("Running {} modules in dependency order", ordered.len());

        let timer = Timer::start(self.name());
        let mut usage = ResourceUsage::default();
        let mut results = Vec::with_capacity(ordered.len());

        for (idx, module) in ordered.iter().enumerate() {
            let result = run_module(module, 1).await;
            let failed = !result.success;
            usage.merge_step(&result.resource_usage);
            results.push(result);

            if failed {
                warn!(
                    "{} failed, skipping {} remaining modules",
                    module.name(),
                    ordered.len() - idx - 1
                );
                break;
            }
        }

        Ok(ExecutionResult::new(self.name(), results, timer.stop(), usage))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::{Journal, SimulatedModule};
    use std::sync::Arc;
    use std::time::Duration;

    fn module(name: &str) -> SimulatedModule {
        SimulatedModule::new(name).with_duration(Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_runs_in_resolved_order() {
        let journal = Journal::new();
        let modules: Vec<ModuleRef> = vec![
            Arc::new(module("ui").depends_on(["api"]).with_journal(journal.clone())),
            Arc::new(module("api").depends_on(["db"]).with_journal(journal.clone())),
            Arc::new(module("db").with_journal(journal.clone())),
        ];

        let result = DependencyAwareStrategy::new().execute(&modules).await.unwrap();
        assert!(result.success);
        assert_eq!(journal.entries(), vec!["db", "api", "ui"]);
        assert!(result
            .modules
            .iter()
            .all(|m| m.resource_usage.concurrent_tests == 1));
    }

    #[tokio::test]
    async fn test_stops_at_first_failure() {
        let modules: Vec<ModuleRef> = vec![
            Arc::new(module("a").failing("health check failed")),
            Arc::new(module("b").depends_on(["a"])),
            Arc::new(module("c")),
        ];

        let result = DependencyAwareStrategy::new().execute(&modules).await.unwrap();
        assert!(!result.success);
        assert_eq!(result.len(), 1);
        assert!(result.contains("a"));
        assert!(!result.contains("b"));
        assert!(!result.contains("c"));
    }

    #[tokio::test]
    async fn test_cycle_fails_before_any_module_runs() {
        let journal = Journal::new();
        let modules: Vec<ModuleRef> = vec![
            Arc::new(module("a").depends_on(["b"]).with_journal(journal.clone())),
            Arc::new(module("b").depends_on(["c"]).with_journal(journal.clone())),
            Arc::new(module("c").depends_on(["a"]).with_journal(journal.clone())),
        ];

        let err = DependencyAwareStrategy::new()
            .execute(&modules)
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::CircularDependency { .. }));
        assert!(journal.entries().is_empty());
    }
}
