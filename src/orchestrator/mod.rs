//! Orchestrator façade
//!
//! Owns the module registry, the resource monitor, the dependency resolver
//! and the strategy table, and drives a run end to end:
//!
//! 1. look up the strategy
//! 2. check aggregate demand against capacity
//! 3. resolve dependency order
//! 4. execute under the strategy while the monitor samples
//! 5. derive optimization metrics
//!
//! Cleanup runs on every exit path. Overlapping `execute` calls on one
//! orchestrator are not supported.

mod events;
mod guard;
pub mod metrics;

pub use events::{EventBus, OrchestratorEvent};

use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::config::AppConfig;
use crate::error::OrchestratorError;
use crate::executor::{ExecutionPhase, ExecutionStrategy, PhasePlanner, PlannerConfig, StrategyKind};
use crate::models::{ExecutionResult, ModuleDescriptor, ModuleRef};
use crate::monitor::{ResourceDemand, ResourceMonitor, SystemResources};
use crate::resolver::DependencyResolver;
use crate::utils::Stopwatch;
use guard::RunGuard;

pub struct Orchestrator {
    modules: Vec<ModuleRef>,
    strategies: Vec<Box<dyn ExecutionStrategy>>,
    monitor: ResourceMonitor,
    resolver: DependencyResolver,
    planner: PlannerConfig,
    events: EventBus,
    active: AtomicBool,
}

impl Orchestrator {
    /// Orchestrator with the four built-in strategies
    pub fn new(capacity: SystemResources, planner: PlannerConfig) -> Self {
        Self {
            modules: Vec::new(),
            strategies: StrategyKind::all()
                .iter()
                .map(|kind| kind.build(planner))
                .collect(),
            monitor: ResourceMonitor::new(capacity),
            resolver: DependencyResolver::new(),
            planner,
            events: EventBus::new(),
            active: AtomicBool::new(false),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.capacity, config.planner)
    }

    /// Register a module. A module with the same name is replaced in place.
    pub fn register_module(&mut self, module: ModuleRef) {
        let descriptor = ModuleDescriptor::of(module.as_ref());

        match self.modules.iter().position(|m| m.name() == module.name()) {
            Some(idx) => {
                warn!("Module {} already registered, replacing it", descriptor.name);
                self.modules[idx] = module;
            }
            None => self.modules.push(module),
        }

        info!("Registered module {}", descriptor);
        self.events
            .publish(OrchestratorEvent::ModuleRegistered(descriptor));
    }

    /// Add a strategy, replacing any strategy with the same name
    pub fn register_strategy(&mut self, strategy: Box<dyn ExecutionStrategy>) {
        match self
            .strategies
            .iter()
            .position(|s| s.name() == strategy.name())
        {
            Some(idx) => self.strategies[idx] = strategy,
            None => self.strategies.push(strategy),
        }
    }

    pub fn modules(&self) -> &[ModuleRef] {
        &self.modules
    }

    pub fn module(&self, name: &str) -> Option<&ModuleRef> {
        self.modules.iter().find(|m| m.name() == name)
    }

    /// `(name, description)` of every available strategy
    pub fn strategies(&self) -> Vec<(&str, &str)> {
        self.strategies
            .iter()
            .map(|s| (s.name(), s.description()))
            .collect()
    }

    fn strategy(&self, name: &str) -> Option<&dyn ExecutionStrategy> {
        self.strategies
            .iter()
            .find(|s| s.name() == name)
            .map(|s| s.as_ref())
    }

    pub fn monitor(&self) -> &ResourceMonitor {
        &self.monitor
    }

    pub fn subscribe(&self) -> broadcast::Receiver<OrchestratorEvent> {
        self.events.subscribe()
    }

    pub fn is_running(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Phases the optimized strategy would run, without executing anything
    pub fn plan(&self) -> Result<Vec<ExecutionPhase>, OrchestratorError> {
        let ordered = self.resolver.resolve(&self.modules)?;
        Ok(PhasePlanner::new(self.planner).plan(&ordered))
    }

    /// Run every registered module under the named strategy.
    ///
    /// Configuration and dependency errors are returned without an
    /// [`ExecutionResult`]; module failures are reported inside it.
    pub async fn execute(&self, strategy_name: &str) -> Result<ExecutionResult, OrchestratorError> {
        match self.run(strategy_name).await {
            Ok(result) => {
                info!(
                    "Execution with {} completed in {}ms - Pass: {}/{} ({:.1}%)",
                    strategy_name,
                    result.total_duration.as_millis(),
                    result.passed(),
                    result.len(),
                    result.pass_rate()
                );
                self.events
                    .publish(OrchestratorEvent::ExecutionCompleted(result.clone()));
                Ok(result)
            }
            Err(e) => {
                error!("Execution with {} failed: {}", strategy_name, e);
                self.events.publish(OrchestratorEvent::ExecutionFailed {
                    strategy: strategy_name.to_string(),
                    error: e.clone(),
                });
                Err(e)
            }
        }
    }

    async fn run(&self, strategy_name: &str) -> Result<ExecutionResult, OrchestratorError> {
        let mut guard = RunGuard::acquire(strategy_name, &self.monitor, &self.active);
        let mut stopwatch = Stopwatch::new();

        let strategy = self
            .strategy(strategy_name)
            .ok_or_else(|| OrchestratorError::UnknownStrategy(strategy_name.to_string()))?;

        let demand = ResourceDemand::of(&self.modules);
        if !self.monitor.has_capacity_for(&demand) {
            return Err(OrchestratorError::InsufficientResources {
                required: demand,
                available: self.monitor.system_resources(),
            });
        }
        stopwatch.lap("capacity");

        let ordered = self.resolver.resolve(&self.modules)?;
        stopwatch.lap("resolve");

        info!(
            "Starting {} execution of {} modules",
            strategy.name(),
            ordered.len()
        );
        self.monitor.start();
        let mut result = strategy.execute(&ordered).await?;
        stopwatch.lap("execute");

        result.optimization_metrics = Some(metrics::derive(&result));
        self.monitor.record(&result.resource_usage);
        self.monitor.stop();
        stopwatch.lap("metrics");

        debug!("Run stages: {}", stopwatch.format());
        guard.mark_completed();
        Ok(result)
    }
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new(SystemResources::default(), PlannerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ResourceRequirements;
    use crate::modules::{Journal, SimulatedModule};
    use std::sync::Arc;
    use std::time::Duration;

    fn module(name: &str) -> SimulatedModule {
        SimulatedModule::new(name)
            .with_footprint(10.0, 100.0)
            .with_duration(Duration::from_millis(2))
    }

    fn orchestrator_with(modules: Vec<SimulatedModule>) -> Orchestrator {
        let mut orchestrator = Orchestrator::default();
        for m in modules {
            orchestrator.register_module(Arc::new(m));
        }
        orchestrator
    }

    #[test]
    fn test_builtin_strategies() {
        let orchestrator = Orchestrator::default();
        let names: Vec<&str> = orchestrator.strategies().iter().map(|(n, _)| *n).collect();
        assert_eq!(
            names,
            vec!["sequential", "parallel", "optimized", "dependency-aware"]
        );
    }

    #[test]
    fn test_reregistration_last_write_wins() {
        let orchestrator = orchestrator_with(vec![
            module("api").with_priority(1),
            module("ui"),
            module("api").with_priority(7),
        ]);

        assert_eq!(orchestrator.modules().len(), 2);
        assert_eq!(orchestrator.module("api").unwrap().priority(), 7);
        assert_eq!(orchestrator.modules()[0].name(), "api");
    }

    #[tokio::test]
    async fn test_execute_attaches_metrics_and_cleans_up() {
        let orchestrator = orchestrator_with(vec![module("a"), module("b"), module("c")]);

        let result = orchestrator.execute("optimized").await.unwrap();
        assert!(result.success);
        assert_eq!(result.len(), 3);

        let metrics = result.optimization_metrics.unwrap();
        assert_eq!(metrics.parallelization_ratio, 1.0);
        assert!(!orchestrator.monitor().is_sampling());
        assert!(!orchestrator.is_running());
        assert_eq!(orchestrator.monitor().peak_usage().peak_cpu, 30.0);
    }

    #[tokio::test]
    async fn test_unknown_strategy_runs_nothing() {
        let journal = Journal::new();
        let orchestrator = orchestrator_with(vec![module("a").with_journal(journal.clone())]);
        let mut events = orchestrator.subscribe();

        let err = orchestrator.execute("fastest").await.unwrap_err();
        assert_eq!(err, OrchestratorError::UnknownStrategy("fastest".to_string()));
        assert!(journal.entries().is_empty());
        assert!(!orchestrator.is_running());

        match events.recv().await.unwrap() {
            OrchestratorEvent::ExecutionFailed { strategy, error } => {
                assert_eq!(strategy, "fastest");
                assert_eq!(error, err);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_insufficient_capacity_fails_before_running() {
        let journal = Journal::new();
        let mut orchestrator = Orchestrator::new(
            SystemResources {
                cpu_percent: 50.0,
                memory_mb: 8192.0,
                network_mbps: 100.0,
                concurrency_allowed: true,
            },
            PlannerConfig::default(),
        );
        for name in ["a", "b", "c", "d", "e", "f"] {
            orchestrator.register_module(Arc::new(module(name).with_journal(journal.clone())));
        }

        let err = orchestrator.execute("sequential").await.unwrap_err();
        assert!(matches!(err, OrchestratorError::InsufficientResources { .. }));
        assert!(journal.entries().is_empty());
        assert!(!orchestrator.monitor().is_sampling());
    }

    #[tokio::test]
    async fn test_cycle_fails_before_running() {
        let journal = Journal::new();
        let orchestrator = orchestrator_with(vec![
            module("a").depends_on(["b"]).with_journal(journal.clone()),
            module("b").depends_on(["c"]).with_journal(journal.clone()),
            module("c").depends_on(["a"]).with_journal(journal.clone()),
        ]);

        let err = orchestrator.execute("dependency-aware").await.unwrap_err();
        assert!(matches!(err, OrchestratorError::CircularDependency { .. }));
        assert!(journal.entries().is_empty());
        assert!(!orchestrator.is_running());
    }

    #[tokio::test]
    async fn test_sequential_receives_resolved_order() {
        let journal = Journal::new();
        let orchestrator = orchestrator_with(vec![
            module("ui").depends_on(["api"]).with_journal(journal.clone()),
            module("api").with_journal(journal.clone()),
        ]);

        orchestrator.execute("sequential").await.unwrap();
        assert_eq!(journal.entries(), vec!["api", "ui"]);
    }

    #[tokio::test]
    async fn test_module_failure_is_reported_not_raised() {
        let orchestrator = orchestrator_with(vec![
            module("a").erroring("bedrock throttled"),
            module("b"),
        ]);

        let result = orchestrator.execute("parallel").await.unwrap();
        assert!(!result.success);
        assert_eq!(result.len(), 2);
        assert_eq!(
            result.module("a").unwrap().error.as_deref(),
            Some("bedrock throttled")
        );
    }

    #[tokio::test]
    async fn test_dependent_of_failed_module_never_runs() {
        let orchestrator = orchestrator_with(vec![
            module("a").failing("index missing"),
            module("b").depends_on(["a"]),
        ]);

        let result = orchestrator.execute("dependency-aware").await.unwrap();
        assert!(!result.success);
        assert!(result.contains("a"));
        assert!(!result.contains("b"));
    }

    #[tokio::test]
    async fn test_single_module_has_no_time_savings() {
        let orchestrator = orchestrator_with(vec![module("solo")]);
        let result = orchestrator.execute("parallel").await.unwrap();
        assert_eq!(result.optimization_metrics.unwrap().time_optimization, 0.0);
    }

    #[tokio::test]
    async fn test_concurrent_modules_save_time() {
        let orchestrator = orchestrator_with(
            (0..4)
                .map(|i| {
                    SimulatedModule::new(format!("m{i}"))
                        .with_footprint(10.0, 100.0)
                        .with_duration(Duration::from_millis(60))
                })
                .collect(),
        );

        let result = orchestrator.execute("parallel").await.unwrap();
        let saved = result.optimization_metrics.unwrap().time_optimization;
        assert!(saved > 0.5, "expected > 0.5 time savings, got {saved}");
    }

    #[tokio::test]
    async fn test_lifecycle_events() {
        let mut orchestrator = Orchestrator::default();
        let mut events = orchestrator.subscribe();

        orchestrator.register_module(Arc::new(module("probe").with_resources(
            ResourceRequirements::new(5.0, 64.0, 1.0, true),
        )));
        let result = orchestrator.execute("sequential").await.unwrap();

        match events.recv().await.unwrap() {
            OrchestratorEvent::ModuleRegistered(descriptor) => {
                assert_eq!(descriptor.name, "probe");
                assert_eq!(descriptor.resources.memory, 64.0);
            }
            other => panic!("unexpected event {other:?}"),
        }
        match events.recv().await.unwrap() {
            OrchestratorEvent::ExecutionCompleted(completed) => {
                assert_eq!(completed.len(), result.len());
                assert!(completed.optimization_metrics.is_some());
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_registry() {
        let orchestrator = Orchestrator::default();
        let result = orchestrator.execute("optimized").await.unwrap();
        assert!(result.success);
        assert!(result.is_empty());
    }
    #[test]
    fn test_plan_uses_resolved_order() {
        let orchestrator = orchestrator_with(vec![
            module("report").depends_on(["api"]),
            module("api"),
            module("db"),
        ]);

        let phases = orchestrator.plan().unwrap();
        let names: Vec<Vec<&str>> = phases.iter().map(|p| p.module_names()).collect();
        assert_eq!(names, vec![vec!["api", "db"], vec!["report"]]);
        assert!(!orchestrator.is_running());
    }

    #[test]
    fn test_plan_rejects_cycle() {
        let orchestrator = orchestrator_with(vec![
            module("a").depends_on(["b"]),
            module("b").depends_on(["a"]),
        ]);

        assert!(matches!(
            orchestrator.plan(),
            Err(OrchestratorError::CircularDependency { .. })
        ));
    }
}
