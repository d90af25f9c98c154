//! Suite Orchestrator - dependency- and resource-aware test execution
//!
//! Registers test modules, orders them by their declared dependencies and
//! runs them under one of several execution strategies while keeping
//! aggregate demand within the available capacity.
//!
//! ## Strategies
//!
//! - `sequential`: one module at a time, in dependency order
//! - `parallel`: concurrency-safe modules together, exclusive ones after
//! - `optimized`: greedy phases bounded by per-phase CPU and memory budgets
//! - `dependency-aware`: dependency order, stops at the first failure
//!
//! ## Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use suite_orchestrator::{modules::SimulatedModule, Orchestrator};
//!
//! # async fn demo() -> Result<(), suite_orchestrator::OrchestratorError> {
//! let mut orchestrator = Orchestrator::default();
//! orchestrator.register_module(Arc::new(SimulatedModule::new("db")));
//! orchestrator.register_module(Arc::new(SimulatedModule::new("api").depends_on(["db"])));
//!
//! let result = orchestrator.execute("optimized").await?;
//! println!("{result}");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod executor;
pub mod models;
pub mod modules;
pub mod monitor;
pub mod orchestrator;
pub mod output;
pub mod resolver;
pub mod utils;

pub use error::OrchestratorError;
pub use executor::{ExecutionPhase, ExecutionStrategy, PlannerConfig, StrategyKind};
pub use models::{
    ExecutionResult, ModuleRef, ModuleResult, OptimizationMetrics, ResourceRequirements,
    ResourceUsage, TestModule,
};
pub use monitor::{ResourceMonitor, SystemResources};
pub use orchestrator::{Orchestrator, OrchestratorEvent};
pub use resolver::DependencyResolver;
