//! Execution strategies
//!
//! Sequential, parallel, phase-optimized and dependency-aware scheduling of
//! test modules.

mod dependency_aware;
mod optimized;
mod parallel;
mod runner;
mod sequential;

pub use dependency_aware::DependencyAwareStrategy;
pub use optimized::{ExecutionPhase, OptimizedStrategy, PhasePlanner, PlannerConfig};
pub use parallel::ParallelStrategy;
pub use runner::{run_concurrent, run_module};
pub use sequential::SequentialStrategy;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::OrchestratorError;
use crate::models::{ExecutionResult, ModuleRef};

/// A scheduling policy for a module set
#[async_trait]
pub trait ExecutionStrategy: Send + Sync {
    /// Key the strategy is selected by
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Execute `modules`, which arrive in dependency order
    async fn execute(&self, modules: &[ModuleRef]) -> Result<ExecutionResult, OrchestratorError>;
}

/// Built-in strategies
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    Sequential,
    Parallel,
    Optimized,
    DependencyAware,
}

impl StrategyKind {
    pub fn key(&self) -> &'static str {
        match self {
            StrategyKind::Sequential => "sequential",
            StrategyKind::Parallel => "parallel",
            StrategyKind::Optimized => "optimized",
            StrategyKind::DependencyAware => "dependency-aware",
        }
    }

    pub fn all() -> Vec<StrategyKind> {
        vec![
            StrategyKind::Sequential,
            StrategyKind::Parallel,
            StrategyKind::Optimized,
            StrategyKind::DependencyAware,
        ]
    }

    /// Instantiate the strategy
    pub fn build(&self, planner: PlannerConfig) -> Box<dyn ExecutionStrategy> {
        match self {
            StrategyKind::Sequential => Box::new(SequentialStrategy::new()),
            StrategyKind::Parallel => Box::new(ParallelStrategy::new()),
            StrategyKind::Optimized => Box::new(OptimizedStrategy::new(planner)),
            StrategyKind::DependencyAware => Box::new(DependencyAwareStrategy::new()),
        }
    }
}

impl FromStr for StrategyKind {
    type Err = OrchestratorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sequential" => Ok(StrategyKind::Sequential),
            "parallel" => Ok(StrategyKind::Parallel),
            "optimized" => Ok(StrategyKind::Optimized),
            "dependency-aware" | "dependency_aware" => Ok(StrategyKind::DependencyAware),
            _ => Err(OrchestratorError::UnknownStrategy(s.to_string())),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
