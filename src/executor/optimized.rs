//! Resource-aware phased execution
//!
//! Modules are packed into phases bounded by a CPU and memory budget, then
//! executed phase by phase.
//!
//! ## Planning
//!
//! 1. Sort by descending priority, ties broken by ascending cpu + memory.
//! 2. Open a phase and scan the sorted list. A module joins the phase when all
//!    of its dependencies sit in earlier phases and the phase stays within
//!    budget. Admitting an exclusive module closes the phase.
//! 3. If nothing fits, one module is forced into a phase of its own so the
//!    planner always makes progress.
//!
//! The planner is greedy: it never backtracks or reopens a closed phase.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::runner::{fold_batch, run_concurrent, run_module};
use super::ExecutionStrategy;
use crate::error::OrchestratorError;
use crate::models::{ExecutionResult, ModuleRef, ResourceUsage};
use crate::utils::Timer;

/// Per-phase resource budget
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Maximum summed CPU share of one phase
    pub max_phase_cpu: f64,
    /// Maximum summed memory (MB) of one phase
    pub max_phase_memory: f64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            max_phase_cpu: 80.0,
            max_phase_memory: 6144.0,
        }
    }
}

/// A group of modules executed together
#[derive(Clone)]
pub struct ExecutionPhase {
    pub id: usize,
    pub modules: Vec<ModuleRef>,
    pub parallel: bool,
    pub estimated_duration: Duration,
}

impl ExecutionPhase {
    fn new(id: usize, modules: Vec<ModuleRef>) -> Self {
        let parallel =
            modules.len() > 1 && modules.iter().all(|m| m.resource_requirements().concurrent);
        let estimated_duration = modules
            .iter()
            .map(|m| m.estimated_duration())
            .max()
            .unwrap_or_default();

        Self {
            id,
            modules,
            parallel,
            estimated_duration,
        }
    }

    pub fn module_names(&self) -> Vec<&str> {
        self.modules.iter().map(|m| m.name()).collect()
    }

    pub fn total_cpu(&self) -> f64 {
        self.modules.iter().map(|m| m.resource_requirements().cpu).sum()
    }

    pub fn total_memory(&self) -> f64 {
        self.modules.iter().map(|m| m.resource_requirements().memory).sum()
    }
}

impl fmt::Debug for ExecutionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionPhase")
            .field("id", &self.id)
            .field("modules", &self.module_names())
            .field("parallel", &self.parallel)
            .field("estimated_duration", &self.estimated_duration)
            .finish()
    }
}

impl fmt::Display for ExecutionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Phase {} ({}, ~{}ms, cpu {:.0}%, mem {:.0}MB): {}",
            self.id,
            if self.parallel { "parallel" } else { "sequential" },
            self.estimated_duration.as_millis(),
            self.total_cpu(),
            self.total_memory(),
            self.module_names().join(", ")
        )
    }
}

/// Greedy capacity-bounded phase planner
#[derive(Debug, Default, Clone, Copy)]
pub struct PhasePlanner {
    config: PlannerConfig,
}

impl PhasePlanner {
    pub fn new(config: PlannerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> PlannerConfig {
        self.config
    }

    /// Build the execution plan for `modules`.
    ///
    /// Dependencies outside the module set count as satisfied.
    pub fn plan(&self, modules: &[ModuleRef]) -> Vec<ExecutionPhase> {
        let known: HashSet<&str> = modules.iter().map(|m| m.name()).collect();

        let mut sorted: Vec<&ModuleRef> = modules.iter().collect();
        sorted.sort_by(|a, b| {
            b.priority().cmp(&a.priority()).then_with(|| {
                a.resource_requirements()
                    .footprint()
                    .total_cmp(&b.resource_requirements().footprint())
            })
        });

        let mut placed = vec![false; sorted.len()];
        let mut remaining = sorted.len();
        let mut closed: HashSet<&str> = HashSet::new();
        let mut phases = Vec::new();

        while remaining > 0 {
            let mut members: Vec<usize> = Vec::new();
            let mut cpu = 0.0;
            let mut memory = 0.0;

            for (idx, module) in sorted.iter().enumerate() {
                if placed[idx] || !deps_ready(module, &closed, &known) {
                    continue;
                }

                let req = module.resource_requirements();
                if cpu + req.cpu > self.config.max_phase_cpu
                    || memory + req.memory > self.config.max_phase_memory
                {
                    continue;
                }

                placed[idx] = true;
                members.push(idx);
                cpu += req.cpu;
                memory += req.memory;

                if !req.concurrent {
                    break;
                }
            }

            if members.is_empty() {
                let forced = (0..sorted.len())
                    .find(|&i| !placed[i] && deps_ready(sorted[i], &closed, &known))
                    .or_else(|| placed.iter().position(|p| !p));
                let Some(idx) = forced else {
                    break;
                };

                warn!(
                    "No module fits phase {}, forcing {} into its own phase",
                    phases.len() + 1,
                    sorted[idx].name()
                );
                placed[idx] = true;
                members.push(idx);
            }

            remaining -= members.len();
            for &idx in &members {
                closed.insert(sorted[idx].name());
            }

            let phase = ExecutionPhase::new(
                phases.len() + 1,
                members.iter().map(|&idx| Arc::clone(sorted[idx])).collect(),
            );
            debug!("Planned {}", phase);
            phases.push(phase);
        }

        phases
    }
}

fn deps_ready(module: &ModuleRef, closed: &HashSet<&str>, known: &HashSet<&str>) -> bool {
    module
        .dependencies()
        .iter()
        .all(|d| closed.contains(d.as_str()) || !known.contains(d.as_str()))
}

/// Phase-planned execution within a resource budget
#[derive(Debug, Default, Clone, Copy)]
pub struct OptimizedStrategy {
    planner: PhasePlanner,
}

impl OptimizedStrategy {
    pub fn new(config: PlannerConfig) -> Self {
        Self {
            planner: PhasePlanner::new(config),
        }
    }

    /// The plan this strategy would execute
    pub fn plan(&self, modules: &[ModuleRef]) -> Vec<ExecutionPhase> {
        self.planner.plan(modules)
    }
}

#[async_trait]
impl ExecutionStrategy for OptimizedStrategy {
    fn name(&self) -> &str {
        "optimized"
    }

    fn description(&self) -> &str {
        "Pack modules into resource-bounded phases and run each phase concurrently when possible"
    }

    async fn execute(&self, modules: &[ModuleRef]) -> Result<ExecutionResult, OrchestratorError> {
        let timer = Timer::start(self.name());
        let phases = self.plan(modules);

        info!(
            "Execution plan: {} phases for {} modules",
            phases.len(),
            modules.len()
        );

        let mut usage = ResourceUsage::default();
        let mut results = Vec::with_capacity(modules.len());

        for phase in &phases {
            info!("=== {} ===", phase);

            if phase.parallel {
                let batch = run_concurrent(&phase.modules, phase.modules.len()).await;
                fold_batch(&mut usage, &batch);
                results.extend(batch);
            } else {
                for module in &phase.modules {
                    let result = run_module(module, 1).await;
                    usage.merge_step(&result.resource_usage);
                    results.push(result);
                }
            }
        }

        Ok(ExecutionResult::new(self.name(), results, timer.stop(), usage))
    }
}
