//! Orchestrator errors
//!
//! Configuration and dependency errors that abort a run before any module
//! executes. Module failures never surface here; they are folded into
//! [`ModuleResult`](crate::models::ModuleResult)s.

use thiserror::Error;

use crate::monitor::{ResourceDemand, SystemResources};

/// Errors raised by [`Orchestrator::execute`](crate::Orchestrator::execute)
/// and the dependency-aware strategies
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OrchestratorError {
    #[error("Execution strategy not found: {0}")]
    UnknownStrategy(String),

    #[error(
        "Insufficient system resources: required cpu={:.1}% memory={:.0}MB network={:.1}Mbps, \
         available cpu={:.1}% memory={:.0}MB network={:.1}Mbps",
        .required.cpu, .required.memory, .required.network,
        .available.cpu_percent, .available.memory_mb, .available.network_mbps
    )]
    InsufficientResources {
        required: ResourceDemand,
        available: SystemResources,
    },

    #[error("Circular dependency detected involving module: {module}")]
    CircularDependency { module: String },
}

impl OrchestratorError {
    /// True for errors caused by orchestrator setup rather than the module graph
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            OrchestratorError::UnknownStrategy(_) | OrchestratorError::InsufficientResources { .. }
        )
    }
}
