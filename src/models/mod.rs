//! Data models for suite orchestration
//!
//! The module contract plus every result structure produced by a run.

mod module;
mod result;

pub use module::{
    ModuleDescriptor, ModuleOutcome, ModuleRef, ResourceRequirements, TestModule,
};
pub use result::{
    ExecutionResult, ModuleResult, OptimizationMetrics, ResourceUsage,
};
