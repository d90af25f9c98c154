//! Test module contract
//!
//! A module is an opaque unit of test work. The orchestrator only reads its
//! declared metadata and calls [`TestModule::execute`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Shared handle to a registered module
pub type ModuleRef = Arc<dyn TestModule>;

/// An independently executable test unit
#[async_trait]
pub trait TestModule: Send + Sync {
    /// Unique module name
    fn name(&self) -> &str;

    /// Scheduling priority, higher runs earlier when tie-breaking
    fn priority(&self) -> i32 {
        0
    }

    /// Names of modules that must complete first
    fn dependencies(&self) -> &[String];

    /// Declared resource footprint
    fn resource_requirements(&self) -> ResourceRequirements;

    /// Duration hint, only used for phase estimates
    fn estimated_duration(&self) -> Duration;

    /// Run the module's checks
    async fn execute(&self) -> anyhow::Result<ModuleOutcome>;
}

/// CPU/memory/network footprint a module declares
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResourceRequirements {
    /// CPU share (0-100)
    #[serde(default)]
    pub cpu: f64,

    /// Memory in MB
    #[serde(default)]
    pub memory: f64,

    /// Network bandwidth in Mbps
    #[serde(default)]
    pub network: f64,

    /// Whether the module may run alongside others
    #[serde(default = "default_concurrent")]
    pub concurrent: bool,
}

fn default_concurrent() -> bool {
    true
}

impl Default for ResourceRequirements {
    fn default() -> Self {
        Self {
            cpu: 0.0,
            memory: 0.0,
            network: 0.0,
            concurrent: true,
        }
    }
}

impl ResourceRequirements {
    pub fn new(cpu: f64, memory: f64, network: f64, concurrent: bool) -> Self {
        Self {
            cpu,
            memory,
            network,
            concurrent,
        }
    }

    /// Combined CPU + memory cost used to order modules within a priority tier
    pub fn footprint(&self) -> f64 {
        self.cpu + self.memory
    }
}

/// What a module reports back from `execute`
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleOutcome {
    pub success: bool,
    pub error: Option<String>,
    pub details: Option<serde_json::Value>,
}

impl ModuleOutcome {
    pub fn success() -> Self {
        Self {
            success: true,
            error: None,
            details: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Owned snapshot of a module's declared metadata
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModuleDescriptor {
    pub name: String,
    pub priority: i32,
    pub dependencies: Vec<String>,
    pub resources: ResourceRequirements,
    pub estimated_duration: Duration,
}

impl ModuleDescriptor {
    pub fn of(module: &dyn TestModule) -> Self {
        Self {
            name: module.name().to_string(),
            priority: module.priority(),
            dependencies: module.dependencies().to_vec(),
            resources: module.resource_requirements(),
            estimated_duration: module.estimated_duration(),
        }
    }
}

impl fmt::Display for ModuleDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [priority {}, cpu {:.0}%, mem {:.0}MB, net {:.0}Mbps{}]",
            self.name,
            self.priority,
            self.resources.cpu,
            self.resources.memory,
            self.resources.network,
            if self.resources.concurrent {
                ""
            } else {
                ", exclusive"
            }
        )?;
        if !self.dependencies.is_empty() {
            write!(f, " <- {}", self.dependencies.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requirements_defaults() {
        let req: ResourceRequirements = serde_json::from_str(r#"{"cpu": 20}"#).unwrap();
        assert_eq!(req.cpu, 20.0);
        assert_eq!(req.memory, 0.0);
        assert!(req.concurrent);
        assert_eq!(req.footprint(), 20.0);
    }

    #[test]
    fn test_outcome_constructors() {
        assert!(ModuleOutcome::success().success);

        let failed = ModuleOutcome::failure("index missing");
        assert!(!failed.success);
        assert_eq!(failed.error.as_deref(), Some("index missing"));
    }
}
