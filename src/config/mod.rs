//! Configuration module
//!
//! Handles loading and managing configuration.

pub mod env;
pub mod file;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::executor::PlannerConfig;
use crate::monitor::SystemResources;
use crate::utils::LogLevel;

pub use env::EnvConfig;
pub use file::ConfigFile;

/// Application configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Strategy used when none is given on the command line
    pub default_strategy: String,

    /// Default output format
    pub format: String,

    pub log_level: LogLevel,

    /// Capacity reported by the resource monitor
    pub capacity: SystemResources,

    /// Per-phase budget of the optimized strategy
    pub planner: PlannerConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_strategy: "optimized".to_string(),
            format: "table".to_string(),
            log_level: LogLevel::Info,
            capacity: SystemResources::default(),
            planner: PlannerConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = if file::is_yaml_file(path) {
            serde_yaml::from_str(&content).context("Failed to parse YAML config")?
        } else {
            serde_json::from_str(&content).context("Failed to parse JSON config")?
        };

        Ok(config)
    }

    /// Reject limits the planner or capacity check cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.default_strategy.trim().is_empty() {
            anyhow::bail!("default_strategy must not be empty");
        }
        if self.planner.max_phase_cpu <= 0.0 || self.planner.max_phase_memory <= 0.0 {
            anyhow::bail!(
                "Planner limits must be positive (cpu={}, memory={})",
                self.planner.max_phase_cpu,
                self.planner.max_phase_memory
            );
        }
        if self.capacity.cpu_percent < 0.0
            || self.capacity.memory_mb < 0.0
            || self.capacity.network_mbps < 0.0
        {
            anyhow::bail!("System capacity must not be negative");
        }
        Ok(())
    }
}
