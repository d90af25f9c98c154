//! Configuration file management
//!
//! A config file carries the application settings plus the suite of
//! simulated modules to orchestrate.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::AppConfig;
use crate::models::ResourceRequirements;
use crate::modules::{ModuleBehavior, ModuleSpec, SimulatedModule};
use crate::Orchestrator;

/// Configuration file locations (in order of precedence)
const CONFIG_LOCATIONS: &[&str] = &[
    "./suite-orchestrator.yaml",
    "./suite-orchestrator.yml",
    "./.suite-orchestrator.yaml",
    "~/.config/suite-orchestrator/config.yaml",
];

const SUPPORTED_VERSIONS: &[&str] = &["1.0"];

/// Full configuration file structure
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Version of config file format
    #[serde(default = "default_version")]
    pub version: String,

    /// Application settings
    #[serde(default)]
    pub app: AppConfig,

    /// Modules making up the suite
    #[serde(default)]
    pub modules: Vec<ModuleSpec>,
}

fn default_version() -> String {
    "1.0".to_string()
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            version: default_version(),
            app: AppConfig::default(),
            modules: Vec::new(),
        }
    }
}

impl ConfigFile {
    /// Find configuration file in standard locations
    pub fn find() -> Option<PathBuf> {
        CONFIG_LOCATIONS
            .iter()
            .map(|location| expand_path(location))
            .find(|path| path.exists())
    }

    /// Load configuration from default location
    pub fn load_default() -> Result<Self> {
        match Self::find() {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = if is_yaml_file(path) {
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display()))?
        } else {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display()))?
        };

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = if is_yaml_file(path) {
            serde_yaml::to_string(self).context("Failed to serialize config")?
        } else {
            serde_json::to_string_pretty(self).context("Failed to serialize config")?
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !SUPPORTED_VERSIONS.contains(&self.version.as_str()) {
            anyhow::bail!("Unsupported config version: {}", self.version);
        }

        self.app.validate()?;

        let mut seen = HashSet::new();
        for module in &self.modules {
            if module.name.trim().is_empty() {
                anyhow::bail!("Module names must not be empty");
            }
            if !seen.insert(module.name.as_str()) {
                anyhow::bail!("Duplicate module name '{}'", module.name);
            }
            let r = &module.resources;
            if r.cpu < 0.0 || r.memory < 0.0 || r.network < 0.0 {
                anyhow::bail!(
                    "Module '{}' declares negative resource requirements",
                    module.name
                );
            }
        }

        Ok(())
    }

    /// Build an orchestrator with every module of this file registered
    pub fn orchestrator(&self) -> Orchestrator {
        let mut orchestrator = Orchestrator::from_config(&self.app);
        for spec in &self.modules {
            orchestrator.register_module(Arc::new(SimulatedModule::from_spec(spec.clone())));
        }
        orchestrator
    }

    /// Generate example configuration
    pub fn example() -> Self {
        let module = |name: &str, priority: i32, deps: &[&str], cpu: f64, memory: f64| ModuleSpec {
            name: name.to_string(),
            priority,
            dependencies: deps.iter().map(|d| d.to_string()).collect(),
            resources: ResourceRequirements::new(cpu, memory, 10.0, true),
            estimated_duration_ms: 200,
            behavior: ModuleBehavior::Succeed,
        };

        let mut chat = module("chat-load", 1, &["bedrock"], 60.0, 2048.0);
        chat.resources.concurrent = false;
        chat.resources.network = 50.0;
        chat.estimated_duration_ms = 500;

        Self {
            version: default_version(),
            app: AppConfig::default(),
            modules: vec![
                module("bedrock", 10, &[], 20.0, 512.0),
                module("opensearch", 10, &[], 25.0, 1024.0),
                module("ui", 5, &["bedrock", "opensearch"], 30.0, 2048.0),
                chat,
            ],
        }
    }
}

/// Expand ~ to home directory
fn expand_path(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

/// Check if file is YAML based on extension
pub(crate) fn is_yaml_file(path: &Path) -> bool {
    path.extension()
        .map(|e| e == "yaml" || e == "yml")
        .unwrap_or(false)
}
