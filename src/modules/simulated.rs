//! Simulated test modules
//!
//! Declarative modules that sleep for their estimated duration and then
//! report a configured outcome. Suites in config files are built from these.

use anyhow::bail;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::debug;

use crate::models::{ModuleOutcome, ResourceRequirements, TestModule};

/// How a simulated module finishes
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "message")]
pub enum ModuleBehavior {
    /// Report success
    #[default]
    Succeed,
    /// Report `success: false` with a message
    Fail(String),
    /// Return an error from `execute`
    Error(String),
}

/// Declarative module definition
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModuleSpec {
    pub name: String,

    #[serde(default)]
    pub priority: i32,

    #[serde(default)]
    pub dependencies: Vec<String>,

    #[serde(default)]
    pub resources: ResourceRequirements,

    #[serde(default = "default_duration_ms")]
    pub estimated_duration_ms: u64,

    #[serde(default)]
    pub behavior: ModuleBehavior,
}

fn default_duration_ms() -> u64 {
    10
}

impl ModuleSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            priority: 0,
            dependencies: Vec::new(),
            resources: ResourceRequirements::default(),
            estimated_duration_ms: default_duration_ms(),
            behavior: ModuleBehavior::Succeed,
        }
    }
}

/// Records the order in which modules start executing
#[derive(Clone, Debug, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, name: &str) {
        self.0
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(name.to_string());
    }

    /// Module names in start order
    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

/// A module driven entirely by its [`ModuleSpec`]
#[derive(Clone, Debug)]
pub struct SimulatedModule {
    spec: ModuleSpec,
    journal: Option<Journal>,
}

impl SimulatedModule {
    pub fn new(name: impl Into<String>) -> Self {
        Self::from_spec(ModuleSpec::new(name))
    }

    pub fn from_spec(spec: ModuleSpec) -> Self {
        Self {
            spec,
            journal: None,
        }
    }

    pub fn spec(&self) -> &ModuleSpec {
        &self.spec
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.spec.priority = priority;
        self
    }

    pub fn depends_on<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.spec.dependencies.extend(deps.into_iter().map(Into::into));
        self
    }

    pub fn with_resources(mut self, resources: ResourceRequirements) -> Self {
        self.spec.resources = resources;
        self
    }

    /// Set CPU share and memory, keeping network and concurrency
    pub fn with_footprint(mut self, cpu: f64, memory: f64) -> Self {
        self.spec.resources.cpu = cpu;
        self.spec.resources.memory = memory;
        self
    }

    /// Mark the module as unable to run alongside others
    pub fn exclusive(mut self) -> Self {
        self.spec.resources.concurrent = false;
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.spec.estimated_duration_ms = duration.as_millis() as u64;
        self
    }

    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.spec.behavior = ModuleBehavior::Fail(message.into());
        self
    }

    pub fn erroring(mut self, message: impl Into<String>) -> Self {
        self.spec.behavior = ModuleBehavior::Error(message.into());
        self
    }

    pub fn with_journal(mut self, journal: Journal) -> Self {
        self.journal = Some(journal);
        self
    }
}

#[async_trait]
impl TestModule for SimulatedModule {
    fn name(&self) -> &str {
        &self.spec.name
    }

    fn priority(&self) -> i32 {
        self.spec.priority
    }

    fn dependencies(&self) -> &[String] {
        &self.spec.dependencies
    }

    fn resource_requirements(&self) -> ResourceRequirements {
        self.spec.resources
    }

    fn estimated_duration(&self) -> Duration {
        Duration::from_millis(self.spec.estimated_duration_ms)
    }

    async fn execute(&self) -> anyhow::Result<ModuleOutcome> {
        if let Some(journal) = &self.journal {
            journal.push(&self.spec.name);
        }
        debug!("Simulating {} for {}ms", self.spec.name, self.spec.estimated_duration_ms);

        tokio::time::sleep(self.estimated_duration()).await;

        let details = serde_json::json!({
            "simulated": true,
            "duration_ms": self.spec.estimated_duration_ms,
        });

        match &self.spec.behavior {
            ModuleBehavior::Succeed => Ok(ModuleOutcome::success().with_details(details)),
            ModuleBehavior::Fail(message) => {
                Ok(ModuleOutcome::failure(message.clone()).with_details(details))
            }
            ModuleBehavior::Error(message) => bail!("{}", message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_from_yaml() {
        let yaml = r#"
name: chat-load
priority: 5
dependencies: [auth]
resources:
  cpu: 40
  memory: 2048
  concurrent: false
estimated_duration_ms: 250
behavior:
  kind: fail
  message: socket closed
"#;
        let spec: ModuleSpec = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(spec.name, "chat-load");
        assert_eq!(spec.priority, 5);
        assert_eq!(spec.dependencies, vec!["auth".to_string()]);
        assert!(!spec.resources.concurrent);
        assert_eq!(spec.behavior, ModuleBehavior::Fail("socket closed".to_string()));
    }

    #[test]
    fn test_spec_defaults() {
        let spec: ModuleSpec = serde_yaml::from_str("name: probe").unwrap();
        assert_eq!(spec.priority, 0);
        assert!(spec.dependencies.is_empty());
        assert!(spec.resources.concurrent);
        assert_eq!(spec.behavior, ModuleBehavior::Succeed);
    }

    #[tokio::test]
    async fn test_execute_behaviors() {
        let ok = SimulatedModule::new("ok").with_duration(Duration::from_millis(1));
        assert!(ok.execute().await.unwrap().success);

        let failed = SimulatedModule::new("bad")
            .with_duration(Duration::from_millis(1))
            .failing("assertion failed");
        let outcome = failed.execute().await.unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.error.as_deref(), Some("assertion failed"));

        let errored = SimulatedModule::new("boom")
            .with_duration(Duration::from_millis(1))
            .erroring("connection refused");
        let err = errored.execute().await.unwrap_err();
        assert_eq!(err.to_string(), "connection refused");
    }

    #[tokio::test]
    async fn test_journal_records_start_order() {
        let journal = Journal::new();
        let a = SimulatedModule::new("a")
            .with_duration(Duration::from_millis(1))
            .with_journal(journal.clone());
        let b = SimulatedModule::new("b")
            .with_duration(Duration::from_millis(1))
            .with_journal(journal.clone());

        b.execute().await.unwrap();
        a.execute().await.unwrap();
        assert_eq!(journal.entries(), vec!["b", "a"]);
    }
}
