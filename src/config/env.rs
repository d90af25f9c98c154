//! Environment variable configuration
//!
//! Provides environment variable overrides for configuration.

use std::env;
use tracing::warn;

use super::AppConfig;
use crate::utils::LogLevel;

/// Environment variable prefix
const ENV_PREFIX: &str = "SUITE_ORCH";

/// Environment configuration from environment variables
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EnvConfig {
    /// Strategy from SUITE_ORCH_STRATEGY
    pub strategy: Option<String>,
    /// Config file from SUITE_ORCH_CONFIG
    pub config_file: Option<String>,
    /// Log level from SUITE_ORCH_LOG
    pub log: Option<String>,
    /// Output format from SUITE_ORCH_FORMAT
    pub format: Option<String>,
    /// CPU capacity from SUITE_ORCH_CPU
    pub cpu: Option<f64>,
    /// Memory capacity (MB) from SUITE_ORCH_MEMORY
    pub memory: Option<f64>,
    /// Network capacity (Mbps) from SUITE_ORCH_NETWORK
    pub network: Option<f64>,
}

impl EnvConfig {
    /// Load configuration from environment variables
    pub fn load() -> Self {
        Self {
            strategy: get_env("STRATEGY"),
            config_file: get_env("CONFIG"),
            log: get_env("LOG"),
            format: get_env("FORMAT"),
            cpu: get_env_parse("CPU"),
            memory: get_env_parse("MEMORY"),
            network: get_env_parse("NETWORK"),
        }
    }

    /// Check if any environment variables are set
    pub fn has_any(&self) -> bool {
        self.strategy.is_some()
            || self.config_file.is_some()
            || self.log.is_some()
            || self.format.is_some()
            || self.cpu.is_some()
            || self.memory.is_some()
            || self.network.is_some()
    }

    /// Overlay the variables that are set onto `config`
    pub fn apply_to(&self, config: &mut AppConfig) {
        if let Some(strategy) = &self.strategy {
            config.default_strategy = strategy.clone();
        }
        if let Some(format) = &self.format {
            config.format = format.clone();
        }
        if let Some(log) = &self.log {
            match log.parse::<LogLevel>() {
                Ok(level) => config.log_level = level,
                Err(e) => warn!("Ignoring {}_LOG: {}", ENV_PREFIX, e),
            }
        }
        if let Some(cpu) = self.cpu {
            config.capacity.cpu_percent = cpu;
        }
        if let Some(memory) = self.memory {
            config.capacity.memory_mb = memory;
        }
        if let Some(network) = self.network {
            config.capacity.network_mbps = network;
        }
    }

    /// Print current environment configuration
    pub fn print_summary(&self) {
        println!("Environment Configuration:");
        println!("  {}_STRATEGY:  {:?}", ENV_PREFIX, self.strategy);
        println!("  {}_CONFIG:    {:?}", ENV_PREFIX, self.config_file);
        println!("  {}_LOG:       {:?}", ENV_PREFIX, self.log);
        println!("  {}_FORMAT:    {:?}", ENV_PREFIX, self.format);
        println!("  {}_CPU:       {:?}", ENV_PREFIX, self.cpu);
        println!("  {}_MEMORY:    {:?}", ENV_PREFIX, self.memory);
        println!("  {}_NETWORK:   {:?}", ENV_PREFIX, self.network);
    }
}

/// Get environment variable with prefix
fn get_env(name: &str) -> Option<String> {
    env::var(format!("{ENV_PREFIX}_{name}")).ok()
}

/// Get environment variable and parse to type
fn get_env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    get_env(name).and_then(|v| v.parse().ok())
}

/// Builder for setting environment variables (useful for testing)
pub struct EnvBuilder {
    vars: Vec<(String, String)>,
}

impl EnvBuilder {
    pub fn new() -> Self {
        Self { vars: Vec::new() }
    }

    pub fn strategy(mut self, strategy: impl Into<String>) -> Self {
        self.vars.push((format!("{ENV_PREFIX}_STRATEGY"), strategy.into()));
        self
    }

    pub fn log(mut self, level: impl Into<String>) -> Self {
        self.vars.push((format!("{ENV_PREFIX}_LOG"), level.into()));
        self
    }

    pub fn cpu(mut self, cpu: f64) -> Self {
        self.vars.push((format!("{ENV_PREFIX}_CPU"), cpu.to_string()));
        self
    }

    pub fn memory(mut self, memory: f64) -> Self {
        self.vars.push((format!("{ENV_PREFIX}_MEMORY"), memory.to_string()));
        self
    }

    /// Apply environment variables
    pub fn apply(self) {
        for (key, value) in self.vars {
            env::set_var(key, value);
        }
    }

    /// Apply and return guard that restores on drop
    pub fn apply_scoped(self) -> EnvGuard {
        let previous: Vec<_> = self
            .vars
            .iter()
            .map(|(k, _)| (k.clone(), env::var(k).ok()))
            .collect();

        self.apply();

        EnvGuard { previous }
    }
}

impl Default for EnvBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Guard that restores environment variables on drop
pub struct EnvGuard {
    previous: Vec<(String, Option<String>)>,
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in &self.previous {
            match value {
                Some(v) => env::set_var(key, v),
                None => env::remove_var(key),
            }
        }
    }
}

/// Print all SUITE_ORCH environment variables
pub fn print_env_help() {
    println!("Environment Variables:");
    println!();
    println!("  {ENV_PREFIX}_STRATEGY   Default strategy (sequential, parallel, optimized, dependency-aware)");
    println!("  {ENV_PREFIX}_CONFIG     Path to configuration file");
    println!("  {ENV_PREFIX}_LOG        Log level (trace, debug, info, warn, error)");
    println!("  {ENV_PREFIX}_FORMAT     Output format (table, json, json-pretty, summary)");
    println!("  {ENV_PREFIX}_CPU        Available CPU capacity in percent");
    println!("  {ENV_PREFIX}_MEMORY     Available memory in MB");
    println!("  {ENV_PREFIX}_NETWORK    Available network bandwidth in Mbps");
    println!("  RUST_LOG              Overrides the log filter entirely");
    println!();
    println!("Example:");
    println!("  export {ENV_PREFIX}_STRATEGY=parallel");
    println!("  export {ENV_PREFIX}_CPU=200");
    println!("  suite-orchestrator run --config suite.yaml");
}
