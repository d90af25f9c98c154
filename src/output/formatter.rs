//! Output formatters for run results
//!
//! Provides JSON, Table, and summary output formats.

use serde::Serialize;
use std::str::FromStr;

use crate::executor::ExecutionPhase;
use crate::models::{ExecutionResult, ModuleResult};

/// Output format options
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    JsonPretty,
    Summary,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "json-pretty" | "jsonpretty" => Ok(OutputFormat::JsonPretty),
            "summary" => Ok(OutputFormat::Summary),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}

/// Result formatter
pub struct ResultFormatter {
    format: OutputFormat,
    colorize: bool,
}

impl ResultFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            colorize: true,
        }
    }

    pub fn no_color(mut self) -> Self {
        self.colorize = false;
        self
    }

    fn to_json<T: Serialize + ?Sized>(&self, value: &T) -> String {
        let rendered = if self.format == OutputFormat::JsonPretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        rendered.unwrap_or_else(|e| format!("{{\"error\":\"{e}\"}}"))
    }

    fn status(&self, result: &ModuleResult) -> &'static str {
        match (result.success, self.colorize) {
            (true, true) => "\x1b[32m✓ PASS\x1b[0m",
            (false, true) => "\x1b[31m✗ FAIL\x1b[0m",
            (true, false) => "✓ PASS",
            (false, false) => "✗ FAIL",
        }
    }

    /// Format a whole run
    pub fn format_result(&self, result: &ExecutionResult) -> String {
        match self.format {
            OutputFormat::Table => self.format_result_table(result),
            OutputFormat::Json | OutputFormat::JsonPretty => self.to_json(result),
            OutputFormat::Summary => self.format_result_brief(result),
        }
    }

    fn format_result_table(&self, result: &ExecutionResult) -> String {
        let mut output = String::new();

        output.push_str("\n╔══════════════════════════════════════════════════════════════╗\n");
        output.push_str(&format!("║  Strategy: {:50}║\n", result.strategy));
        output.push_str("╠══════════════════════════════════════════════════════════════╣\n");

        for module in &result.modules {
            output.push_str(&format!(
                "║  {:24} {} [{:>6}ms] x{:<2}\n",
                module.module,
                self.status(module),
                module.duration.as_millis(),
                module.resource_usage.concurrent_tests
            ));
            if let Some(error) = &module.error {
                output.push_str(&format!("║      └ {error}\n"));
            }
        }

        output.push_str("╠══════════════════════════════════════════════════════════════╣\n");
        output.push_str(&format!(
            "║  Total: {:2} | Pass: {:2} | Fail: {:2} | Duration: {:6}ms\n",
            result.len(),
            result.passed(),
            result.failed(),
            result.total_duration.as_millis()
        ));
        output.push_str(&format!(
            "║  Peak CPU: {:.0}% | Peak Memory: {:.0}MB | Network: {:.1}Mbps\n",
            result.resource_usage.peak_cpu,
            result.resource_usage.peak_memory,
            result.resource_usage.network_traffic
        ));

        if let Some(metrics) = &result.optimization_metrics {
            output.push_str(&format!(
                "║  Parallel: {:.0}% | Efficiency: {:.0}% | Time saved: {:.0}%\n",
                metrics.parallelization_ratio * 100.0,
                metrics.resource_efficiency * 100.0,
                metrics.time_optimization * 100.0
            ));
        }

        output.push_str("╚══════════════════════════════════════════════════════════════╝\n");
        output
    }

    fn format_result_brief(&self, result: &ExecutionResult) -> String {
        format!(
            "{} {}: {}/{} passed ({:.1}%) in {}ms",
            if result.success { "✓" } else { "✗" },
            result.strategy,
            result.passed(),
            result.len(),
            result.pass_rate(),
            result.total_duration.as_millis()
        )
    }

    /// Format the phases planned by the optimized strategy
    pub fn format_plan(&self, phases: &[ExecutionPhase]) -> String {
        match self.format {
            OutputFormat::Json | OutputFormat::JsonPretty => {
                #[derive(Serialize)]
                struct PhaseJson<'a> {
                    id: usize,
                    parallel: bool,
                    modules: Vec<&'a str>,
                    estimated_duration_ms: u128,
                    cpu: f64,
                    memory: f64,
                }

                let json: Vec<PhaseJson<'_>> = phases
                    .iter()
                    .map(|phase| PhaseJson {
                        id: phase.id,
                        parallel: phase.parallel,
                        modules: phase.module_names(),
                        estimated_duration_ms: phase.estimated_duration.as_millis(),
                        cpu: phase.total_cpu(),
                        memory: phase.total_memory(),
                    })
                    .collect();
                self.to_json(&json)
            }
            OutputFormat::Summary => {
                let estimate: u128 = phases
                    .iter()
                    .map(|p| p.estimated_duration.as_millis())
                    .sum();
                format!("{} phase(s), ~{}ms", phases.len(), estimate)
            }
            OutputFormat::Table => {
                let mut output = String::from("\nExecution plan\n");
                output.push_str("──────────────────────────────────────────────────────────────\n");
                for phase in phases {
                    output.push_str(&format!("  {phase}\n"));
                }
                output.push_str("──────────────────────────────────────────────────────────────\n");
                output
            }
        }
    }

    /// Format `(key, description)` pairs of registered strategies
    pub fn format_strategies(&self, strategies: &[(&str, &str)]) -> String {
        match self.format {
            OutputFormat::Json | OutputFormat::JsonPretty => {
                #[derive(Serialize)]
                struct StrategyJson<'a> {
                    name: &'a str,
                    description: &'a str,
                }

                let json: Vec<_> = strategies
                    .iter()
                    .map(|&(name, description)| StrategyJson { name, description })
                    .collect();
                self.to_json(&json)
            }
            _ => strategies
                .iter()
                .map(|&(name, description)| format!("  {name:18} {description}\n"))
                .collect(),
        }
    }
}

impl Default for ResultFormatter {
    fn default() -> Self {
        Self::new(OutputFormat::Table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::PhasePlanner;
    use crate::models::{ModuleRef, ResourceUsage};
    use crate::modules::SimulatedModule;
    use chrono::Utc;
    use std::sync::Arc;
    use std::time::Duration;

    fn sample() -> ExecutionResult {
        let now = Utc::now();
        let modules = vec![
            ModuleResult::new("api", true, now, now, Duration::from_millis(40)),
            ModuleResult::new("ui", false, now, now, Duration::from_millis(10))
                .with_error("selector not found"),
        ];
        ExecutionResult::new(
            "sequential",
            modules,
            Duration::from_millis(50),
            ResourceUsage::default(),
        )
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("json".parse(), Ok(OutputFormat::Json));
        assert_eq!("TABLE".parse(), Ok(OutputFormat::Table));
        assert!("csv".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_format_result_table() {
        let output = ResultFormatter::new(OutputFormat::Table)
            .no_color()
            .format_result(&sample());
        assert!(output.contains("Strategy: sequential"));
        assert!(output.contains("✗ FAIL"));
        assert!(output.contains("selector not found"));
    }

    #[test]
    fn test_format_result_summary() {
        let output = ResultFormatter::new(OutputFormat::Summary).format_result(&sample());
        assert_eq!(output, "✗ sequential: 1/2 passed (50.0%) in 50ms");
    }

    #[test]
    fn test_format_result_json() {
        let output = ResultFormatter::new(OutputFormat::Json).format_result(&sample());
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["strategy"], "sequential");
        assert_eq!(value["success"], false);
        assert_eq!(value["modules"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_format_plan_json() {
        let modules: Vec<ModuleRef> = vec![
            Arc::new(SimulatedModule::new("a").with_footprint(20.0, 512.0)),
            Arc::new(SimulatedModule::new("b").with_footprint(20.0, 512.0)),
        ];
        let phases = PhasePlanner::default().plan(&modules);

        let output = ResultFormatter::new(OutputFormat::Json).format_plan(&phases);
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value[0]["modules"], serde_json::json!(["a", "b"]));
        assert_eq!(value[0]["parallel"], true);
    }

    #[test]
    fn test_format_strategies() {
        let output = ResultFormatter::new(OutputFormat::Table)
            .format_strategies(&[("sequential", "One module at a time")]);
        assert!(output.contains("sequential"));
        assert!(output.contains("One module at a time"));
    }
}
