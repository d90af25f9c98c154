//! CLI argument parsing
//!
//! Defines command-line interface using clap.

use clap::{Parser, Subcommand};

/// Dependency- and resource-aware test suite orchestrator
#[derive(Parser, Debug)]
#[command(name = "suite-orchestrator")]
#[command(author = "hephaex@gmail.com")]
#[command(version = "0.1.0")]
#[command(about = "Plan and run test suites under dependency and resource constraints")]
#[command(long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable ANSI colours in table output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the configured suite
    Run(RunArgs),

    /// Print the phases the optimized strategy would run
    Plan(PlanArgs),

    /// List available execution strategies
    Strategies,

    /// Manage configuration
    Config(ConfigArgs),
}

/// Arguments for run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Suite configuration file (YAML or JSON)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Execution strategy (sequential, parallel, optimized, dependency-aware)
    #[arg(short, long)]
    pub strategy: Option<String>,

    /// Output format (table, json, json-pretty, summary)
    #[arg(short, long)]
    pub format: Option<String>,
}

/// Arguments for plan command
#[derive(Parser, Debug)]
pub struct PlanArgs {
    /// Suite configuration file (YAML or JSON)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Output format (table, json, json-pretty, summary)
    #[arg(short, long)]
    pub format: Option<String>,
}

/// Arguments for config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show {
        /// Configuration file to show instead of the default location
        #[arg(short, long)]
        config: Option<String>,

        /// Output format (yaml, json)
        #[arg(short, long, default_value = "yaml")]
        format: String,
    },

    /// Write an example configuration file
    Init {
        /// Output file path
        #[arg(short, long, default_value = "./suite-orchestrator.yaml")]
        output: String,

        /// Overwrite existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Validate a configuration file
    Validate {
        /// Configuration file to validate
        #[arg(short = 'c', long)]
        file: Option<String>,
    },

    /// List supported environment variables
    Env,
}
