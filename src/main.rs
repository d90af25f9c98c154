//! Suite Orchestrator - test suite execution planner and runner
//!
//! A CLI tool that loads a suite of test modules from a configuration file
//! and runs them under a chosen execution strategy.
//!
//! ## Usage
//!
//! ```bash
//! # Write an example suite
//! suite-orchestrator config init
//!
//! # Run it with the default (optimized) strategy
//! suite-orchestrator run
//!
//! # Run a specific file with another strategy
//! suite-orchestrator run --config suite.yaml --strategy dependency-aware
//!
//! # Show the planned phases
//! suite-orchestrator plan --config suite.yaml
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::io::IsTerminal;
use std::path::Path;
use tracing::{debug, info};

mod cli;

use cli::Args;
use suite_orchestrator::config::{env, ConfigFile, EnvConfig};
use suite_orchestrator::output::{OutputFormat, ResultFormatter};
use suite_orchestrator::utils::{init_logger, LogLevel};
use suite_orchestrator::StrategyKind;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let env_config = EnvConfig::load();

    let mut log_level = env_config
        .log
        .as_deref()
        .and_then(|l| l.parse().ok())
        .unwrap_or(LogLevel::Info);
    if args.verbose {
        log_level = LogLevel::Debug;
    }
    init_logger(log_level);

    if env_config.has_any() {
        debug!("Environment overrides: {:?}", env_config);
    }

    let colorize = !args.no_color && std::io::stdout().is_terminal();

    match args.command {
        cli::Command::Run(run_args) => {
            let success = run_suite(run_args, &env_config, colorize).await?;
            if !success {
                std::process::exit(1);
            }
        }
        cli::Command::Plan(plan_args) => {
            show_plan(plan_args, &env_config, colorize)?;
        }
        cli::Command::Strategies => {
            list_strategies();
        }
        cli::Command::Config(config_args) => {
            manage_config(config_args, &env_config)?;
        }
    }

    Ok(())
}

/// Load the suite from `--config`, `SUITE_ORCH_CONFIG` or the default
/// locations, then apply environment overrides.
fn load_suite(path: Option<&str>, env_config: &EnvConfig) -> Result<ConfigFile> {
    let mut config = match path.or(env_config.config_file.as_deref()) {
        Some(path) => ConfigFile::load(path)?,
        None => ConfigFile::load_default()?,
    };
    env_config.apply_to(&mut config.app);
    config.app.validate()?;
    Ok(config)
}

fn formatter_for(format: &str, colorize: bool) -> Result<ResultFormatter> {
    let format: OutputFormat = format.parse().map_err(anyhow::Error::msg)?;
    let formatter = ResultFormatter::new(format);
    Ok(if colorize {
        formatter
    } else {
        formatter.no_color()
    })
}

async fn run_suite(args: cli::RunArgs, env_config: &EnvConfig, colorize: bool) -> Result<bool> {
    let config = load_suite(args.config.as_deref(), env_config)?;

    let strategy = args
        .strategy
        .unwrap_or_else(|| config.app.default_strategy.clone());
    let strategy: StrategyKind = strategy.parse()?;
    let formatter = formatter_for(args.format.as_deref().unwrap_or(&config.app.format), colorize)?;

    if config.modules.is_empty() {
        println!("No modules configured. Create a suite with: suite-orchestrator config init");
        return Ok(true);
    }

    info!(
        "Running {} modules with the {} strategy",
        config.modules.len(),
        strategy
    );

    let orchestrator = config.orchestrator();
    let result = orchestrator
        .execute(strategy.key())
        .await
        .with_context(|| format!("{strategy} execution failed"))?;

    println!("{}", formatter.format_result(&result));
    Ok(result.success)
}

fn show_plan(args: cli::PlanArgs, env_config: &EnvConfig, colorize: bool) -> Result<()> {
    let config = load_suite(args.config.as_deref(), env_config)?;
    let formatter = formatter_for(args.format.as_deref().unwrap_or(&config.app.format), colorize)?;

    let phases = config.orchestrator().plan()?;
    println!("{}", formatter.format_plan(&phases));
    Ok(())
}

fn list_strategies() {
    let strategies: Vec<_> = StrategyKind::all()
        .iter()
        .map(|kind| kind.build(Default::default()))
        .collect();
    let pairs: Vec<(&str, &str)> = strategies
        .iter()
        .map(|s| (s.name(), s.description()))
        .collect();

    println!("\nExecution Strategies\n");
    print!("{}", ResultFormatter::default().format_strategies(&pairs));
    println!();
}

fn manage_config(args: cli::ConfigArgs, env_config: &EnvConfig) -> Result<()> {
    match args.action {
        cli::ConfigAction::Init { output, force } => {
            let path = Path::new(&output);
            if path.exists() && !force {
                anyhow::bail!(
                    "Configuration file already exists: {output}. Use --force to overwrite."
                );
            }

            ConfigFile::example().save(path)?;
            println!("✓ Configuration file created: {output}");
            println!("\nEdit the file to describe your suite.");
        }

        cli::ConfigAction::Show { config, format } => {
            let config = load_suite(config.as_deref(), env_config)?;
            let output = if format == "json" {
                serde_json::to_string_pretty(&config)?
            } else {
                serde_yaml::to_string(&config)?
            };
            println!("{output}");
        }

        cli::ConfigAction::Validate { file } => {
            let path = file
                .or_else(|| ConfigFile::find().map(|p| p.to_string_lossy().to_string()))
                .unwrap_or_else(|| "./suite-orchestrator.yaml".to_string());

            match ConfigFile::load(&path) {
                Ok(config) => {
                    println!(
                        "✓ Configuration file is valid: {path} ({} modules)",
                        config.modules.len()
                    );
                }
                Err(e) => {
                    println!("✗ Configuration file is invalid: {path}");
                    println!("  Error: {e:#}");
                    return Err(e);
                }
            }
        }

        cli::ConfigAction::Env => {
            env::print_env_help();
            println!();
            env_config.print_summary();
        }
    }

    Ok(())
}
