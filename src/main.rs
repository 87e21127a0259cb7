//! stepwise - declarative integration test runner
//!
//! Runs YAML test suites. Each suite holds test cases, each case an ordered
//! list of steps; a step invokes an executor (`exec`, `http`, `readfile`) and
//! checks its result with assertions, with optional retry, delay and timeout.
//!
//! ## Usage
//!
//! ```bash
//! # Run every *.yml suite in a directory, two suites at a time
//! stepwise run tests/ --parallel 2
//!
//! # Run a glob of suites with aliases, write a JSON report
//! stepwise run 'suites/**/*.yml' --alias HOST:localhost --output report.json
//!
//! # List discovered suites
//! stepwise list tests/
//!
//! # Print the suite file JSON schema
//! stepwise schema
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info, warn};

mod assertions;
mod cli;
mod config;
mod discovery;
mod engine;
mod executors;
mod models;
mod output;
mod utils;

use cli::{Args, Command};
use config::{AppConfig, EnvConfig};
use engine::Orchestrator;
use models::TestSuite;
use output::ReportFormatter;
use utils::init_logger;

/// Exit status of a run with at least one failing case
const EXIT_KO: i32 = 2;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let env = EnvConfig::load();
    let mut config = match args.config.as_ref().or(env.config_file.as_ref()) {
        Some(path) => AppConfig::load(config::expand_path(path))?,
        None => config::load_default()?,
    };
    env.apply(&mut config);
    if let Some(level) = &args.log_level {
        config.log_level = level.clone();
    }

    config.validate()?;
    init_logger(config.log_level());
    debug!(env_overrides = env.has_any(), "configuration loaded");

    match args.command {
        Command::Run(run_args) => {
            let ok = run_suites(run_args, config).await?;
            if !ok {
                std::process::exit(EXIT_KO);
            }
        }
        Command::List(list_args) => {
            list_suites(list_args).await?;
        }
        Command::Schema => {
            print_schema()?;
        }
    }

    Ok(())
}

/// Run suites and print the report; returns whether every case passed
async fn run_suites(args: cli::RunArgs, mut config: AppConfig) -> Result<bool> {
    if let Some(parallel) = args.parallel {
        config.parallel = parallel;
    }
    if let Some(details) = args.details {
        config.details = details;
    }
    if let Some(format) = args.format {
        config.format = format;
    }
    if let Some(timeout) = args.timeout {
        config.default_timeout_secs = timeout;
    }
    if args.delay_first_retry {
        config.delay_first_retry = true;
    }
    config.aliases.extend(args.aliases);
    config.validate()?;

    info!(
        "Running suites from {} ({} at a time)",
        args.path, config.parallel
    );

    let tests = Orchestrator::new(config.run_settings())
        .process(&args.path, &config.aliases)
        .await?;

    let formatter = ReportFormatter::new(config.output_format()).with_details(config.details_level());
    println!("{}", formatter.format(&tests)?);

    if let Some(output) = &args.output {
        ReportFormatter::write_report(&tests, output)?;
        info!("Report written to {}", output);
    }

    Ok(tests.is_ok())
}

async fn list_suites(args: cli::ListArgs) -> Result<()> {
    let files = discovery::discover(&args.path)
        .with_context(|| format!("Failed to discover suites in {}", args.path))?;

    println!("\nSuites in {} ({} file(s))\n", args.path, files.len());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    for file in files {
        match discovery::load_suite(&file).await {
            Ok(suite) => println!(
                "  {} {:3} cases {:3} steps {:3} skipped  {}",
                output::right_pad(&suite.package, output::PACKAGE_WIDTH),
                suite.total,
                suite.step_count(),
                suite.skipped,
                suite.name
            ),
            Err(err) => {
                warn!("{}", err);
                println!(
                    "  {} unreadable",
                    output::right_pad(&file.display().to_string(), output::PACKAGE_WIDTH)
                );
            }
        }
    }

    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
    Ok(())
}

fn print_schema() -> Result<()> {
    let schema = schemars::schema_for!(TestSuite);
    let rendered = serde_json::to_string_pretty(&schema).context("Failed to render schema")?;
    println!("{rendered}");
    Ok(())
}
