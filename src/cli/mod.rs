//! CLI argument parsing
//!
//! Defines command-line interface using clap.

use clap::{Parser, Subcommand};

/// Declarative integration test runner
#[derive(Parser, Debug)]
#[command(name = "stepwise")]
#[command(version)]
#[command(about = "Run YAML test suites made of executor steps and assertions")]
#[command(long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Configuration file, instead of the standard locations
    #[arg(short, long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the suites found at a path
    Run(RunArgs),

    /// List discovered suites with their case and step counts
    List(ListArgs),

    /// Print the JSON schema of the suite file format
    Schema,
}

/// Arguments for run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Suite directory, file or glob pattern
    #[arg(default_value = ".")]
    pub path: String,

    /// Alias as name:value, repeatable
    #[arg(short, long = "alias", value_name = "NAME:VALUE")]
    pub aliases: Vec<String>,

    /// Suites executing at once
    #[arg(short, long)]
    pub parallel: Option<usize>,

    /// Progress detail (low, medium, high)
    #[arg(short, long)]
    pub details: Option<String>,

    /// Report format (table, json, json-pretty, yaml, csv)
    #[arg(short, long)]
    pub format: Option<String>,

    /// Also write the report to this file, format taken from the extension
    #[arg(short, long)]
    pub output: Option<String>,

    /// Default per-attempt timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Wait the step delay before the first retry too
    #[arg(long)]
    pub delay_first_retry: bool,
}

/// Arguments for list command
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Suite directory, file or glob pattern
    #[arg(default_value = ".")]
    pub path: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_args() {
        let args = Args::parse_from([
            "stepwise",
            "run",
            "suites/*.yml",
            "--alias",
            "HOST:localhost",
            "-a",
            "URL:http://x:80",
            "--parallel",
            "4",
            "--details",
            "low",
            "--delay-first-retry",
        ]);
        match args.command {
            Command::Run(run) => {
                assert_eq!(run.path, "suites/*.yml");
                assert_eq!(run.aliases, vec!["HOST:localhost", "URL:http://x:80"]);
                assert_eq!(run.parallel, Some(4));
                assert_eq!(run.details.as_deref(), Some("low"));
                assert!(run.delay_first_retry);
                assert!(run.output.is_none());
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_global_flags_and_defaults() {
        let args = Args::parse_from(["stepwise", "list", "--log-level", "debug"]);
        assert_eq!(args.log_level.as_deref(), Some("debug"));
        match args.command {
            Command::List(list) => assert_eq!(list.path, "."),
            _ => panic!("Expected List command"),
        }
    }

    #[test]
    fn test_schema_command() {
        let args = Args::parse_from(["stepwise", "schema"]);
        assert!(matches!(args.command, Command::Schema));
    }
}
