//! CLI command definitions and argument parsing.

use crate::output::OutputFormat;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Sift - collect forum threads and summarize them with an LLM.
#[derive(Debug, Parser)]
#[command(name = "sift")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(
        short,
        long,
        global = true,
        env = "SIFT_CONFIG",
        default_value = crate::config::DEFAULT_CONFIG_PATH
    )]
    pub config: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, global = true, default_value_t = CliFormat::Table)]
    pub format: CliFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
}

impl From<CliFormat> for OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => OutputFormat::Table,
            CliFormat::Json => OutputFormat::Json,
        }
    }
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Collect, store and summarize once
    Run,

    /// Run periodically until Ctrl+C
    Watch(WatchArgs),

    /// Show stored data and the latest report
    Dashboard(DashboardArgs),

    /// Validate the configuration and print the effective values
    CheckConfig,
}

/// Arguments for the watch command.
#[derive(Debug, Parser)]
pub struct WatchArgs {
    /// Minutes between runs (overrides runtime.interval_minutes)
    #[arg(short, long)]
    pub interval_minutes: Option<u64>,
}

/// Arguments for the dashboard command.
#[derive(Debug, Parser)]
pub struct DashboardArgs {
    /// Number of recent threads to list
    #[arg(short, long, default_value_t = 10)]
    pub limit: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_with_defaults() {
        let cli = Cli::try_parse_from(["sift", "run"]).unwrap();
        assert!(matches!(cli.command, Command::Run));
        assert_eq!(cli.format, CliFormat::Table);
        assert!(!cli.no_color);
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "sift", "dashboard", "--limit", "5", "--format", "json", "--config", "my.toml",
        ])
        .unwrap();
        assert_eq!(cli.config, PathBuf::from("my.toml"));
        assert_eq!(cli.format, CliFormat::Json);
        match cli.command {
            Command::Dashboard(args) => assert_eq!(args.limit, 5),
            other => panic!("Unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_watch_interval() {
        let cli = Cli::try_parse_from(["sift", "watch", "--interval-minutes", "30"]).unwrap();
        match cli.command {
            Command::Watch(args) => assert_eq!(args.interval_minutes, Some(30)),
            other => panic!("Unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["sift"]).is_err());
    }
}
