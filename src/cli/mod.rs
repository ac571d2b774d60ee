//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for deal-etl using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// deal-etl - HubSpot CRM deals extraction
#[derive(Parser, Debug)]
#[command(name = "deal-etl")]
#[command(version, about, long_about = None)]
#[command(author = "Deal ETL Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "deal-etl.toml", env = "DEAL_ETL_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "DEAL_ETL_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract deals from HubSpot into a JSON-lines file
    Extract(commands::extract::ExtractArgs),

    /// Check credentials and API access
    Check(commands::check::CheckArgs),

    /// Show stored checkpoints
    Status(commands::status::StatusArgs),

    /// Ask a running scan to pause after the current record
    Pause(commands::signal::SignalArgs),

    /// Ask a running scan to stop for good
    Cancel(commands::signal::SignalArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_extract() {
        let cli = Cli::parse_from(["deal-etl", "extract"]);
        assert_eq!(cli.config, "deal-etl.toml");
        assert!(matches!(cli.command, Commands::Extract(_)));
    }

    #[test]
    fn test_cli_parse_extract_with_options() {
        let cli = Cli::parse_from([
            "deal-etl",
            "extract",
            "--scan-id",
            "nightly",
            "--resume",
            "--deal-stage",
            "closedwon",
            "--deal-stage",
            "contractsent",
            "--output",
            "out/deals.jsonl",
        ]);
        let Commands::Extract(args) = cli.command else {
            panic!("expected extract");
        };
        assert_eq!(args.scan_id.as_ref().map(|s| s.as_str()), Some("nightly"));
        assert!(args.resume);
        assert_eq!(args.deal_stage, vec!["closedwon", "contractsent"]);
        assert_eq!(args.output.as_deref(), Some("out/deals.jsonl"));
    }

    #[test]
    fn test_cli_rejects_invalid_scan_id() {
        let result = Cli::try_parse_from(["deal-etl", "pause", "--scan-id", "a/b"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_parse_with_config() {
        let cli = Cli::parse_from(["deal-etl", "--config", "custom.toml", "check"]);
        assert_eq!(cli.config, "custom.toml");
        assert!(matches!(cli.command, Commands::Check(_)));
    }

    #[test]
    fn test_cli_parse_with_log_level() {
        let cli = Cli::parse_from(["deal-etl", "--log-level", "debug", "status"]);
        assert_eq!(cli.log_level, Some("debug".to_string()));
        assert!(matches!(cli.command, Commands::Status(_)));
    }

    #[test]
    fn test_cli_parse_pause_and_cancel() {
        let cli = Cli::parse_from(["deal-etl", "pause", "--scan-id", "s1"]);
        assert!(matches!(cli.command, Commands::Pause(_)));

        let cli = Cli::parse_from(["deal-etl", "cancel", "--scan-id", "s1"]);
        assert!(matches!(cli.command, Commands::Cancel(_)));
    }

    #[test]
    fn test_cli_parse_validate_config() {
        let cli = Cli::parse_from(["deal-etl", "validate-config"]);
        assert!(matches!(cli.command, Commands::ValidateConfig(_)));
    }

    #[test]
    fn test_cli_parse_init() {
        let cli = Cli::parse_from(["deal-etl", "init"]);
        assert!(matches!(cli.command, Commands::Init(_)));
    }
}
