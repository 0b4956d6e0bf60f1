//! CLI command definitions and handlers

use std::path::PathBuf;

use clap::{Parser, Subcommand};
pub use clap_complete::Shell;

pub mod args;
pub mod context;
pub mod init;
pub mod progress;
pub mod report;
pub mod scan;
pub mod screenshot;
pub mod status;

pub use args::OutputFormat;
pub use context::CommandContext;

/// Default number of targets scanned at once
pub const DEFAULT_CONCURRENCY: u64 = 4;

/// sandop - submit URLs to the sandbox scanner and collect the reports
#[derive(Parser, Debug)]
#[command(name = "sandop")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (pretty, table, json)
    #[arg(
        long,
        global = true,
        env = "SANDOP_FORMAT",
        default_value = "pretty",
        hide_env = true,
        hide_possible_values = true
    )]
    pub format: OutputFormat,

    /// Override config file location
    #[arg(long, global = true, env = "SANDOP_CONFIG", hide_env = true)]
    pub config: Option<String>,

    /// Use a named profile instead of the active one
    #[arg(long, global = true, env = "SANDOP_PROFILE", hide_env = true)]
    pub profile: Option<String>,

    /// API key (overrides the profile)
    #[arg(
        long,
        global = true,
        env = "SANDOP_API_KEY",
        hide_env = true,
        hide_env_values = true
    )]
    pub api_key: Option<String>,

    /// API base URL (overrides the profile)
    #[arg(long, global = true, env = "SANDOP_API_HOST", hide_env = true)]
    pub api_host: Option<String>,

    /// Talk to a self-hosted sandbox on localhost:5000
    #[arg(long, global = true, conflicts_with = "api_host")]
    pub local: bool,

    /// Delay between report polls in milliseconds [default: 1000]
    #[arg(long, global = true, env = "SANDOP_POLL_INTERVAL_MS", hide_env = true)]
    pub poll_interval_ms: Option<u64>,

    /// Report polls before giving up [default: 62]
    #[arg(
        long,
        global = true,
        env = "SANDOP_MAX_ATTEMPTS",
        hide_env = true,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub max_attempts: Option<u32>,

    /// Per-request timeout in seconds [default: 30]
    #[arg(
        long,
        global = true,
        env = "SANDOP_REQUEST_TIMEOUT",
        hide_env = true,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub request_timeout: Option<u64>,

    /// Enable debug logging
    #[arg(long, global = true, env = "SANDOP_DEBUG", hide_env = true)]
    pub debug: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize sandop configuration
    Init,

    /// Show configuration status
    Status,

    /// Display version information
    Version,

    /// Submit scans and wait for their reports
    #[command(subcommand)]
    Scan(ScanCommands),

    /// Fetch reports by id
    #[command(subcommand)]
    Report(ReportCommands),

    /// Fetch scan screenshots
    #[command(subcommand)]
    Screenshot(ScreenshotCommands),

    /// Generate shell completions
    #[command(after_help = "\
Examples:
  bash:   sandop completion bash > /etc/bash_completion.d/sandop
  zsh:    sandop completion zsh > \"${fpath[1]}/_sandop\"
  fish:   sandop completion fish > ~/.config/fish/completions/sandop.fish")]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Scan subcommands
#[derive(Subcommand, Debug)]
pub enum ScanCommands {
    /// Submit one or more URLs/domains and wait for each report
    #[command(after_help = "EXAMPLES:\n  \
            sandop scan submit example.com\n  \
            sandop scan submit https://a.example b.example --concurrency 2\n  \
            sandop scan submit example.com --screenshot-dir ./shots\n  \
            sandop --local scan submit example.com --format json")]
    Submit {
        /// URLs or bare domains, sent to the sandbox as typed
        #[arg(required = true)]
        targets: Vec<String>,

        /// Maximum scans in flight at once
        #[arg(long, short = 'c', default_value_t = DEFAULT_CONCURRENCY, value_parser = clap::value_parser!(u64).range(1..))]
        concurrency: u64,

        /// Write decoded screenshots into this directory as <report_id>.jpg
        #[arg(long, conflicts_with = "no_screenshot")]
        screenshot_dir: Option<PathBuf>,

        /// Skip fetching screenshots
        #[arg(long)]
        no_screenshot: bool,
    },
}

/// Report subcommands
#[derive(Subcommand, Debug)]
pub enum ReportCommands {
    /// Fetch a report once, without waiting
    Get {
        /// Report id returned at submission
        report_id: String,
    },

    /// Poll for a report until it is ready or the poll budget runs out
    Wait {
        /// Report id returned at submission
        report_id: String,
    },
}

/// Screenshot subcommands
#[derive(Subcommand, Debug)]
pub enum ScreenshotCommands {
    /// Download and decode the screenshot for a report
    Get {
        /// Report id returned at submission
        report_id: String,

        /// Output file (defaults to ./<report_id>.jpg)
        #[arg(long, short = 'o')]
        out: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_scan_submit() {
        let cli = Cli::parse_from(["sandop", "scan", "submit", "a.example", "b.example", "-c", "2"]);

        match cli.command {
            Commands::Scan(ScanCommands::Submit {
                targets,
                concurrency,
                no_screenshot,
                ..
            }) => {
                assert_eq!(targets, vec!["a.example", "b.example"]);
                assert_eq!(concurrency, 2);
                assert!(!no_screenshot);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_scan_submit_requires_target() {
        assert!(Cli::try_parse_from(["sandop", "scan", "submit"]).is_err());
    }

    #[test]
    fn test_zero_attempts_rejected() {
        assert!(Cli::try_parse_from(["sandop", "--max-attempts", "0", "version"]).is_err());
    }

    #[test]
    fn test_zero_request_timeout_rejected() {
        assert!(Cli::try_parse_from(["sandop", "--request-timeout", "0", "version"]).is_err());

        let cli = Cli::parse_from(["sandop", "--request-timeout", "5", "version"]);
        assert_eq!(cli.request_timeout, Some(5));
    }

    #[test]
    fn test_local_conflicts_with_api_host() {
        assert!(
            Cli::try_parse_from([
                "sandop",
                "--local",
                "--api-host",
                "http://x",
                "version"
            ])
            .is_err()
        );
    }
}
