//! Global CLI options shared across all commands
//!
//! Consolidates the global flags into one struct so handler signatures stay
//! small. Precedence is: CLI flag > environment variable > config profile > default.

use crate::cli::{Cli, OutputFormat};
use crate::config::{LOCAL_API_HOST, Overrides};

/// Global CLI options passed to all command handlers.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    /// Output format (pretty, table, json)
    pub format: OutputFormat,

    /// Custom config file path (defaults to ~/.sandop/config.yaml)
    pub config: Option<String>,

    /// Profile name override (bypasses active_profile in config)
    pub profile: Option<String>,

    /// API key override
    pub api_key: Option<String>,

    /// API host override; `--local` resolves to the self-hosted sandbox
    pub api_host: Option<String>,

    /// Poll interval override in milliseconds
    pub poll_interval_ms: Option<u64>,

    /// Poll attempt budget override
    pub max_attempts: Option<u32>,

    /// Per-request timeout override in seconds
    pub request_timeout_secs: Option<u64>,
}

impl GlobalOptions {
    /// Create GlobalOptions from a parsed CLI struct.
    pub fn from_cli(cli: &Cli) -> Self {
        let api_host = if cli.local {
            Some(LOCAL_API_HOST.to_string())
        } else {
            cli.api_host.clone()
        };

        Self {
            format: cli.format,
            config: cli.config.clone(),
            profile: cli.profile.clone(),
            api_key: cli.api_key.clone(),
            api_host,
            poll_interval_ms: cli.poll_interval_ms,
            max_attempts: cli.max_attempts,
            request_timeout_secs: cli.request_timeout,
        }
    }

    /// Get config path as `Option<&str>`.
    pub fn config_ref(&self) -> Option<&str> {
        self.config.as_deref()
    }

    /// Get profile override as `Option<&str>`.
    pub fn profile_ref(&self) -> Option<&str> {
        self.profile.as_deref()
    }

    /// The subset of options that override profile values
    pub fn overrides(&self) -> Overrides {
        Overrides {
            api_key: self.api_key.clone(),
            api_host: self.api_host.clone(),
            poll_interval_ms: self.poll_interval_ms,
            max_attempts: self.max_attempts,
            request_timeout_secs: self.request_timeout_secs,
        }
    }
}
