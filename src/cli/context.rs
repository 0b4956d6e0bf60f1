//! Command execution context
//!
//! Resolves the effective profile (file + overrides), validates it, and builds
//! the shared API client.

use std::sync::Arc;

use log::debug;
use tokio_util::sync::CancellationToken;

use crate::cli::OutputFormat;
use crate::cli::args::GlobalOptions;
use crate::client::SandboxClient;
use crate::config::{ProfileConfig, ProfiledConfig};
use crate::error::{ConfigError, Error, Result};
use crate::scan::PollPolicy;

/// Context for command execution containing config, client, and runtime options.
pub struct CommandContext {
    /// Effective profile after overrides
    pub profile: ProfileConfig,
    /// API client shared by every run of this command
    pub client: Arc<SandboxClient>,
    /// Output format preference
    pub format: OutputFormat,
}

impl CommandContext {
    /// Create a new command context.
    ///
    /// A missing config file is fine as long as the API key arrives through a
    /// flag or the environment. An explicitly requested profile must exist.
    pub fn new(opts: &GlobalOptions) -> Result<Self> {
        let profile = opts.overrides().apply(load_profile(opts)?);
        profile.validate_auth()?;

        let api_key = profile.api_key.clone().unwrap_or_default();
        let client = SandboxClient::new(api_key, profile.api_host(), profile.request_timeout())?;
        debug!(
            "Using API host {} (timeout {:?}, poll every {}ms up to {} times)",
            client.base_url(),
            profile.request_timeout(),
            profile.poll.interval_ms,
            profile.poll.max_attempts
        );

        Ok(Self {
            profile,
            client: Arc::new(client),
            format: opts.format,
        })
    }

    /// Poll policy from the effective profile
    pub fn poll_policy(&self) -> PollPolicy {
        self.profile.poll.into()
    }

    /// Whether to draw spinners on stderr
    pub fn show_progress(&self) -> bool {
        self.format != OutputFormat::Json
    }
}

/// Profile from the config file, or defaults when there is no file.
fn load_profile(opts: &GlobalOptions) -> Result<ProfileConfig> {
    match ProfiledConfig::load_at(opts.config_ref()) {
        Ok(config) => match config.resolve_profile(opts.profile_ref()) {
            Ok((_, profile)) => Ok(profile.clone()),
            Err(Error::Config(ConfigError::ProfileNotFound(_))) if opts.profile.is_none() => {
                Ok(ProfileConfig::default())
            }
            Err(e) => Err(e),
        },
        Err(Error::Config(ConfigError::NotFound)) => {
            if let Some(name) = opts.profile_ref() {
                return Err(ConfigError::ProfileNotFound(name.to_string()).into());
            }
            Ok(ProfileConfig::default())
        }
        Err(e) => Err(e),
    }
}

/// Token cancelled when the user presses Ctrl-C.
///
/// Only the local wait stops; scans already submitted keep running server-side.
pub fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            debug!("Ctrl-C received, cancelling");
            trigger.cancel();
        }
    });
    token
}
