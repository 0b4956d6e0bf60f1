//! Configuration management for sandop
//!
//! Configuration lives in a YAML file holding one or more named profiles.
//! Values resolve with the precedence: CLI flag > environment > profile > default.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};
use crate::scan::{DEFAULT_MAX_POLL_ATTEMPTS, DEFAULT_POLL_INTERVAL, PollPolicy};

/// Hosted sandbox API
pub const DEFAULT_API_HOST: &str = "https://community.webamon.co.uk";

/// Self-hosted sandbox started locally
pub const LOCAL_API_HOST: &str = "http://localhost:5000";

/// Per-request transport timeout applied to every API call
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Name of the profile used when none is selected
pub const DEFAULT_PROFILE: &str = "default";

/// Poll policy as stored in the config file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollSettings {
    /// Delay between report polls in milliseconds
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Maximum number of report polls per run
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

fn default_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL.as_millis() as u64
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_POLL_ATTEMPTS
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl From<PollSettings> for PollPolicy {
    fn from(settings: PollSettings) -> Self {
        PollPolicy::new(
            Duration::from_millis(settings.interval_ms),
            settings.max_attempts,
        )
    }
}

/// A single named profile
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileConfig {
    /// Sandbox API key, sent as `x-api-key`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// API base URL (defaults to the hosted sandbox)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_host: Option<String>,

    /// Report polling policy
    #[serde(default)]
    pub poll: PollSettings,

    /// Transport timeout per request, in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
}

impl ProfileConfig {
    /// API host for this profile, falling back to the hosted sandbox
    pub fn api_host(&self) -> &str {
        self.api_host.as_deref().unwrap_or(DEFAULT_API_HOST)
    }

    /// Transport timeout for this profile
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT)
    }

    /// Validate that required configuration is present
    pub fn validate_auth(&self) -> Result<()> {
        match self.api_key.as_deref() {
            Some(key) if !key.is_empty() => Ok(()),
            _ => Err(ConfigError::MissingApiKey.into()),
        }
    }
}

/// Config file contents: named profiles plus the active one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfiledConfig {
    /// Profile used when `--profile` is not given
    #[serde(default = "default_profile_name")]
    pub active_profile: String,

    /// All known profiles
    #[serde(default)]
    pub profiles: BTreeMap<String, ProfileConfig>,
}

fn default_profile_name() -> String {
    DEFAULT_PROFILE.to_string()
}

impl Default for ProfiledConfig {
    fn default() -> Self {
        Self {
            active_profile: default_profile_name(),
            profiles: BTreeMap::new(),
        }
    }
}

impl ProfiledConfig {
    /// Get the default config file path
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::Invalid(
            "Could not determine home directory".to_string(),
        ))?;

        Ok(home.join(".sandop").join("config.yaml"))
    }

    /// Resolve an optional override into a concrete path
    pub fn resolve_path(path: Option<&str>) -> Result<PathBuf> {
        match path {
            Some(p) => Ok(PathBuf::from(p)),
            None => Self::default_path(),
        }
    }

    /// Load configuration from an optional override path
    pub fn load_at(path: Option<&str>) -> Result<Self> {
        Self::load_from(Self::resolve_path(path)?)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: PathBuf) -> Result<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound.into());
        }

        let contents = std::fs::read_to_string(&path)?;
        let config: ProfiledConfig = serde_yaml::from_str(&contents).map_err(ConfigError::from)?;

        Ok(config)
    }

    /// Save configuration to an optional override path
    pub fn save_at(&self, path: Option<&str>) -> Result<()> {
        self.save_to(Self::resolve_path(path)?)
    }

    /// Save configuration to a specific path
    pub fn save_to(&self, path: PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents =
            serde_yaml::to_string(self).map_err(|e| ConfigError::SaveError(e.to_string()))?;

        std::fs::write(&path, contents)?;

        // The file holds an API key
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = std::fs::metadata(&path)?.permissions();
            perms.set_mode(0o600);
            std::fs::set_permissions(&path, perms)?;
        }

        Ok(())
    }

    /// Pick the profile named by `name`, or the active profile.
    pub fn resolve_profile(&self, name: Option<&str>) -> Result<(&str, &ProfileConfig)> {
        let name = name.unwrap_or(&self.active_profile);
        self.profiles
            .get_key_value(name)
            .map(|(k, v)| (k.as_str(), v))
            .ok_or_else(|| ConfigError::ProfileNotFound(name.to_string()).into())
    }

    /// Insert or replace a profile
    pub fn upsert_profile(&mut self, name: &str, profile: ProfileConfig) {
        self.profiles.insert(name.to_string(), profile);
    }

    /// Make `name` the active profile
    pub fn set_active_profile(&mut self, name: &str) -> Result<()> {
        if !self.profiles.contains_key(name) {
            return Err(ConfigError::ProfileNotFound(name.to_string()).into());
        }
        self.active_profile = name.to_string();
        Ok(())
    }

    /// Profile names in sorted order
    pub fn list_profiles(&self) -> Vec<&str> {
        self.profiles.keys().map(String::as_str).collect()
    }
}

/// Values supplied on the command line or through the environment.
///
/// Every field is optional; unset fields fall back to the profile.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub api_key: Option<String>,
    pub api_host: Option<String>,
    pub poll_interval_ms: Option<u64>,
    pub max_attempts: Option<u32>,
    pub request_timeout_secs: Option<u64>,
}

impl Overrides {
    /// Layer these overrides on top of a profile
    pub fn apply(&self, mut profile: ProfileConfig) -> ProfileConfig {
        if let Some(ref key) = self.api_key {
            profile.api_key = Some(key.clone());
        }
        if let Some(ref host) = self.api_host {
            profile.api_host = Some(host.clone());
        }
        if let Some(ms) = self.poll_interval_ms {
            profile.poll.interval_ms = ms;
        }
        if let Some(n) = self.max_attempts {
            profile.poll.max_attempts = n;
        }
        if let Some(secs) = self.request_timeout_secs {
            profile.request_timeout_secs = Some(secs);
        }
        profile
    }
}
