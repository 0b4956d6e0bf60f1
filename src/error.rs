//! Error types for the sandop CLI

use thiserror::Error;

/// Result type alias for sandop operations
pub type Result<T> = std::result::Result<T, Error>;

/// Result type alias for a single scan run
pub type ScanResult<T> = std::result::Result<T, ScanError>;

/// Top-level error type for the application
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Interactive prompt error: {0}")]
    Dialoguer(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to decode screenshot: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Operation failed: {0}")]
    Other(String),
}

impl From<dialoguer::Error> for Error {
    fn from(err: dialoguer::Error) -> Self {
        Error::Dialoguer(err.to_string())
    }
}

/// Failure of a single scan run.
///
/// Each variant is scoped to one run; none of them is fatal to the process.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScanError {
    /// Bad input, detected locally and never sent over the wire
    #[error("Invalid scan request: {0}")]
    Validation(String),

    /// The poll budget ran out before the report appeared
    #[error("Report not available after {attempts} attempts. The scan may still be running.")]
    NotFoundTimeout { attempts: u32 },

    /// The API answered with a non-success status
    #[error("Server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    /// No response from the API
    #[error("Network error: {0}")]
    Transport(String),

    /// The API answered 200 but the body was not what we expected
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    /// The caller abandoned the run
    #[error("Scan cancelled")]
    Cancelled,
}

impl ScanError {
    /// Short machine-friendly name of the variant, used in JSON output.
    pub fn kind(&self) -> &'static str {
        match self {
            ScanError::Validation(_) => "validation",
            ScanError::NotFoundTimeout { .. } => "not_found_timeout",
            ScanError::ServerError { .. } => "server_error",
            ScanError::Transport(_) => "transport",
            ScanError::InvalidResponse(_) => "invalid_response",
            ScanError::Cancelled => "cancelled",
        }
    }
}

impl From<reqwest::Error> for ScanError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ScanError::Transport(format!("Request timed out: {}", err))
        } else if err.is_connect() {
            ScanError::Transport(format!("Failed to connect to API: {}", err))
        } else if err.is_decode() {
            ScanError::InvalidResponse(err.to_string())
        } else {
            ScanError::Transport(err.to_string())
        }
    }
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found. Run `sandop init` to set up.")]
    NotFound,

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to save configuration: {0}")]
    SaveError(String),

    #[error(
        "API key not configured. Run `sandop init` or pass --api-key / SANDOP_API_KEY."
    )]
    MissingApiKey,

    #[error("Profile '{0}' not found. Run `sandop init --profile {0}` to create it.")]
    ProfileNotFound(String),
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_error_validation_message() {
        let err = ScanError::Validation("target must not be empty".to_string());
        assert!(err.to_string().contains("target must not be empty"));
    }

    #[test]
    fn test_scan_error_timeout_mentions_attempts() {
        let err = ScanError::NotFoundTimeout { attempts: 62 };
        assert!(err.to_string().contains("62 attempts"));
    }

    #[test]
    fn test_scan_error_server_error_is_verbatim() {
        let err = ScanError::ServerError {
            status: 500,
            message: "boom".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("500"));
        assert!(msg.ends_with("boom"));
    }

    #[test]
    fn test_scan_error_transport() {
        let err = ScanError::Transport("Connection refused".to_string());
        assert!(err.to_string().contains("Connection refused"));
    }

    #[test]
    fn test_scan_error_kinds() {
        assert_eq!(ScanError::Cancelled.kind(), "cancelled");
        assert_eq!(
            ScanError::NotFoundTimeout { attempts: 1 }.kind(),
            "not_found_timeout"
        );
        assert_eq!(
            ScanError::InvalidResponse(String::new()).kind(),
            "invalid_response"
        );
    }

    #[test]
    fn test_config_error_missing_api_key() {
        let err = ConfigError::MissingApiKey;
        assert!(err.to_string().contains("sandop init"));
    }

    #[test]
    fn test_config_error_profile_not_found() {
        let err = ConfigError::ProfileNotFound("staging".to_string());
        assert!(err.to_string().contains("--profile staging"));
    }

    #[test]
    fn test_error_from_scan_error() {
        let err: Error = ScanError::Cancelled.into();

        match err {
            Error::Scan(ScanError::Cancelled) => (),
            _ => panic!("Expected Error::Scan(ScanError::Cancelled)"),
        }
    }

    #[test]
    fn test_config_error_from_yaml_error() {
        let yaml_str = "invalid: [yaml: content";
        let yaml_err = serde_yaml::from_str::<serde_yaml::Value>(yaml_str).unwrap_err();
        let config_err: ConfigError = yaml_err.into();

        match config_err {
            ConfigError::ParseError(_) => (),
            _ => panic!("Expected ConfigError::ParseError"),
        }
    }
}
