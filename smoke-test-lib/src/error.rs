//! Error handling for smoke testing operations.
//!
//! Construction-time failures (bad value object input, bad runner or config
//! setup) are reported through [`SmokeTestError`]. Per-request network
//! failures are not errors at this level: the runner turns them into
//! [`ErrorResult`](crate::ErrorResult) values.

use thiserror::Error;

/// Main error type for smoke testing operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SmokeTestError {
    /// Malformed input to a value object constructor
    #[error("Invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    /// Invalid runner or configuration setup
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// The HTTP transport could not be set up
    #[error("Transport setup failed: {message}")]
    Transport { message: String },

    /// File I/O errors when reading URL lists or config files
    #[error("File error at '{path}': {message}")]
    File { path: String, message: String },
}

impl SmokeTestError {
    /// Create a new validation error for the named field.
    pub fn validation<R: Into<String>>(field: &'static str, reason: R) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }

    /// Create a new configuration error.
    pub fn config<M: Into<String>>(message: M) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new transport setup error.
    pub fn transport<M: Into<String>>(message: M) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create a new file error.
    pub fn file_error<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::File {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Whether this error came from value object validation.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Whether this error came from runner or config setup.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config { .. })
    }
}

impl From<toml::de::Error> for SmokeTestError {
    fn from(err: toml::de::Error) -> Self {
        Self::config(format!("Failed to parse TOML configuration: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = SmokeTestError::validation("status code", "999 is outside 100..=599");
        assert_eq!(
            err.to_string(),
            "Invalid status code: 999 is outside 100..=599"
        );

        let err = SmokeTestError::config("Concurrency must be at least 1");
        assert_eq!(
            err.to_string(),
            "Configuration error: Concurrency must be at least 1"
        );

        let err = SmokeTestError::file_error("urls.txt", "not found");
        assert_eq!(err.to_string(), "File error at 'urls.txt': not found");
    }

    #[test]
    fn test_classification() {
        assert!(SmokeTestError::validation("url", "empty").is_validation());
        assert!(!SmokeTestError::validation("url", "empty").is_config());
        assert!(SmokeTestError::config("bad").is_config());
        assert!(!SmokeTestError::transport("tls").is_config());
    }
}
