//! Error types for gowra-stream.
//!
//! Each layer has its own enum: provider failures, window precondition
//! violations, and the application-level errors the binary reports.

use std::io;
use thiserror::Error;

/// Failures talking to a metadata provider.
///
/// The episode window treats every variant the same way: the fetch is
/// abandoned, state is left intact and the message is surfaced as a notice.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Network/HTTP errors
    #[error("Network error: {0}")]
    Network(String),
    /// Response body could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),
    /// The provider answered with a non-success status
    #[error("Provider returned HTTP {0}")]
    Status(u16),
    /// The requested title does not exist
    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ProviderError::Parse(err.to_string())
        } else {
            ProviderError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        ProviderError::Parse(err.to_string())
    }
}

/// Caller errors rejected by the episode window.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WindowError {
    /// `select_episode` was given a number outside `1..=total`.
    #[error("Episode {number} is out of range (1-{total})")]
    EpisodeOutOfRange { number: u32, total: u32 },
}

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// Metadata provider failures
    #[error(transparent)]
    Provider(#[from] ProviderError),
    /// Episode window rejected an operation
    #[error(transparent)]
    Window(#[from] WindowError),
    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),
    /// File or terminal I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// Invalid input from user
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for AppError {
    fn from(err: toml::ser::Error) -> Self {
        AppError::Config(err.to_string())
    }
}

/// Result type alias using AppError.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_error_display() {
        let err = ProviderError::Network("connection refused".to_string());
        assert_eq!(err.to_string(), "Network error: connection refused");
        assert_eq!(ProviderError::Status(429).to_string(), "Provider returned HTTP 429");
    }

    #[test]
    fn test_window_error_display() {
        let err = WindowError::EpisodeOutOfRange {
            number: 13,
            total: 12,
        };
        assert_eq!(err.to_string(), "Episode 13 is out of range (1-12)");
    }

    #[test]
    fn test_app_error_from_io() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let app_err: AppError = io_err.into();
        assert!(matches!(app_err, AppError::Io(_)));
    }

    #[test]
    fn test_app_error_is_transparent_for_provider() {
        let app_err: AppError = ProviderError::NotFound("anime 42".to_string()).into();
        assert_eq!(app_err.to_string(), "Not found: anime 42");
    }
}
