//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Value for {0} must be greater than zero")]
    MustBePositive(&'static str),

    #[error("Semantic threshold must be in (0, 1], got {0}")]
    InvalidThreshold(f32),

    #[error("Subtask timeout exceeds request timeout")]
    SubtaskTimeoutTooLong,

    #[error("Value for {0} is out of range")]
    OutOfRange(&'static str),
}
