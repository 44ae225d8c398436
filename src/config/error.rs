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
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Generator timeout must be between 1 and 300 seconds")]
    InvalidTimeout,

    #[error("Maximum session duration must be at least one minute")]
    InvalidMaxDuration,

    #[error("Emergency keyword list contains a blank entry")]
    BlankEmergencyKeyword,

    #[error("Unknown log level '{0}'")]
    UnknownLogLevel(String),
}
