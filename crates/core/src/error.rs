//! Error types for PipeWrench.
//!
//! A single error enum covers configuration, I/O, model provider, whitelist,
//! prompt and validation failures. Compliance findings are never errors: they
//! travel as data inside the answer result.

use thiserror::Error;

/// Unified error type for PipeWrench.
///
/// All fallible functions in the workspace return `Result<T, AppError>`.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors (including an unconfigured model provider)
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The model provider was reached but the call failed
    #[error("Provider error: {0}")]
    Provider(String),

    /// Whitelist source data could not be used
    #[error("Whitelist error: {0}")]
    Whitelist(String),

    /// Prompt composition and profile errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Caller supplied input that violates the request contract
    #[error("Invalid request: {0}")]
    Validation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Whether this error came from the model provider.
    pub fn is_provider(&self) -> bool {
        matches!(self, AppError::Provider(_))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
