//! Engine error types.

use indexing_shared::ConfigError;
use thiserror::Error;

/// Errors raised by the pure engines.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// The configuration references an unsupported kind or is structurally
    /// inconsistent. Never retried; always surfaced to the caller.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An input value cannot be parsed under its declared format.
    #[error("Invalid value: {0}")]
    Value(String),
}

impl EngineError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid-value error.
    pub fn value(msg: impl Into<String>) -> Self {
        Self::Value(msg.into())
    }
}

impl From<ConfigError> for EngineError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}
