//! Configuration error types.

use thiserror::Error;

/// Errors raised while parsing or validating an object-type configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A required field is absent or empty.
    #[error("The {0} has not been provided in the configuration")]
    MissingField(&'static str),

    /// The configuration document is structurally invalid.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    /// Create an invalid-configuration error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }
}
