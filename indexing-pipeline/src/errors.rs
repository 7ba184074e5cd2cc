//! Orchestrator error types.

use indexing_engine::EngineError;
use indexing_repository::StoreError;
use indexing_shared::ConfigError;
use thiserror::Error;

/// Errors returned by the indexing orchestrator.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IndexingError {
    /// Invalid or incomplete configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A value could not be parsed under its declared format.
    #[error("Invalid value: {0}")]
    Value(String),

    /// The referenced object, configuration, index or scroll does not exist.
    #[error("{0}")]
    NotFound(String),

    /// A bulk request named more ids than the configured maximum.
    #[error("The bulk indexing process accepts a maximum of {max} ids ({provided} provided)")]
    PayloadTooLarge { provided: usize, max: usize },

    /// The search engine rejected a request parameter.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The target resource already exists.
    #[error("{0}")]
    AlreadyExists(String),

    /// A collaborator failed in a way the orchestrator does not interpret.
    #[error("{0}")]
    Collaborator(StoreError),
}

impl IndexingError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a not-found error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an invalid-parameter error.
    pub fn invalid_parameter(msg: impl Into<String>) -> Self {
        Self::InvalidParameter(msg.into())
    }
}

impl From<EngineError> for IndexingError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::Config(msg) => Self::Config(msg),
            EngineError::Value(msg) => Self::Value(msg),
        }
    }
}

impl From<ConfigError> for IndexingError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}

impl From<StoreError> for IndexingError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(msg) => Self::NotFound(msg),
            other => Self::Collaborator(other),
        }
    }
}
