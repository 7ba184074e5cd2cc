//! Collaborator error types.
//!
//! Search-engine failures carry the structured cause body the engine
//! returned (`{"error": {"type", "reason", "root_cause": [...]}}`) so the
//! orchestrator can distinguish "index not found" or "index already exists"
//! from generic failures.

use std::fmt;

use serde_json::Value;
use thiserror::Error;

/// A structured failure body returned by the search engine.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchFailure {
    body: Value,
}

impl SearchFailure {
    /// Wrap a failure body.
    pub fn new(body: Value) -> Self {
        Self { body }
    }

    /// Build a failure body with the given `error.type` and `error.reason`.
    pub fn of_type(error_type: &str, reason: &str) -> Self {
        Self::new(serde_json::json!({
            "error": {
                "type": error_type,
                "reason": reason,
                "root_cause": [ { "type": error_type, "reason": reason } ]
            }
        }))
    }

    /// The raw failure body.
    pub fn body(&self) -> &Value {
        &self.body
    }

    /// The `error.type` discriminant, when present.
    pub fn error_type(&self) -> Option<&str> {
        self.body["error"]["type"].as_str()
    }

    /// The `error.reason` text, when present.
    pub fn reason(&self) -> Option<&str> {
        self.body["error"]["reason"].as_str()
    }

    /// The first `error.root_cause` reason, when present.
    pub fn root_cause_reason(&self) -> Option<&str> {
        self.body["error"]["root_cause"][0]["reason"].as_str()
    }

    /// Whether the failure names a missing index.
    pub fn is_index_not_found(&self) -> bool {
        self.error_type() == Some("index_not_found_exception")
    }

    /// Whether the failure names an index that already exists.
    pub fn is_index_already_exists(&self) -> bool {
        self.error_type() == Some("index_already_exists_exception")
    }

    /// Whether the failure names an invalid request parameter.
    pub fn is_invalid_parameter(&self) -> bool {
        matches!(
            self.error_type(),
            Some("illegal_argument_exception") | Some("parse_exception")
        )
    }
}

impl fmt::Display for SearchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.error_type(), self.reason()) {
            (Some(t), Some(r)) => write!(f, "{}: {}", t, r),
            (Some(t), None) => write!(f, "{}", t),
            _ => write!(f, "unclassified search engine failure"),
        }
    }
}

/// Errors returned by the collaborator interfaces.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// The referenced object, configuration, index or scroll does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The search engine returned a structured failure body.
    #[error("Search engine failure: {0}")]
    Structured(SearchFailure),

    /// Opaque collaborator failure with no recognized structured cause.
    #[error("Collaborator failure: {0}")]
    Failure(String),
}

impl StoreError {
    /// Create a not-found error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an opaque failure.
    pub fn failure(msg: impl Into<String>) -> Self {
        Self::Failure(msg.into())
    }

    /// The structured failure body, when this error carries one.
    pub fn search_failure(&self) -> Option<&SearchFailure> {
        match self {
            Self::Structured(failure) => Some(failure),
            _ => None,
        }
    }
}
