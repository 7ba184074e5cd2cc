//! # Indexing Pipeline
//!
//! The orchestration layer of the object indexing service. The
//! [`IndexingService`] sequences collaborator calls around the pure engines:
//! it loads per-type configurations, projects documents before submission,
//! compiles user queries, and classifies search-engine failures into
//! caller-facing errors.

pub mod config;
pub mod errors;
mod hydrate;
pub mod service;

pub use config::ServiceConfig;
pub use errors::IndexingError;
pub use service::{BulkOutcome, IndexOutcome, IndexingService, SearchOptions};
