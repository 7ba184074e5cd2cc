//! # Indexing Shared
//!
//! Shared data model for the object indexing service. The central type is
//! [`TypeConfig`], the per-object-type configuration document that drives
//! both the query compiler and the document projection engine.

pub mod config;
pub mod errors;

pub use config::{FilterRule, Mapping, SetRule, TransformSpec, TypeConfig};
pub use errors::ConfigError;
