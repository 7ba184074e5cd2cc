//! # Indexing Engine
//!
//! The algorithmic core of the object indexing service:
//!
//! - [`query`] compiles a compact, user-facing search string into a
//!   structured boolean query under a per-type filter configuration.
//! - [`projection`] applies declarative `$set`/`$unset` rules to a document
//!   before it is submitted to the search index.
//! - [`transform`] converts extracted string values into typed values
//!   (dates to epoch milliseconds, regex rewrites).
//! - [`path`] resolves JSONPath-like expressions and dotted target paths.
//!
//! All engines are pure, synchronous computations over one configuration and
//! one document or query string at a time; they hold no shared state.

pub mod errors;
pub mod path;
pub mod projection;
pub mod query;
pub mod transform;

pub use errors::EngineError;
pub use projection::project;
pub use query::compile;
