//! # Indexing Repository
//!
//! Collaborator contracts the indexing service depends on: the
//! configuration store, the document store, and the search engine. The
//! traits allow dependency injection and swappable backends; the `memory`
//! module provides in-memory implementations used by tests and local
//! development.

pub mod errors;
pub mod interfaces;
pub mod memory;

pub use errors::{SearchFailure, StoreError};
pub use interfaces::{ConfigStore, DocumentStore, FindPage, SearchEngine};
pub use memory::{MemoryConfigStore, MemoryDocumentStore, MemorySearchEngine};
