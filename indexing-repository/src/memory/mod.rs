//! In-memory collaborator implementations.
//!
//! Used by tests and local development. The document store and the search
//! engine keep call counters so tests can assert that an operation failed
//! before any collaborator was touched, and the search engine supports
//! injected per-document failures for exercising best-effort flows.

mod config_store;
mod document_store;
mod search_engine;

pub use config_store::MemoryConfigStore;
pub use document_store::MemoryDocumentStore;
pub use search_engine::MemorySearchEngine;
