//! Interface definitions for the collaborators of the indexing service.
//!
//! These traits allow dependency injection and swappable backend
//! implementations; the orchestrator is constructed over trait objects and
//! never reaches for an ambient global instance.

mod config_store;
mod document_store;
mod search_engine;

pub use config_store::ConfigStore;
pub use document_store::{DocumentStore, FindPage};
pub use search_engine::SearchEngine;
