//! Search engine trait definition.

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::StoreError;

/// Abstract interface for the boolean search engine.
///
/// Responses are the engine's raw JSON bodies; failures carry the engine's
/// structured cause as [`StoreError::Structured`] whenever one was returned.
#[async_trait]
pub trait SearchEngine: Send + Sync {
    /// Create or replace a document at `index/doc_type/id`.
    async fn put_document(
        &self,
        index: &str,
        doc_type: &str,
        id: &str,
        body: &Value,
    ) -> Result<Value, StoreError>;

    /// Fetch an indexed document.
    async fn get_document(&self, index: &str, doc_type: &str, id: &str)
        -> Result<Value, StoreError>;

    /// Run a search request, optionally opening a scroll cursor with the
    /// given time-to-live (e.g. "1m").
    async fn search(
        &self,
        index: &str,
        body: &Value,
        scroll_ttl: Option<&str>,
    ) -> Result<Value, StoreError>;

    /// Fetch the next page of an open scroll cursor.
    async fn continue_scroll(&self, scroll_id: &str, ttl: &str) -> Result<Value, StoreError>;

    /// Release a scroll cursor.
    async fn close_scroll(&self, scroll_id: &str) -> Result<Value, StoreError>;

    /// Define the mapping of a document type within an index.
    async fn put_mapping(
        &self,
        index: &str,
        doc_type: &str,
        body: &Value,
    ) -> Result<Value, StoreError>;

    /// Create an index.
    async fn create_index(&self, index: &str) -> Result<Value, StoreError>;

    /// Delete an index.
    async fn delete_index(&self, index: &str) -> Result<Value, StoreError>;
}
