//! Document store trait definition.

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::StoreError;

/// One page of a [`DocumentStore::find`] result.
#[derive(Debug, Clone)]
pub struct FindPage {
    /// The documents on this page.
    pub items: Vec<Value>,
    /// Total number of documents matching the filter, across all pages.
    pub total: usize,
}

/// Store holding the canonical documents that get projected and indexed.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Check whether a document exists.
    async fn exists(&self, id: &str, database: &str, collection: &str)
        -> Result<bool, StoreError>;

    /// Fetch a document by id.
    ///
    /// Returns [`StoreError::NotFound`] when the id does not exist.
    async fn get(&self, id: &str, database: &str, collection: &str) -> Result<Value, StoreError>;

    /// Query a collection with an opaque JSON filter and pagination.
    ///
    /// An empty filter object matches every document. The only structured
    /// filter shape the service itself builds is `{"_id": {"$in": [...]}}`.
    async fn find(
        &self,
        filter: &Value,
        database: &str,
        collection: &str,
        offset: usize,
        limit: usize,
    ) -> Result<FindPage, StoreError>;

    /// Count the documents matching a filter.
    async fn count(&self, filter: &Value, database: &str, collection: &str)
        -> Result<usize, StoreError>;
}
