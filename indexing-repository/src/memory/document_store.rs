//! In-memory document store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::errors::StoreError;
use crate::interfaces::{DocumentStore, FindPage};

type CollectionKey = (String, String);

/// Document store backed by process-local collections.
///
/// Documents keep their insertion order, which makes pagination in tests
/// deterministic. Every read access increments a call counter.
#[derive(Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<HashMap<CollectionKey, Vec<(String, Value)>>>,
    read_calls: AtomicUsize,
}

impl MemoryDocumentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a document, injecting a string `_id` when the document has none.
    pub async fn insert(&self, database: &str, collection: &str, id: &str, mut document: Value) {
        if let Some(map) = document.as_object_mut() {
            map.entry("_id").or_insert_with(|| Value::String(id.to_owned()));
        }
        let key = (database.to_owned(), collection.to_owned());
        let mut collections = self.collections.write().await;
        let docs = collections.entry(key).or_default();
        match docs.iter_mut().find(|(existing, _)| existing == id) {
            Some((_, slot)) => *slot = document,
            None => docs.push((id.to_owned(), document)),
        }
    }

    /// Number of read operations (`exists`/`get`/`find`/`count`) served.
    pub fn read_calls(&self) -> usize {
        self.read_calls.load(Ordering::SeqCst)
    }

    fn filter_matches(filter: &Value, id: &str) -> bool {
        if let Some(ids) = filter["_id"]["$in"].as_array() {
            return ids.iter().any(|v| v.as_str() == Some(id));
        }
        // An empty or unrecognized filter matches everything.
        true
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn exists(
        &self,
        id: &str,
        database: &str,
        collection: &str,
    ) -> Result<bool, StoreError> {
        self.read_calls.fetch_add(1, Ordering::SeqCst);
        let key = (database.to_owned(), collection.to_owned());
        Ok(self
            .collections
            .read()
            .await
            .get(&key)
            .is_some_and(|docs| docs.iter().any(|(existing, _)| existing == id)))
    }

    async fn get(&self, id: &str, database: &str, collection: &str) -> Result<Value, StoreError> {
        self.read_calls.fetch_add(1, Ordering::SeqCst);
        let key = (database.to_owned(), collection.to_owned());
        self.collections
            .read()
            .await
            .get(&key)
            .and_then(|docs| docs.iter().find(|(existing, _)| existing == id))
            .map(|(_, doc)| doc.clone())
            .ok_or_else(|| StoreError::not_found(format!("document '{}'", id)))
    }

    async fn find(
        &self,
        filter: &Value,
        database: &str,
        collection: &str,
        offset: usize,
        limit: usize,
    ) -> Result<FindPage, StoreError> {
        self.read_calls.fetch_add(1, Ordering::SeqCst);
        let key = (database.to_owned(), collection.to_owned());
        let collections = self.collections.read().await;
        let matching: Vec<&Value> = collections
            .get(&key)
            .map(|docs| {
                docs.iter()
                    .filter(|(id, _)| Self::filter_matches(filter, id))
                    .map(|(_, doc)| doc)
                    .collect()
            })
            .unwrap_or_default();

        let total = matching.len();
        let items = matching
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();
        Ok(FindPage { items, total })
    }

    async fn count(
        &self,
        filter: &Value,
        database: &str,
        collection: &str,
    ) -> Result<usize, StoreError> {
        self.read_calls.fetch_add(1, Ordering::SeqCst);
        let key = (database.to_owned(), collection.to_owned());
        let collections = self.collections.read().await;
        Ok(collections
            .get(&key)
            .map(|docs| {
                docs.iter()
                    .filter(|(id, _)| Self::filter_matches(filter, id))
                    .count()
            })
            .unwrap_or(0))
    }
}
