//! In-memory search engine.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::errors::{SearchFailure, StoreError};
use crate::interfaces::SearchEngine;

struct StoredDoc {
    doc_type: String,
    body: Value,
    version: u64,
}

#[derive(Default)]
struct IndexState {
    mapping: Option<Value>,
    docs: Vec<(String, StoredDoc)>,
}

struct ScrollState {
    hits: Vec<Value>,
    pos: usize,
    size: usize,
}

/// Search engine backed by process-local indices.
///
/// Mimics the response and failure bodies of the real engine closely enough
/// for the orchestrator's classification logic: missing indices fail with
/// `index_not_found_exception`, duplicate creation with
/// `index_already_exists_exception`, and an unknown scroll id fails without
/// a structured cause. Individual document writes can be made to fail with
/// [`MemorySearchEngine::fail_put_for`] to exercise best-effort flows.
#[derive(Default)]
pub struct MemorySearchEngine {
    indices: RwLock<HashMap<String, IndexState>>,
    scrolls: RwLock<HashMap<String, ScrollState>>,
    fail_put_ids: RwLock<HashSet<String>>,
    last_search_body: RwLock<Option<Value>>,
    put_calls: AtomicUsize,
    search_calls: AtomicUsize,
}

impl MemorySearchEngine {
    /// Create an engine with no indices.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `put_document` for the given id fail.
    pub async fn fail_put_for(&self, id: &str) {
        self.fail_put_ids.write().await.insert(id.to_owned());
    }

    /// Number of `put_document` calls, including failed ones.
    pub fn put_calls(&self) -> usize {
        self.put_calls.load(Ordering::SeqCst)
    }

    /// Number of `search` calls.
    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    /// The body of the most recent `search` call.
    pub async fn last_search_body(&self) -> Option<Value> {
        self.last_search_body.read().await.clone()
    }

    /// Fetch an indexed document body directly, bypassing the trait.
    pub async fn stored_document(&self, index: &str, id: &str) -> Option<Value> {
        let indices = self.indices.read().await;
        indices
            .get(index)?
            .docs
            .iter()
            .find(|(existing, _)| existing == id)
            .map(|(_, doc)| doc.body.clone())
    }

    fn index_not_found(index: &str) -> StoreError {
        StoreError::Structured(SearchFailure::of_type(
            "index_not_found_exception",
            &format!("no such index [{}]", index),
        ))
    }
}

#[async_trait]
impl SearchEngine for MemorySearchEngine {
    async fn put_document(
        &self,
        index: &str,
        doc_type: &str,
        id: &str,
        body: &Value,
    ) -> Result<Value, StoreError> {
        self.put_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_put_ids.read().await.contains(id) {
            return Err(StoreError::failure(format!(
                "injected failure writing '{}'",
                id
            )));
        }

        debug!(index = %index, id = %id, "storing document");
        let mut indices = self.indices.write().await;
        let state = indices.entry(index.to_owned()).or_default();
        let (version, created) =
            match state.docs.iter_mut().find(|(existing, _)| existing == id) {
                Some((_, doc)) => {
                    doc.body = body.clone();
                    doc.doc_type = doc_type.to_owned();
                    doc.version += 1;
                    (doc.version, false)
                }
                None => {
                    state.docs.push((
                        id.to_owned(),
                        StoredDoc {
                            doc_type: doc_type.to_owned(),
                            body: body.clone(),
                            version: 1,
                        },
                    ));
                    (1, true)
                }
            };

        Ok(json!({
            "_index": index,
            "_type": doc_type,
            "_id": id,
            "_version": version,
            "result": if created { "created" } else { "updated" },
            "created": created
        }))
    }

    async fn get_document(
        &self,
        index: &str,
        doc_type: &str,
        id: &str,
    ) -> Result<Value, StoreError> {
        let indices = self.indices.read().await;
        let state = indices
            .get(index)
            .ok_or_else(|| Self::index_not_found(index))?;
        let doc = state
            .docs
            .iter()
            .find(|(existing, _)| existing == id)
            .map(|(_, doc)| doc)
            .ok_or_else(|| StoreError::not_found(format!("document '{}'", id)))?;

        Ok(json!({
            "_index": index,
            "_type": doc_type,
            "_id": id,
            "_version": doc.version,
            "found": true,
            "_source": doc.body
        }))
    }

    async fn search(
        &self,
        index: &str,
        body: &Value,
        scroll_ttl: Option<&str>,
    ) -> Result<Value, StoreError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_search_body.write().await = Some(body.clone());

        let from = body["from"].as_u64().unwrap_or(0) as usize;
        let size = body["size"].as_u64().unwrap_or(10) as usize;

        let indices = self.indices.read().await;
        let state = indices
            .get(index)
            .ok_or_else(|| Self::index_not_found(index))?;
        let hits: Vec<Value> = state
            .docs
            .iter()
            .map(|(id, doc)| {
                json!({
                    "_index": index,
                    "_type": doc.doc_type,
                    "_id": id,
                    "_score": 1.0,
                    "_source": doc.body
                })
            })
            .collect();

        let total = hits.len();
        let page: Vec<Value> = hits.iter().skip(from).take(size).cloned().collect();
        let mut response = json!({
            "took": 1,
            "timed_out": false,
            "hits": { "total": total, "hits": page }
        });

        if scroll_ttl.is_some() {
            let scroll_id = Uuid::new_v4().to_string();
            self.scrolls.write().await.insert(
                scroll_id.clone(),
                ScrollState {
                    hits,
                    pos: from + size,
                    size,
                },
            );
            response["_scroll_id"] = Value::String(scroll_id);
        }
        Ok(response)
    }

    async fn continue_scroll(&self, scroll_id: &str, _ttl: &str) -> Result<Value, StoreError> {
        let mut scrolls = self.scrolls.write().await;
        let state = scrolls
            .get_mut(scroll_id)
            .ok_or_else(|| StoreError::failure(format!("unknown scroll '{}'", scroll_id)))?;

        let page: Vec<Value> = state
            .hits
            .iter()
            .skip(state.pos)
            .take(state.size)
            .cloned()
            .collect();
        state.pos += state.size;

        Ok(json!({
            "_scroll_id": scroll_id,
            "took": 1,
            "timed_out": false,
            "hits": { "total": state.hits.len(), "hits": page }
        }))
    }

    async fn close_scroll(&self, scroll_id: &str) -> Result<Value, StoreError> {
        match self.scrolls.write().await.remove(scroll_id) {
            Some(_) => Ok(json!({ "succeeded": true, "num_freed": 1 })),
            None => Err(StoreError::failure(format!(
                "unknown scroll '{}'",
                scroll_id
            ))),
        }
    }

    async fn put_mapping(
        &self,
        index: &str,
        _doc_type: &str,
        body: &Value,
    ) -> Result<Value, StoreError> {
        let mut indices = self.indices.write().await;
        let state = indices
            .get_mut(index)
            .ok_or_else(|| Self::index_not_found(index))?;
        state.mapping = Some(body.clone());
        Ok(json!({ "acknowledged": true }))
    }

    async fn create_index(&self, index: &str) -> Result<Value, StoreError> {
        let mut indices = self.indices.write().await;
        if indices.contains_key(index) {
            return Err(StoreError::Structured(SearchFailure::of_type(
                "index_already_exists_exception",
                &format!("index [{}] already exists", index),
            )));
        }
        indices.insert(index.to_owned(), IndexState::default());
        Ok(json!({ "acknowledged": true }))
    }

    async fn delete_index(&self, index: &str) -> Result<Value, StoreError> {
        match self.indices.write().await.remove(index) {
            Some(_) => Ok(json!({ "acknowledged": true })),
            None => Err(Self::index_not_found(index)),
        }
    }
}
