//! In-memory configuration store.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::errors::StoreError;
use crate::interfaces::ConfigStore;

/// Configuration store backed by a process-local map.
#[derive(Default)]
pub struct MemoryConfigStore {
    entries: RwLock<HashMap<String, Value>>,
}

impl MemoryConfigStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a configuration document.
    pub async fn insert(&self, name: &str, config: Value) {
        self.entries.write().await.insert(name.to_owned(), config);
    }
}

#[async_trait]
impl ConfigStore for MemoryConfigStore {
    async fn exists(&self, name: &str) -> Result<bool, StoreError> {
        Ok(self.entries.read().await.contains_key(name))
    }

    async fn get(&self, name: &str) -> Result<Value, StoreError> {
        self.entries
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::not_found(format!("configuration '{}'", name)))
    }

    async fn upsert(&self, name: &str, payload: Value) -> Result<bool, StoreError> {
        let mut entries = self.entries.write().await;
        let created = !entries.contains_key(name);
        entries.insert(name.to_owned(), payload);
        Ok(created)
    }

    async fn delete(&self, name: &str) -> Result<(), StoreError> {
        match self.entries.write().await.remove(name) {
            Some(_) => Ok(()),
            None => Err(StoreError::not_found(format!("configuration '{}'", name))),
        }
    }
}
