//! Configuration store trait definition.

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::StoreError;

/// Store holding one configuration document per indexable object type.
///
/// All implementations must be `Send + Sync` to allow use across async
/// tasks.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Check whether a configuration exists for the given type name.
    async fn exists(&self, name: &str) -> Result<bool, StoreError>;

    /// Fetch the configuration document for the given type name.
    async fn get(&self, name: &str) -> Result<Value, StoreError>;

    /// Create or replace the configuration for the given type name.
    ///
    /// Returns `true` when the configuration was created, `false` when an
    /// existing one was updated.
    async fn upsert(&self, name: &str, payload: Value) -> Result<bool, StoreError>;

    /// Delete the configuration for the given type name.
    async fn delete(&self, name: &str) -> Result<(), StoreError>;
}
