//! Search hit hydration.
//!
//! Hydration replaces the possibly projected `_source` of a search hit with
//! the canonical record from the document store, merged over the indexed
//! source so stored fields take precedence.

use serde_json::Value;
use tracing::warn;

use indexing_repository::{DocumentStore, StoreError};

use crate::errors::IndexingError;

/// Hydrate every hit under `hits.hits` of a search response in place.
///
/// Hits whose canonical record is missing keep their indexed source.
pub(crate) async fn hydrate_hits(
    response: &mut Value,
    documents: &dyn DocumentStore,
    database: &str,
    collection: &str,
) -> Result<(), IndexingError> {
    if let Some(hits) = response["hits"]["hits"].as_array_mut() {
        for hit in hits {
            hydrate_hit(hit, documents, database, collection).await?;
        }
    }
    Ok(())
}

/// Hydrate a single hit-shaped value (anything carrying `_id` and `_source`).
pub(crate) async fn hydrate_hit(
    hit: &mut Value,
    documents: &dyn DocumentStore,
    database: &str,
    collection: &str,
) -> Result<(), IndexingError> {
    let Some(id) = hit["_id"].as_str().map(str::to_owned) else {
        return Ok(());
    };
    match documents.get(&id, database, collection).await {
        Ok(stored) => merge_stored(hit, &stored),
        Err(StoreError::NotFound(_)) => {
            warn!(id = %id, "Canonical record missing during hydration");
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

fn merge_stored(hit: &mut Value, stored: &Value) {
    let mut merged = hit["_source"].clone();
    match (merged.as_object_mut(), stored.as_object()) {
        (Some(target), Some(source)) => {
            for (key, value) in source {
                target.insert(key.clone(), value.clone());
            }
            hit["_source"] = merged;
        }
        _ => hit["_source"] = stored.clone(),
    }
}
