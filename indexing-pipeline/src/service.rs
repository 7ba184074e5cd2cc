//! Indexing orchestrator.
//!
//! [`IndexingService`] wires the per-type configuration store, the document
//! store and the search engine together. It owns no indexing logic of its
//! own: queries are compiled by `indexing_engine::query`, documents are
//! shaped by `indexing_engine::projection`, and this service sequences the
//! collaborator calls around them.

use std::sync::Arc;

use regex::Regex;
use serde_json::{json, Value};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use indexing_engine::{compile, project};
use indexing_repository::{ConfigStore, DocumentStore, SearchEngine, StoreError};
use indexing_shared::TypeConfig;

use crate::config::ServiceConfig;
use crate::errors::IndexingError;
use crate::hydrate::{hydrate_hit, hydrate_hits};

/// Result of indexing a single object.
#[derive(Debug, Clone)]
pub struct IndexOutcome {
    /// The projected document as submitted to the search engine.
    pub document: Value,
    /// The search engine's indexing response.
    pub response: Value,
}

/// Result of a bulk indexing request.
#[derive(Debug, Clone)]
pub struct BulkOutcome {
    /// Search engine responses for each indexed document, in request order.
    pub indexed: Vec<Value>,
}

/// Options for a search request.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Offset of the first hit to return.
    pub from: usize,
    /// Maximum number of hits to return.
    pub size: usize,
    /// Scroll cursor time-to-live (e.g. "1m"); opens a scroll when set.
    pub scroll: Option<String>,
    /// Whether to replace hit sources with the canonical stored records.
    pub hydrate: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            from: 0,
            size: 100,
            scroll: None,
            hydrate: false,
        }
    }
}

/// The indexing service.
pub struct IndexingService {
    configs: Arc<dyn ConfigStore>,
    documents: Arc<dyn DocumentStore>,
    search: Arc<dyn SearchEngine>,
    config: ServiceConfig,
    name_pattern: Regex,
}

impl IndexingService {
    /// Create a service with the default configuration.
    pub fn new(
        configs: Arc<dyn ConfigStore>,
        documents: Arc<dyn DocumentStore>,
        search: Arc<dyn SearchEngine>,
    ) -> Result<Self, IndexingError> {
        Self::with_config(configs, documents, search, ServiceConfig::default())
    }

    /// Create a service with a custom configuration.
    pub fn with_config(
        configs: Arc<dyn ConfigStore>,
        documents: Arc<dyn DocumentStore>,
        search: Arc<dyn SearchEngine>,
        config: ServiceConfig,
    ) -> Result<Self, IndexingError> {
        let name_pattern = Regex::new(&config.config_name_pattern).map_err(|e| {
            IndexingError::config(format!(
                "Invalid configuration name pattern '{}': {}",
                config.config_name_pattern, e
            ))
        })?;
        Ok(Self {
            configs,
            documents,
            search,
            config,
            name_pattern,
        })
    }

    /// Load and parse the configuration for an object type.
    async fn load_config(&self, name: &str) -> Result<TypeConfig, IndexingError> {
        if !self.configs.exists(name).await? {
            return Err(IndexingError::not_found(format!(
                "The configuration for the following object type doesn't exist: {}",
                name
            )));
        }
        let raw = self.configs.get(name).await?;
        Ok(TypeConfig::from_value(&raw)?)
    }

    /// Project and index a single object from the document store.
    #[instrument(skip(self))]
    pub async fn index_object(
        &self,
        config_name: &str,
        id: &str,
    ) -> Result<IndexOutcome, IndexingError> {
        let config = self.load_config(config_name).await?;
        let database = config.database()?;
        let collection = config.collection()?;

        if !self.documents.exists(id, database, collection).await? {
            return Err(IndexingError::not_found(
                "The following object doesn't exist.",
            ));
        }
        let mut document = self.documents.get(id, database, collection).await?;
        project(&mut document, &config)?;

        let response = self
            .search
            .put_document(config.index()?, config.doc_type()?, id, &document)
            .await?;
        info!(config = %config_name, id = %id, "Indexed object");
        Ok(IndexOutcome { document, response })
    }

    /// Project and index a batch of objects in one document-store round trip.
    ///
    /// The id limit is enforced before any collaborator is contacted.
    #[instrument(skip(self, ids), fields(count = ids.len()))]
    pub async fn index_bulk(
        &self,
        config_name: &str,
        ids: &[String],
    ) -> Result<BulkOutcome, IndexingError> {
        if ids.len() > self.config.max_bulk_ids {
            return Err(IndexingError::PayloadTooLarge {
                provided: ids.len(),
                max: self.config.max_bulk_ids,
            });
        }

        let config = self.load_config(config_name).await?;
        let database = config.database()?;
        let collection = config.collection()?;
        let index = config.index()?;
        let doc_type = config.doc_type()?;

        let filter = json!({ "_id": { "$in": ids } });
        let page = self
            .documents
            .find(&filter, database, collection, 0, ids.len())
            .await?;

        let mut indexed = Vec::with_capacity(page.items.len());
        for mut item in page.items {
            let Some(id) = item_id(&item) else {
                warn!(config = %config_name, "Skipping bulk item without an id");
                continue;
            };
            project(&mut item, &config)?;
            let response = self.search.put_document(index, doc_type, &id, &item).await?;
            indexed.push(response);
        }
        info!(config = %config_name, indexed = indexed.len(), "Bulk indexing complete");
        Ok(BulkOutcome { indexed })
    }

    /// Reindex every document of a collection in the background.
    ///
    /// Configuration problems are reported synchronously; the paging and
    /// indexing itself runs on a spawned task. Individual record failures
    /// are logged and skipped so one bad document cannot stall the run.
    #[instrument(skip(self))]
    pub async fn reindex_all(
        &self,
        config_name: &str,
    ) -> Result<JoinHandle<()>, IndexingError> {
        let config = self.load_config(config_name).await?;
        let database = config.database()?.to_owned();
        let collection = config.collection()?.to_owned();
        let index = config.index()?.to_owned();
        let doc_type = config.doc_type()?.to_owned();

        let documents = Arc::clone(&self.documents);
        let search = Arc::clone(&self.search);
        let page_size = self.config.reindex_page_size;
        let name = config_name.to_owned();

        let handle = tokio::spawn(async move {
            let filter = json!({});
            let total = match documents.count(&filter, &database, &collection).await {
                Ok(n) => n,
                Err(e) => {
                    error!(config = %name, error = %e, "Failed to count collection for reindex");
                    return;
                }
            };
            info!(config = %name, total, "Starting full reindex");

            let mut offset = 0;
            let mut indexed = 0usize;
            let mut failed = 0usize;
            while offset < total {
                let page = match documents
                    .find(&filter, &database, &collection, offset, page_size)
                    .await
                {
                    Ok(page) => page,
                    Err(e) => {
                        error!(config = %name, offset, error = %e, "Failed to fetch reindex page");
                        return;
                    }
                };
                if page.items.is_empty() {
                    break;
                }

                for mut item in page.items {
                    let Some(id) = item_id(&item) else {
                        warn!(config = %name, "Skipping record without an id");
                        failed += 1;
                        continue;
                    };
                    if let Err(e) = project(&mut item, &config) {
                        error!(config = %name, id = %id, error = %e, "Failed to project record");
                        failed += 1;
                        continue;
                    }
                    match search.put_document(&index, &doc_type, &id, &item).await {
                        Ok(_) => indexed += 1,
                        Err(e) => {
                            error!(config = %name, id = %id, error = %e, "Failed to index record");
                            failed += 1;
                        }
                    }
                }
                offset += page_size;
            }
            info!(config = %name, indexed, failed, "Full reindex complete");
        });
        Ok(handle)
    }

    /// Fetch an indexed object, optionally hydrating its source.
    #[instrument(skip(self))]
    pub async fn get_object(
        &self,
        config_name: &str,
        id: &str,
        hydrate: bool,
    ) -> Result<Value, IndexingError> {
        let config = self.load_config(config_name).await?;
        let mut response = self
            .search
            .get_document(config.index()?, config.doc_type()?, id)
            .await?;

        if hydrate {
            hydrate_hit(
                &mut response,
                self.documents.as_ref(),
                config.database()?,
                config.collection()?,
            )
            .await?;
        }
        Ok(response)
    }

    /// Compile and run a search under an object type's configuration.
    ///
    /// The compiled query is attached to the response under `"query"` so
    /// callers can see how their search string was interpreted.
    #[instrument(skip(self, options))]
    pub async fn search(
        &self,
        config_name: &str,
        query: &str,
        options: &SearchOptions,
    ) -> Result<Value, IndexingError> {
        let config = self.load_config(config_name).await?;
        let index = config.index()?;

        let compiled = compile(&config, query)?;
        let mut body = json!({ "from": options.from, "size": options.size });
        if let Some(query_obj) = &compiled {
            body["query"] = query_obj.clone();
        }
        if let Some(append) = &config.append_to_query {
            for (key, value) in append {
                body[key.as_str()] = value.clone();
            }
        }
        debug!(config = %config_name, body = %body, "Running search");

        let mut response = self
            .search
            .search(index, &body, options.scroll.as_deref())
            .await?;
        if let Some(query_obj) = compiled {
            response["query"] = query_obj;
        }

        if options.hydrate {
            hydrate_hits(
                &mut response,
                self.documents.as_ref(),
                config.database()?,
                config.collection()?,
            )
            .await?;
        }
        Ok(response)
    }

    /// Fetch the next page of an open scroll cursor.
    #[instrument(skip(self))]
    pub async fn continue_scroll(
        &self,
        config_name: &str,
        scroll_id: &str,
        ttl: &str,
        hydrate: bool,
    ) -> Result<Value, IndexingError> {
        let config = self.load_config(config_name).await?;
        let mut response = self
            .search
            .continue_scroll(scroll_id, ttl)
            .await
            .map_err(classify_scroll_failure)?;

        if hydrate {
            hydrate_hits(
                &mut response,
                self.documents.as_ref(),
                config.database()?,
                config.collection()?,
            )
            .await?;
        }
        Ok(response)
    }

    /// Release a scroll cursor.
    #[instrument(skip(self))]
    pub async fn close_scroll(&self, scroll_id: &str) -> Result<Value, IndexingError> {
        self.search
            .close_scroll(scroll_id)
            .await
            .map_err(classify_scroll_failure)
    }

    /// Define the mapping of an object type's index.
    #[instrument(skip(self, payload))]
    pub async fn put_mapping(
        &self,
        config_name: &str,
        payload: &Value,
    ) -> Result<Value, IndexingError> {
        let config = self.load_config(config_name).await?;
        self.search
            .put_mapping(config.index()?, config.doc_type()?, payload)
            .await
            .map_err(|e| classify_index_failure(e, "This index doesn't exist."))
    }

    /// Create an object type's index.
    #[instrument(skip(self))]
    pub async fn create_index(&self, config_name: &str) -> Result<Value, IndexingError> {
        let config = self.load_config(config_name).await?;
        match self.search.create_index(config.index()?).await {
            Ok(response) => Ok(response),
            Err(e) => {
                if e.search_failure()
                    .is_some_and(|f| f.is_index_already_exists())
                {
                    Err(IndexingError::AlreadyExists(
                        "This index already exists.".to_string(),
                    ))
                } else {
                    Err(e.into())
                }
            }
        }
    }

    /// Delete an object type's index.
    #[instrument(skip(self))]
    pub async fn delete_index(&self, config_name: &str) -> Result<Value, IndexingError> {
        let config = self.load_config(config_name).await?;
        self.search
            .delete_index(config.index()?)
            .await
            .map_err(|e| classify_index_failure(e, "This index doesn't exist."))
    }

    /// Create or update an object type's configuration.
    ///
    /// Returns `true` when the configuration was created, `false` when an
    /// existing one was replaced.
    #[instrument(skip(self, payload))]
    pub async fn upsert_config(
        &self,
        name: &str,
        payload: Value,
    ) -> Result<bool, IndexingError> {
        if !self.name_pattern.is_match(name) {
            return Err(IndexingError::config(format!(
                "The configuration name is not valid, it must match the following expression: {}",
                self.config.config_name_pattern
            )));
        }
        Ok(self.configs.upsert(name, payload).await?)
    }

    /// Fetch an object type's configuration.
    pub async fn get_config(&self, name: &str) -> Result<Value, IndexingError> {
        if !self.configs.exists(name).await? {
            return Err(IndexingError::not_found("This configuration doesn't exist."));
        }
        Ok(self.configs.get(name).await?)
    }

    /// Delete an object type's configuration.
    #[instrument(skip(self))]
    pub async fn delete_config(&self, name: &str) -> Result<(), IndexingError> {
        if !self.configs.exists(name).await? {
            return Err(IndexingError::not_found("This configuration doesn't exist."));
        }
        Ok(self.configs.delete(name).await?)
    }
}

/// Extract the id of a stored document: either a plain `_id` string or an
/// extended `{"$oid": "..."}` object.
fn item_id(document: &Value) -> Option<String> {
    match &document["_id"] {
        Value::String(s) => Some(s.clone()),
        other => other["$oid"].as_str().map(str::to_owned),
    }
}

/// Classify a scroll failure.
///
/// A structured invalid-parameter cause means the request itself was bad;
/// an unstructured failure means the engine no longer knows the scroll id.
fn classify_scroll_failure(e: StoreError) -> IndexingError {
    match e {
        StoreError::Structured(failure) if failure.is_invalid_parameter() => {
            let reason = failure
                .root_cause_reason()
                .or_else(|| failure.reason())
                .unwrap_or("invalid scroll request")
                .to_owned();
            IndexingError::InvalidParameter(reason)
        }
        StoreError::Failure(_) => {
            IndexingError::not_found("This scroll identifier doesn't exist")
        }
        other => other.into(),
    }
}

fn classify_index_failure(e: StoreError, not_found_message: &str) -> IndexingError {
    if e.search_failure().is_some_and(|f| f.is_index_not_found()) {
        IndexingError::not_found(not_found_message)
    } else {
        e.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexing_repository::SearchFailure;

    #[test]
    fn test_item_id_variants() {
        assert_eq!(item_id(&json!({"_id": "abc"})), Some("abc".to_string()));
        assert_eq!(
            item_id(&json!({"_id": {"$oid": "507f1f77bcf86cd799439011"}})),
            Some("507f1f77bcf86cd799439011".to_string())
        );
        assert_eq!(item_id(&json!({"name": "no id"})), None);
        assert_eq!(item_id(&json!({"_id": 42})), None);
    }

    #[test]
    fn test_scroll_failure_classification() {
        let invalid = StoreError::Structured(SearchFailure::of_type(
            "illegal_argument_exception",
            "Failed to parse scrollId",
        ));
        assert!(matches!(
            classify_scroll_failure(invalid),
            IndexingError::InvalidParameter(reason) if reason == "Failed to parse scrollId"
        ));

        let unknown = StoreError::failure("boom");
        assert!(matches!(
            classify_scroll_failure(unknown),
            IndexingError::NotFound(msg) if msg == "This scroll identifier doesn't exist"
        ));

        let other = StoreError::Structured(SearchFailure::of_type(
            "index_not_found_exception",
            "no such index",
        ));
        assert!(matches!(
            classify_scroll_failure(other),
            IndexingError::Collaborator(_)
        ));
    }

    #[test]
    fn test_index_failure_classification() {
        let missing = StoreError::Structured(SearchFailure::of_type(
            "index_not_found_exception",
            "no such index",
        ));
        assert!(matches!(
            classify_index_failure(missing, "This index doesn't exist."),
            IndexingError::NotFound(msg) if msg == "This index doesn't exist."
        ));

        let opaque = StoreError::failure("boom");
        assert!(matches!(
            classify_index_failure(opaque, "This index doesn't exist."),
            IndexingError::Collaborator(_)
        ));
    }
}
