//! Object-type configuration model.
//!
//! Configurations are stored as free-form JSON documents in the configuration
//! store. This module parses them into typed structs so that the engines fail
//! predictably on malformed input instead of panicking on dynamic casts.
//!
//! Declaration order of `filters` and `mapping.$set` entries determines
//! evaluation order, so both are kept as ordered vectors (`serde_json` is
//! built with `preserve_order` to retain the document's key order).

use serde::Deserialize;
use serde_json::Value;

use crate::errors::ConfigError;

/// A single filter rule of the query compiler.
///
/// A rule with a string `regex` is a *pattern filter*: values are extracted
/// from the raw query string with the expression and the matched text is
/// stripped from the remainder. A rule without one is a *catch-all filter*
/// that consumes whatever text is left over after all pattern filters ran.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterRule {
    /// Extraction pattern. Non-string values are tolerated and make the rule
    /// a catch-all, mirroring the configuration corpus this model grew from.
    #[serde(default)]
    pub regex: Option<Value>,
    /// Capture group the extracted value is taken from.
    #[serde(default)]
    pub regex_group: usize,
    /// Boolean-query clause the compiled sub-query is attached under
    /// (e.g. "must", "should", "filter").
    pub clause: String,
    /// Leaf query kind: "multi_match" or "range".
    pub query_type: String,
    /// Target fields for `multi_match` queries.
    #[serde(default)]
    pub fields: Vec<String>,
    /// Target field for `range` queries.
    #[serde(default)]
    pub field: Option<String>,
    /// Range operator (e.g. "gte", "lt").
    #[serde(default)]
    pub operator: Option<String>,
    /// Optional value conversion applied to each extracted value.
    #[serde(default)]
    pub transform: Option<TransformSpec>,
}

impl FilterRule {
    /// The extraction pattern, if this is a pattern filter.
    pub fn pattern(&self) -> Option<&str> {
        self.regex.as_ref().and_then(Value::as_str)
    }

    /// Whether this rule extracts values with a regular expression.
    pub fn is_pattern(&self) -> bool {
        self.pattern().is_some()
    }
}

/// Typed value conversion spec (`{from, to, ...}`).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformSpec {
    /// Source kind: "date" or "string".
    pub from: String,
    /// Target kind: "timestamp" or "string".
    pub to: String,
    /// Date-parsing pattern, required for `date` -> `timestamp`.
    #[serde(default)]
    pub format: Option<String>,
    /// Substitution pattern for `string` -> `string`.
    #[serde(default)]
    pub regex: Option<String>,
    /// Substitution replacement, defaults to the empty string.
    #[serde(default)]
    pub replacement: Option<String>,
}

/// A `$set` rule: derive a destination field from source path expressions.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetRule {
    /// Source path expressions, resolved against the original document.
    pub fields: Vec<String>,
    /// Separator appended after every contributing value.
    #[serde(default)]
    pub separator: String,
    /// Optional conversion of the concatenated value.
    #[serde(default)]
    pub transform: Option<TransformSpec>,
}

/// Declarative projection applied to a document before it is indexed.
#[derive(Debug, Clone, Default)]
pub struct Mapping {
    /// Destination path -> set rule, in declaration order.
    pub set: Vec<(String, SetRule)>,
    /// Field paths to delete, in declaration order.
    pub unset: Vec<String>,
}

/// Per-object-type configuration driving the indexing service.
///
/// The identification fields (`mongo.database`, `mongo.collection`,
/// `elastic.index`, `elastic.type`) are optional at parse time because not
/// every operation needs all of them; the accessors return a
/// [`ConfigError::MissingField`] when an operation requires one that is
/// absent or empty.
#[derive(Debug, Clone, Default)]
pub struct TypeConfig {
    database: Option<String>,
    collection: Option<String>,
    index: Option<String>,
    doc_type: Option<String>,
    /// Filter name -> rule, in declaration order.
    pub filters: Vec<(String, FilterRule)>,
    /// Projection mapping, if configured.
    pub mapping: Option<Mapping>,
    /// Extra keys merged verbatim into the search request body.
    pub append_to_query: Option<serde_json::Map<String, Value>>,
}

impl TypeConfig {
    /// Parse a configuration document.
    pub fn from_value(value: &Value) -> Result<Self, ConfigError> {
        let root = value
            .as_object()
            .ok_or_else(|| ConfigError::invalid("configuration must be a JSON object"))?;

        let string_at = |outer: &str, inner: &str| -> Option<String> {
            root.get(outer)
                .and_then(|v| v.get(inner))
                .and_then(Value::as_str)
                .map(str::to_owned)
        };

        let mut filters = Vec::new();
        if let Some(section) = root.get("filters") {
            let entries = section
                .as_object()
                .ok_or_else(|| ConfigError::invalid("'filters' must be a JSON object"))?;
            for (name, raw) in entries {
                let rule: FilterRule = serde_json::from_value(raw.clone())
                    .map_err(|e| ConfigError::invalid(format!("filter '{}': {}", name, e)))?;
                filters.push((name.clone(), rule));
            }
        }

        let mapping = match root.get("mapping") {
            Some(section) => Some(Self::parse_mapping(section)?),
            None => None,
        };

        let append_to_query = match root.get("appendToQuery") {
            Some(section) => Some(
                section
                    .as_object()
                    .cloned()
                    .ok_or_else(|| ConfigError::invalid("'appendToQuery' must be a JSON object"))?,
            ),
            None => None,
        };

        Ok(Self {
            database: string_at("mongo", "database"),
            collection: string_at("mongo", "collection"),
            index: string_at("elastic", "index"),
            doc_type: string_at("elastic", "type"),
            filters,
            mapping,
            append_to_query,
        })
    }

    fn parse_mapping(section: &Value) -> Result<Mapping, ConfigError> {
        let entries = section
            .as_object()
            .ok_or_else(|| ConfigError::invalid("'mapping' must be a JSON object"))?;

        let mut set = Vec::new();
        if let Some(rules) = entries.get("$set") {
            let rules = rules
                .as_object()
                .ok_or_else(|| ConfigError::invalid("'mapping.$set' must be a JSON object"))?;
            for (path, raw) in rules {
                let rule: SetRule = serde_json::from_value(raw.clone())
                    .map_err(|e| ConfigError::invalid(format!("set rule '{}': {}", path, e)))?;
                set.push((path.clone(), rule));
            }
        }

        let mut unset = Vec::new();
        if let Some(paths) = entries.get("$unset") {
            let paths = paths
                .as_array()
                .ok_or_else(|| ConfigError::invalid("'mapping.$unset' must be a JSON array"))?;
            for path in paths {
                let path = path
                    .as_str()
                    .ok_or_else(|| ConfigError::invalid("'mapping.$unset' entries must be strings"))?;
                unset.push(path.to_owned());
            }
        }

        Ok(Mapping { set, unset })
    }

    /// Document-store database name.
    pub fn database(&self) -> Result<&str, ConfigError> {
        Self::required(&self.database, "database")
    }

    /// Document-store collection name.
    pub fn collection(&self) -> Result<&str, ConfigError> {
        Self::required(&self.collection, "collection")
    }

    /// Search-engine index name.
    pub fn index(&self) -> Result<&str, ConfigError> {
        Self::required(&self.index, "index")
    }

    /// Search-engine document type name.
    pub fn doc_type(&self) -> Result<&str, ConfigError> {
        Self::required(&self.doc_type, "type")
    }

    fn required<'a>(
        field: &'a Option<String>,
        name: &'static str,
    ) -> Result<&'a str, ConfigError> {
        match field.as_deref() {
            Some(v) if !v.is_empty() => Ok(v),
            _ => Err(ConfigError::MissingField(name)),
        }
    }
}
