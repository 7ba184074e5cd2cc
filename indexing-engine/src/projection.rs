//! Document projection engine.
//!
//! Applies a type configuration's declarative mapping to a document before
//! it is submitted to the search index: `$set` rules derive new fields from
//! existing ones via path expressions, `$unset` rules delete fields.
//!
//! All `$set` sources are resolved against a snapshot of the document taken
//! before the pass, so rules never observe each other's output; `$unset`
//! runs after `$set`, so a derived field can outlive its deleted sources.

use serde_json::Value;
use tracing::debug;

use indexing_shared::{SetRule, TypeConfig};

use crate::errors::EngineError;
use crate::path;
use crate::transform;

/// Apply the configuration's mapping to the document in place.
///
/// A configuration without a mapping is a no-op.
pub fn project(document: &mut Value, config: &TypeConfig) -> Result<(), EngineError> {
    let Some(mapping) = &config.mapping else {
        debug!("no mapping configured, skipping projection");
        return Ok(());
    };

    if !mapping.set.is_empty() {
        let snapshot = document.clone();
        for (destination, rule) in &mapping.set {
            set_field(document, &snapshot, destination, rule)?;
        }
    }

    for key in &mapping.unset {
        path::unset(document, key);
    }

    Ok(())
}

fn set_field(
    document: &mut Value,
    snapshot: &Value,
    destination: &str,
    rule: &SetRule,
) -> Result<(), EngineError> {
    let concatenated = collect_value(snapshot, rule)?;
    let value = match &rule.transform {
        Some(spec) => transform::apply(spec, &concatenated)?,
        None => Value::String(concatenated),
    };

    let (container, leaf) = match destination.rsplit_once('.') {
        Some((parent, leaf)) => (path::get_or_create(document, parent)?, leaf),
        None => {
            let map = document.as_object_mut().ok_or_else(|| {
                EngineError::config("Cannot project into a document that is not an object")
            })?;
            (map, destination)
        }
    };
    container.insert(leaf.to_owned(), value);
    Ok(())
}

/// Concatenate every scalar string the rule's source paths resolve to,
/// appending the separator after each contribution (the trailing separator
/// is deliberately preserved). Paths that resolve to nothing are skipped.
fn collect_value(snapshot: &Value, rule: &SetRule) -> Result<String, EngineError> {
    let mut out = String::new();
    for expr in &rule.fields {
        match path::read(snapshot, expr)? {
            Some(value) => append_value(&mut out, &value, &rule.separator),
            None => debug!(path = %expr, "source path not found"),
        }
    }
    Ok(out)
}

fn append_value(out: &mut String, value: &Value, separator: &str) {
    match value {
        Value::Array(items) => {
            for item in items {
                append_value(out, item, separator);
            }
        }
        Value::String(s) if !s.is_empty() => {
            out.push_str(s);
            out.push_str(separator);
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexing_shared::TypeConfig;
    use serde_json::json;

    fn config(mapping: Value) -> TypeConfig {
        TypeConfig::from_value(&json!({ "mapping": mapping })).unwrap()
    }

    #[test]
    fn test_set_concatenates_with_trailing_separator() {
        let config = config(json!({
            "$set": {
                "full_name": { "fields": ["$.first", "$.last"], "separator": " " }
            }
        }));

        let mut doc = json!({"first": "A", "last": "B"});
        project(&mut doc, &config).unwrap();

        assert_eq!(doc["full_name"], json!("A B "));
        assert_eq!(doc["first"], json!("A"));
        assert_eq!(doc["last"], json!("B"));
    }

    #[test]
    fn test_set_flattens_list_results() {
        let config = config(json!({
            "$set": {
                "all_tags": { "fields": ["$.tags[*]"], "separator": "," }
            }
        }));

        let mut doc = json!({"tags": ["red", "green", "blue"]});
        project(&mut doc, &config).unwrap();

        assert_eq!(doc["all_tags"], json!("red,green,blue,"));
    }

    #[test]
    fn test_set_skips_missing_sources() {
        let config = config(json!({
            "$set": {
                "combined": { "fields": ["$.present", "$.absent"], "separator": "-" }
            }
        }));

        let mut doc = json!({"present": "yes"});
        project(&mut doc, &config).unwrap();

        assert_eq!(doc["combined"], json!("yes-"));
    }

    #[test]
    fn test_set_with_transform() {
        let config = config(json!({
            "$set": {
                "published_ts": {
                    "fields": ["$.published"],
                    "transform": { "from": "date", "to": "timestamp", "format": "yyyyMMdd" }
                }
            }
        }));

        let mut doc = json!({"published": "20230101"});
        project(&mut doc, &config).unwrap();

        assert_eq!(doc["published_ts"], json!(1_672_531_200_000_i64));
    }

    #[test]
    fn test_set_into_nested_destination() {
        let config = config(json!({
            "$set": {
                "search.display": { "fields": ["$.name"] }
            }
        }));

        let mut doc = json!({"name": "thing"});
        project(&mut doc, &config).unwrap();

        assert_eq!(doc["search"]["display"], json!("thing"));
    }

    #[test]
    fn test_set_sources_resolve_against_snapshot() {
        // The second rule reads a field the first rule overwrites; it must
        // see the original value.
        let config = config(json!({
            "$set": {
                "name": { "fields": ["$.name"], "separator": "!" },
                "copy": { "fields": ["$.name"] }
            }
        }));

        let mut doc = json!({"name": "orig"});
        project(&mut doc, &config).unwrap();

        assert_eq!(doc["name"], json!("orig!"));
        assert_eq!(doc["copy"], json!("orig"));
    }

    #[test]
    fn test_project_is_idempotent_for_disjoint_sources() {
        let config = config(json!({
            "$set": {
                "full_name": { "fields": ["$.first", "$.last"], "separator": " " }
            }
        }));

        let mut doc = json!({"first": "A", "last": "B"});
        project(&mut doc, &config).unwrap();
        let once = doc.clone();
        project(&mut doc, &config).unwrap();

        assert_eq!(doc, once);
    }

    #[test]
    fn test_unset_removes_sources_after_set() {
        let config = config(json!({
            "$set": {
                "full_name": { "fields": ["$.first", "$.last"], "separator": " " }
            },
            "$unset": ["first", "last", "internal.secret"]
        }));

        let mut doc = json!({"first": "A", "last": "B", "internal": {"secret": 1, "kept": 2}});
        project(&mut doc, &config).unwrap();

        assert_eq!(doc["full_name"], json!("A B "));
        assert!(doc.get("first").is_none());
        assert!(doc.get("last").is_none());
        assert!(doc["internal"].get("secret").is_none());
        assert_eq!(doc["internal"]["kept"], json!(2));
    }

    #[test]
    fn test_unset_missing_path_is_noop() {
        let config = config(json!({ "$unset": ["nope", "deep.gone"] }));

        let mut doc = json!({"kept": true});
        project(&mut doc, &config).unwrap();

        assert_eq!(doc, json!({"kept": true}));
    }

    #[test]
    fn test_no_mapping_is_noop() {
        let config = TypeConfig::from_value(&json!({})).unwrap();
        let mut doc = json!({"kept": true});
        project(&mut doc, &config).unwrap();
        assert_eq!(doc, json!({"kept": true}));
    }

    #[test]
    fn test_non_string_scalars_do_not_contribute() {
        let config = config(json!({
            "$set": {
                "combined": { "fields": ["$.name", "$.count"], "separator": "/" }
            }
        }));

        let mut doc = json!({"name": "x", "count": 7});
        project(&mut doc, &config).unwrap();

        assert_eq!(doc["combined"], json!("x/"));
    }
}
