//! Query compiler.
//!
//! Compiles a compact, user-facing query string into a structured boolean
//! query under a per-type filter configuration. Pattern filters extract
//! values with regular expressions and strip their matches from a working
//! remainder; catch-all filters consume whatever text is left once every
//! pattern filter has run.
//!
//! Match extraction always runs against the pristine original query string.
//! Only the bookkeeping of "what is left over for catch-all filters" is
//! progressively stripped; a later filter's matches are not affected by an
//! earlier filter's stripping.

use regex::Regex;
use serde_json::{json, Map, Value};
use tracing::debug;

use indexing_shared::{FilterRule, TypeConfig};

use crate::errors::EngineError;
use crate::transform;

/// Compile a raw query string into a boolean query.
///
/// Returns `Ok(None)` for an empty or blank query: the caller's search
/// becomes an unfiltered request. For any other input the result is a single
/// `{"bool": {...}}` object.
pub fn compile(config: &TypeConfig, raw_query: &str) -> Result<Option<Value>, EngineError> {
    if raw_query.trim().is_empty() {
        return Ok(None);
    }
    debug!(query = raw_query, "compiling query");

    let mut bool_obj = Map::new();
    let mut remaining = raw_query.to_string();
    let mut catch_all: Vec<(&str, &FilterRule)> = Vec::new();

    for (name, rule) in &config.filters {
        let Some(pattern) = rule.pattern() else {
            // Applies to whatever the pattern filters leave behind.
            catch_all.push((name, rule));
            continue;
        };

        debug!(filter = %name, "applying filter");
        let re = Regex::new(pattern).map_err(|e| {
            EngineError::config(format!("Invalid regex in filter '{}': {}", name, e))
        })?;

        let values = extract_values(&re, rule.regex_group, raw_query)?;
        if !values.is_empty() {
            let (clause, payload) = build_contribution(rule, &values)?;
            append(&mut bool_obj, clause, payload)?;
        }
        remaining = re.replace_all(&remaining, "").into_owned();
    }

    let leftover = remaining.trim();
    if !leftover.is_empty() {
        for (name, rule) in catch_all {
            debug!(filter = %name, value = leftover, "applying catch-all filter");
            let (clause, payload) = build_contribution(rule, &[leftover.to_string()])?;
            append(&mut bool_obj, clause, payload)?;
        }
    }

    Ok(Some(json!({ "bool": bool_obj })))
}

/// Extract the values a pattern filter contributes.
///
/// Capture group 0 contributes at most the first whole match even if the
/// pattern matches several times; any other group contributes one value per
/// match, in order of occurrence.
fn extract_values(re: &Regex, group: usize, query: &str) -> Result<Vec<String>, EngineError> {
    let mut values = Vec::new();
    for caps in re.captures_iter(query) {
        let m = caps.get(group).ok_or_else(|| {
            EngineError::config(format!(
                "Capture group {} is not present in pattern '{}'",
                group,
                re.as_str()
            ))
        })?;
        values.push(m.as_str().to_owned());
    }
    if group == 0 {
        values.truncate(1);
    }
    Ok(values)
}

/// Build a filter rule's contribution: the clause name and the list of
/// sub-queries to attach under it.
fn build_contribution(
    rule: &FilterRule,
    values: &[String],
) -> Result<(String, Vec<Value>), EngineError> {
    let mut leaves = Vec::with_capacity(values.len());
    for value in values {
        let typed = match &rule.transform {
            Some(spec) => transform::apply(spec, value)?,
            None => Value::String(value.clone()),
        };
        leaves.push(build_leaf(rule, typed)?);
    }

    let payload = if leaves.len() == 1 {
        leaves
    } else {
        // Several matches of the same filter are OR'd together before being
        // attached under the filter's own clause.
        vec![json!({ "bool": { "should": leaves } })]
    };
    Ok((rule.clause.clone(), payload))
}

fn build_leaf(rule: &FilterRule, value: Value) -> Result<Value, EngineError> {
    let query = if rule.query_type.eq_ignore_ascii_case("multi_match") {
        json!({ "query": value, "fields": rule.fields })
    } else if rule.query_type.eq_ignore_ascii_case("range") {
        let field = rule
            .field
            .as_deref()
            .ok_or_else(|| EngineError::config("A range filter requires a 'field'"))?;
        let operator = rule
            .operator
            .as_deref()
            .ok_or_else(|| EngineError::config("A range filter requires an 'operator'"))?;
        let mut bounds = Map::new();
        bounds.insert(operator.to_owned(), value);
        let mut body = Map::new();
        body.insert(field.to_owned(), Value::Object(bounds));
        Value::Object(body)
    } else {
        return Err(EngineError::config(format!(
            "The following query type is not supported: {}",
            rule.query_type
        )));
    };

    let mut wrapped = Map::new();
    wrapped.insert(rule.query_type.clone(), query);
    Ok(Value::Object(wrapped))
}

/// Merge a contribution into the accumulated boolean query.
///
/// Every clause value this compiler produces is a list, so a clause that
/// already exists is extended. A non-list collision is an internal
/// consistency error.
fn append(
    bool_obj: &mut Map<String, Value>,
    clause: String,
    payload: Vec<Value>,
) -> Result<(), EngineError> {
    match bool_obj.get_mut(&clause) {
        None => {
            bool_obj.insert(clause, Value::Array(payload));
            Ok(())
        }
        Some(Value::Array(existing)) => {
            existing.extend(payload);
            Ok(())
        }
        Some(_) => Err(EngineError::config("Unsupported append operation")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexing_shared::TypeConfig;
    use serde_json::json;

    fn config(filters: Value) -> TypeConfig {
        TypeConfig::from_value(&json!({ "filters": filters })).unwrap()
    }

    fn val_filter_config() -> TypeConfig {
        config(json!({
            "val": {
                "regex": "val:(\\w+)",
                "regexGroup": 1,
                "clause": "must",
                "queryType": "multi_match",
                "fields": ["value"]
            }
        }))
    }

    #[test]
    fn test_blank_query_compiles_to_none() {
        let config = val_filter_config();
        assert_eq!(compile(&config, "").unwrap(), None);
        assert_eq!(compile(&config, "   ").unwrap(), None);
    }

    #[test]
    fn test_single_match() {
        let compiled = compile(&val_filter_config(), "val:10").unwrap().unwrap();
        assert_eq!(
            compiled,
            json!({
                "bool": {
                    "must": [
                        { "multi_match": { "query": "10", "fields": ["value"] } }
                    ]
                }
            })
        );
    }

    #[test]
    fn test_repeated_match_builds_should_group() {
        let compiled = compile(&val_filter_config(), "val:10 val:11")
            .unwrap()
            .unwrap();
        assert_eq!(
            compiled,
            json!({
                "bool": {
                    "must": [
                        { "bool": { "should": [
                            { "multi_match": { "query": "10", "fields": ["value"] } },
                            { "multi_match": { "query": "11", "fields": ["value"] } }
                        ] } }
                    ]
                }
            })
        );
    }

    #[test]
    fn test_group_zero_keeps_first_match_only() {
        let config = config(json!({
            "word": {
                "regex": "\\w+",
                "regexGroup": 0,
                "clause": "must",
                "queryType": "multi_match",
                "fields": ["_all"]
            }
        }));
        let compiled = compile(&config, "alpha beta").unwrap().unwrap();
        let must = compiled["bool"]["must"].as_array().unwrap();
        assert_eq!(must.len(), 1);
        assert_eq!(must[0]["multi_match"]["query"], "alpha");
    }

    #[test]
    fn test_non_matching_filter_contributes_nothing() {
        let compiled = compile(&val_filter_config(), "something else")
            .unwrap()
            .unwrap();
        assert_eq!(compiled, json!({ "bool": {} }));
    }

    #[test]
    fn test_catch_all_consumes_remainder() {
        let config = config(json!({
            "val": {
                "regex": "val:(\\w+)",
                "regexGroup": 1,
                "clause": "must",
                "queryType": "multi_match",
                "fields": ["value"]
            },
            "rest": {
                "clause": "must",
                "queryType": "multi_match",
                "fields": ["_all"]
            }
        }));

        let compiled = compile(&config, "val:10 leftover text").unwrap().unwrap();
        let must = compiled["bool"]["must"].as_array().unwrap();
        assert_eq!(must.len(), 2);
        assert_eq!(must[0]["multi_match"]["query"], "10");
        assert_eq!(must[1]["multi_match"]["query"], "leftover text");
        assert_eq!(must[1]["multi_match"]["fields"], json!(["_all"]));
    }

    #[test]
    fn test_catch_all_skipped_when_remainder_blank() {
        let config = config(json!({
            "val": {
                "regex": "val:(\\w+)",
                "regexGroup": 1,
                "clause": "must",
                "queryType": "multi_match",
                "fields": ["value"]
            },
            "rest": {
                "clause": "should",
                "queryType": "multi_match",
                "fields": ["_all"]
            }
        }));

        let compiled = compile(&config, " val:10  ").unwrap().unwrap();
        assert!(compiled["bool"].get("should").is_none());
        assert_eq!(compiled["bool"]["must"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_matching_runs_against_original_text() {
        // The first filter strips digits; the second still matches them
        // because extraction runs against the pristine query.
        let config = config(json!({
            "digits": {
                "regex": "[0-9]+",
                "regexGroup": 0,
                "clause": "must",
                "queryType": "multi_match",
                "fields": ["num"]
            },
            "tagged": {
                "regex": "x([0-9]+)",
                "regexGroup": 1,
                "clause": "filter",
                "queryType": "multi_match",
                "fields": ["tag"]
            }
        }));

        let compiled = compile(&config, "x42").unwrap().unwrap();
        assert_eq!(compiled["bool"]["must"][0]["multi_match"]["query"], "42");
        assert_eq!(compiled["bool"]["filter"][0]["multi_match"]["query"], "42");
    }

    #[test]
    fn test_range_filter() {
        let config = config(json!({
            "since": {
                "regex": "since:([0-9]{8})",
                "regexGroup": 1,
                "clause": "filter",
                "queryType": "range",
                "field": "published",
                "operator": "gte",
                "transform": { "from": "date", "to": "timestamp", "format": "yyyyMMdd" }
            }
        }));

        let compiled = compile(&config, "since:20230101").unwrap().unwrap();
        assert_eq!(
            compiled["bool"]["filter"][0],
            json!({ "range": { "published": { "gte": 1_672_531_200_000_i64 } } })
        );
    }

    #[test]
    fn test_unsupported_query_type_is_config_error() {
        let config = config(json!({
            "bad": {
                "regex": "(\\w+)",
                "regexGroup": 1,
                "clause": "must",
                "queryType": "term",
                "fields": ["value"]
            }
        }));

        let err = compile(&config, "anything").unwrap_err();
        assert!(matches!(err, EngineError::Config(msg) if msg.contains("term")));
    }

    #[test]
    fn test_two_filters_share_a_clause() {
        let config = config(json!({
            "a": {
                "regex": "a:(\\w+)",
                "regexGroup": 1,
                "clause": "must",
                "queryType": "multi_match",
                "fields": ["a"]
            },
            "b": {
                "regex": "b:(\\w+)",
                "regexGroup": 1,
                "clause": "must",
                "queryType": "multi_match",
                "fields": ["b"]
            }
        }));

        let compiled = compile(&config, "a:1 b:2").unwrap().unwrap();
        let must = compiled["bool"]["must"].as_array().unwrap();
        assert_eq!(must.len(), 2);
        assert_eq!(must[0]["multi_match"]["fields"], json!(["a"]));
        assert_eq!(must[1]["multi_match"]["fields"], json!(["b"]));
    }

    #[test]
    fn test_missing_capture_group_is_config_error() {
        let config = config(json!({
            "bad": {
                "regex": "val:\\w+",
                "regexGroup": 3,
                "clause": "must",
                "queryType": "multi_match",
                "fields": ["value"]
            }
        }));

        let err = compile(&config, "val:10").unwrap_err();
        assert!(matches!(err, EngineError::Config(msg) if msg.contains("group 3")));
    }

    #[test]
    fn test_append_rejects_non_list_clause() {
        let mut bool_obj = Map::new();
        bool_obj.insert("must".to_string(), json!("scalar"));
        let err = append(&mut bool_obj, "must".to_string(), vec![json!({})]).unwrap_err();
        assert!(matches!(err, EngineError::Config(msg) if msg.contains("append")));
    }
}
