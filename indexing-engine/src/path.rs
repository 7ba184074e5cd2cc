//! Path resolution over JSON documents.
//!
//! Two kinds of paths are used by the engines:
//!
//! - *Path expressions* on the source side (`$.a.b`, `$.tags[*]`, `$.list[0]`,
//!   `$['odd key']`), resolved read-only by [`read`]. Matching zero nodes is a
//!   distinguishable not-found outcome, not an error; a malformed expression
//!   is a configuration error.
//! - *Dotted paths* on the target side (`a.b.c`), walked by [`get_or_create`]
//!   and [`unset`]. `get_or_create` creates empty object nodes for missing
//!   intermediate segments; it never creates arrays, and an intermediate that
//!   exists but is not an object is rejected as a configuration error.

use serde_json::{Map, Value};

use crate::errors::EngineError;

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Key(String),
    Index(usize),
    Wildcard,
}

fn malformed(expr: &str) -> EngineError {
    EngineError::config(format!("Malformed path expression: '{}'", expr))
}

fn parse_expression(expr: &str) -> Result<Vec<Segment>, EngineError> {
    let mut rest = expr.strip_prefix('$').unwrap_or(expr);
    let mut segments = Vec::new();

    while !rest.is_empty() {
        if let Some(tail) = rest.strip_prefix('.') {
            let end = tail.find(['.', '[']).unwrap_or(tail.len());
            let key = &tail[..end];
            if key.is_empty() {
                return Err(malformed(expr));
            }
            segments.push(if key == "*" {
                Segment::Wildcard
            } else {
                Segment::Key(key.to_owned())
            });
            rest = &tail[end..];
        } else if let Some(tail) = rest.strip_prefix('[') {
            let close = tail.find(']').ok_or_else(|| malformed(expr))?;
            let inner = &tail[..close];
            let segment = if inner == "*" {
                Segment::Wildcard
            } else if (inner.starts_with('\'') && inner.ends_with('\'') && inner.len() >= 2)
                || (inner.starts_with('"') && inner.ends_with('"') && inner.len() >= 2)
            {
                Segment::Key(inner[1..inner.len() - 1].to_owned())
            } else {
                Segment::Index(inner.parse().map_err(|_| malformed(expr))?)
            };
            segments.push(segment);
            rest = &tail[close + 1..];
        } else {
            // Bare leading segment, e.g. "first" instead of "$.first".
            let end = rest.find(['.', '[']).unwrap_or(rest.len());
            segments.push(Segment::Key(rest[..end].to_owned()));
            rest = &rest[end..];
        }
    }

    if segments.is_empty() {
        return Err(malformed(expr));
    }
    Ok(segments)
}

/// Resolve a path expression against a document.
///
/// Returns `Ok(None)` when the expression matches no node. A wildcard
/// segment always yields a list result, even for a single match.
pub fn read(document: &Value, expr: &str) -> Result<Option<Value>, EngineError> {
    let segments = parse_expression(expr)?;

    let mut nodes: Vec<&Value> = vec![document];
    let mut multi = false;
    for segment in &segments {
        let mut next = Vec::new();
        match segment {
            Segment::Key(key) => {
                for node in &nodes {
                    if let Some(child) = node.get(key.as_str()) {
                        next.push(child);
                    }
                }
            }
            Segment::Index(idx) => {
                for node in &nodes {
                    if let Some(child) = node.get(*idx) {
                        next.push(child);
                    }
                }
            }
            Segment::Wildcard => {
                multi = true;
                for node in &nodes {
                    match node {
                        Value::Array(items) => next.extend(items.iter()),
                        Value::Object(map) => next.extend(map.values()),
                        _ => {}
                    }
                }
            }
        }
        nodes = next;
        if nodes.is_empty() {
            return Ok(None);
        }
    }

    if nodes.len() == 1 && !multi {
        Ok(Some(nodes[0].clone()))
    } else {
        Ok(Some(Value::Array(nodes.into_iter().cloned().collect())))
    }
}

/// Walk a dotted path, creating empty object nodes for missing intermediate
/// segments, and return the leaf container.
pub fn get_or_create<'a>(
    root: &'a mut Value,
    dotted: &str,
) -> Result<&'a mut Map<String, Value>, EngineError> {
    let mut current = root;
    for segment in dotted.split('.') {
        let map = current.as_object_mut().ok_or_else(|| {
            EngineError::config(format!(
                "Cannot create '{}' in '{}': intermediate value is not an object",
                segment, dotted
            ))
        })?;
        current = map
            .entry(segment)
            .or_insert_with(|| Value::Object(Map::new()));
    }
    current.as_object_mut().ok_or_else(|| {
        EngineError::config(format!("Path '{}' does not resolve to an object", dotted))
    })
}

/// Remove the field addressed by a dotted path. Missing intermediate
/// segments make this a no-op.
pub fn unset(document: &mut Value, dotted: &str) {
    let parts: Vec<&str> = dotted.split('.').collect();
    let Some((leaf, parents)) = parts.split_last() else {
        return;
    };
    let mut current = document;
    for part in parents {
        match current.get_mut(*part) {
            Some(next) => current = next,
            None => return,
        }
    }
    if let Some(map) = current.as_object_mut() {
        map.remove(*leaf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_read_simple_key() {
        let doc = json!({"first": "A", "last": "B"});
        assert_eq!(read(&doc, "$.first").unwrap(), Some(json!("A")));
        assert_eq!(read(&doc, "first").unwrap(), Some(json!("A")));
    }

    #[test]
    fn test_read_nested_and_indexed() {
        let doc = json!({"a": {"b": [10, 20, 30]}});
        assert_eq!(read(&doc, "$.a.b[1]").unwrap(), Some(json!(20)));
        assert_eq!(read(&doc, "$.a.b").unwrap(), Some(json!([10, 20, 30])));
    }

    #[test]
    fn test_read_bracket_key() {
        let doc = json!({"odd key": {"x": 1}});
        assert_eq!(read(&doc, "$['odd key'].x").unwrap(), Some(json!(1)));
    }

    #[test]
    fn test_read_wildcard_flattens_array() {
        let doc = json!({"tags": [{"name": "a"}, {"name": "b"}]});
        assert_eq!(
            read(&doc, "$.tags[*].name").unwrap(),
            Some(json!(["a", "b"]))
        );
    }

    #[test]
    fn test_read_wildcard_single_match_is_still_a_list() {
        let doc = json!({"tags": [{"name": "a"}]});
        assert_eq!(read(&doc, "$.tags[*].name").unwrap(), Some(json!(["a"])));
    }

    #[test]
    fn test_read_missing_is_not_found() {
        let doc = json!({"first": "A"});
        assert_eq!(read(&doc, "$.nope").unwrap(), None);
        assert_eq!(read(&doc, "$.first.deeper").unwrap(), None);
    }

    #[test]
    fn test_read_malformed_expression() {
        let doc = json!({});
        assert!(matches!(read(&doc, "$."), Err(EngineError::Config(_))));
        assert!(matches!(read(&doc, "$.a[3"), Err(EngineError::Config(_))));
        assert!(matches!(read(&doc, "$"), Err(EngineError::Config(_))));
    }

    #[test]
    fn test_get_or_create_builds_intermediates() {
        let mut doc = json!({});
        {
            let leaf = get_or_create(&mut doc, "a.b.c").unwrap();
            leaf.insert("x".to_string(), json!(1));
        }
        assert_eq!(doc, json!({"a": {"b": {"c": {"x": 1}}}}));
    }

    #[test]
    fn test_get_or_create_reuses_existing() {
        let mut doc = json!({"a": {"kept": true}});
        {
            let leaf = get_or_create(&mut doc, "a").unwrap();
            leaf.insert("x".to_string(), json!(1));
        }
        assert_eq!(doc, json!({"a": {"kept": true, "x": 1}}));
    }

    #[test]
    fn test_get_or_create_rejects_non_object_intermediate() {
        let mut doc = json!({"a": 5});
        assert!(matches!(
            get_or_create(&mut doc, "a.b"),
            Err(EngineError::Config(_))
        ));
    }

    #[test]
    fn test_unset_removes_nested_key() {
        let mut doc = json!({"a": {"b": {"c": 1, "d": 2}}});
        unset(&mut doc, "a.b.c");
        assert_eq!(doc, json!({"a": {"b": {"d": 2}}}));
    }

    #[test]
    fn test_unset_missing_path_is_noop() {
        let mut doc = json!({"a": 1});
        unset(&mut doc, "x.y.z");
        unset(&mut doc, "a.b");
        assert_eq!(doc, json!({"a": 1}));
    }
}
