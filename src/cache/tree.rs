//! Tree Operations
//!
//! Pure functions over the JSON tree backing the cache. Nothing here touches
//! persistence.

use std::collections::HashSet;

use serde_json::{Map, Value};

/// Follows `keys` from `root`, returning `None` at the first missing segment.
///
/// Only mappings can be descended into; a scalar or sequence in the middle
/// of the path counts as a miss.
pub fn lookup<'a>(root: &'a Map<String, Value>, keys: &[String]) -> Option<&'a Value> {
    let (first, rest) = keys.split_first()?;
    let mut current = root.get(first)?;
    for key in rest {
        current = current.as_object()?.get(key)?;
    }
    Some(current)
}

/// Mutable counterpart of [`lookup`].
pub fn lookup_mut<'a>(root: &'a mut Map<String, Value>, keys: &[String]) -> Option<&'a mut Value> {
    let (first, rest) = keys.split_first()?;
    let mut current = root.get_mut(first)?;
    for key in rest {
        current = current.as_object_mut()?.get_mut(key)?;
    }
    Some(current)
}

/// Writes `leaf` at `keys` below `base` and returns the merged tree.
///
/// Only the ancestor chain of `keys` is rebuilt. Every sibling of that chain
/// keeps its old value, and the subtree at the end of `keys` is replaced by
/// `leaf` outright. An ancestor that is not a mapping cannot hold children and
/// is replaced by one.
pub fn graft(base: Option<Value>, keys: &[String], leaf: Value) -> Value {
    match keys.split_first() {
        None => leaf,
        Some((key, rest)) => {
            let mut map = match base {
                Some(Value::Object(map)) => map,
                _ => Map::new(),
            };
            let existing = map.remove(key);
            map.insert(key.clone(), graft(existing, rest, leaf));
            Value::Object(map)
        }
    }
}

/// Removes repeated elements, keeping the first occurrence of each.
///
/// Returns the number of elements removed.
pub fn dedupe_sequence(items: &mut Vec<Value>) -> usize {
    let before = items.len();
    let mut seen = HashSet::with_capacity(before);
    items.retain(|item| seen.insert(item.to_string()));
    before - items.len()
}

/// Dedupes a top-level subtree in place.
///
/// Sequences are deduped directly, mappings have each child sequence
/// deduped, and anything else is left alone.
pub fn dedupe_subtree(value: &mut Value) -> usize {
    match value {
        Value::Array(items) => dedupe_sequence(items),
        Value::Object(children) => children
            .values_mut()
            .map(|child| match child {
                Value::Array(items) => dedupe_sequence(items),
                _ => 0,
            })
            .sum(),
        _ => 0,
    }
}

/// True if `container` holds `needle`.
///
/// Sequences test element membership and mappings test key membership for
/// string needles. Scalars contain nothing.
pub fn contains(container: &Value, needle: &Value) -> bool {
    match container {
        Value::Array(items) => items.contains(needle),
        Value::Object(map) => needle.as_str().is_some_and(|key| map.contains_key(key)),
        _ => false,
    }
}

/// Short name of a value's kind for error messages.
pub fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}
