//! Dotted-path lookup over parsed ECS records.
//!
//! ECS allows a field "foo.bar" to be dotted:
//!
//! ```text
//! {"foo.bar": 42}
//! ```
//!
//! or nested:
//!
//! ```text
//! {"foo": {"bar": 42}}
//! ```
//!
//! or any mix of the two along a longer path. Lookups here try every
//! prefix-split of the path, shortest prefix first.
//!
//! Assumption: there are no conflicting encodings. E.g. we do not have
//! `{"foo.bar": 42, "foo": {"bar": 43}}` for a lookup of `[foo, bar]`. If we
//! do, the result is unspecified: *one* of the paths wins.

use serde_json::Value;

/// The JSON value kinds, for type-filtered extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonKind {
    Null,
    Bool,
    Number,
    String,
    Array,
    Object,
}

pub fn kind_of(value: &Value) -> JsonKind {
    match value {
        Value::Null => JsonKind::Null,
        Value::Bool(_) => JsonKind::Bool,
        Value::Number(_) => JsonKind::Number,
        Value::String(_) => JsonKind::String,
        Value::Array(_) => JsonKind::Array,
        Value::Object(_) => JsonKind::Object,
    }
}

/// Looks up the value identified by the path segments in `lookup`.
///
/// An empty path resolves to `obj` itself. A non-object `obj` with a
/// non-empty path resolves to nothing.
pub fn lookup_value<'a>(obj: &'a Value, lookup: &[&str]) -> Option<&'a Value> {
    if lookup.is_empty() {
        return Some(obj);
    }
    let map = obj.as_object()?;
    if lookup.len() == 1 {
        return map.get(lookup[0]);
    }

    // Multiple segments: try increasingly long dotted prefixes.
    //
    // E.g. given lookup=[a, b, c]:
    // first try:   lookup_value(obj["a"], [b, c])
    // then try:    lookup_value(obj["a.b"], [c])
    // then try:    lookup_value(obj["a.b.c"], [])
    for i in 1..=lookup.len() {
        let key = lookup[..i].join(".");
        if let Some(sub) = map.get(&key)
            && let Some(found) = lookup_value(sub, &lookup[i..])
        {
            return Some(found);
        }
    }
    None
}

/// Looks up the value identified by `lookup` (as [`lookup_value`]) and then
/// removes it from the record. If the removal leaves an intermediate object
/// empty, that object is removed as well. The root object itself is never
/// removed.
///
/// Removal uses `shift_remove` so the insertion order of the surviving keys
/// is unchanged.
pub fn extract_value(obj: &mut Value, lookup: &[&str]) -> Option<Value> {
    if lookup.is_empty() {
        return None;
    }
    let map = obj.as_object_mut()?;
    if lookup.len() == 1 {
        return map.shift_remove(lookup[0]);
    }

    for i in 1..=lookup.len() {
        let key = lookup[..i].join(".");
        if i == lookup.len() {
            // The whole remaining path is one dotted key, e.g. a lookup of
            // [a, b, c] in {"a.b.c": 42}.
            if let Some(found) = map.shift_remove(&key) {
                return Some(found);
            }
        } else if let Some(sub) = map.get_mut(&key) {
            if let Some(found) = extract_value(sub, &lookup[i..]) {
                let emptied = sub.as_object().is_some_and(|m| m.is_empty());
                if emptied {
                    map.shift_remove(&key);
                }
                return Some(found);
            }
        }
    }
    None
}

/// [`extract_value`], but only if the resolved value has the required kind.
/// On a kind mismatch nothing is removed.
pub fn extract_value_of_kind(obj: &mut Value, lookup: &[&str], kind: JsonKind) -> Option<Value> {
    if kind_of(lookup_value(obj, lookup)?) != kind {
        return None;
    }
    extract_value(obj, lookup)
}

/// Splits a KQL-style field name into path segments.
pub fn split_path(field: &str) -> Vec<&str> {
    field.split('.').collect()
}
