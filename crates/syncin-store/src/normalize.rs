//! Read-side document normalization.
//!
//! Two serialization quirks of the hosted backend are repaired in a single
//! pass applied to every document leaving the store, so application code
//! never special-cases them:
//!
//! 1. Backend-native timestamps arrive as `{"seconds": .., "nanos": ..}`
//!    objects and are rewritten to RFC 3339 strings.
//! 2. Arrays occasionally come back as objects keyed by consecutive
//!    stringified indices (`"0", "1", ...`) and are rebuilt as ordered
//!    lists.
//!
//! Anything ambiguous (a non-array object whose keys are not consecutive
//! indices) is left untouched.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};

/// Normalize a document in place.
pub fn normalize(value: &mut Value) {
    match value {
        Value::Object(map) => {
            if let Some(timestamp) = native_timestamp(map) {
                *value = Value::String(timestamp);
                return;
            }
            if let Some(mut items) = numeric_keyed_list(map) {
                for item in &mut items {
                    normalize(item);
                }
                // A list rebuilt entirely from strings is an options or tag
                // list; blank entries are artifacts of the misserialization.
                if items.iter().all(|v| v.is_string()) {
                    items.retain(|v| v.as_str().is_some_and(|s| !s.trim().is_empty()));
                }
                *value = Value::Array(items);
                return;
            }
            for field in map.values_mut() {
                normalize(field);
            }
        }
        Value::Array(items) => {
            for item in items {
                normalize(item);
            }
        }
        _ => {}
    }
}

/// Detect the backend's native timestamp shape and render it as RFC 3339.
/// Out-of-range values are not a timestamp we can repair; the field is left
/// as-is.
fn native_timestamp(map: &Map<String, Value>) -> Option<String> {
    if map.len() != 2 {
        return None;
    }
    let seconds = map.get("seconds")?.as_i64()?;
    let nanos = map.get("nanos")?.as_i64()?;
    if !(0..1_000_000_000).contains(&nanos) {
        return None;
    }
    let ts = DateTime::<Utc>::from_timestamp(seconds, nanos as u32)?;
    Some(ts.to_rfc3339_opts(SecondsFormat::AutoSi, true))
}

/// If the map's keys are exactly the consecutive stringified integers
/// `"0".."n-1"`, return its values in numeric key order.  An empty map is
/// ambiguous and stays an object.
fn numeric_keyed_list(map: &Map<String, Value>) -> Option<Vec<Value>> {
    if map.is_empty() {
        return None;
    }
    let mut indexed: Vec<(usize, &Value)> = Vec::with_capacity(map.len());
    for (key, value) in map {
        let index: usize = key.parse().ok()?;
        indexed.push((index, value));
    }
    indexed.sort_by_key(|(index, _)| *index);
    for (position, (index, _)) in indexed.iter().enumerate() {
        if *index != position {
            return None;
        }
    }
    Some(indexed.into_iter().map(|(_, v)| v.clone()).collect())
}
