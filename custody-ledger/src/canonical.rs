//! Deterministic canonical encoding used as the sole input to hashing and
//! signing.
//!
//! Canonicalization sorts object keys ascending at every nesting level and
//! emits the result with no insignificant whitespace. `serde_json`'s default
//! `Value` already preserves insertion order in its `Map`, so canonicalizing
//! means re-keying through a sorted map before serializing — this must
//! happen recursively, since a nested object's keys need sorting too.

use serde::Serialize;
use serde_json::Value;

/// Serializes `value` into its canonical byte form: keys sorted ascending
/// at every level, no insignificant whitespace, UTF-8.
///
/// This is the byte string that gets hashed (for `record_hash`) and signed
/// (for `signature_b64`). Two implementations that disagree here cannot
/// cross-verify a ledger.
pub fn canonical_bytes<T: Serialize>(value: &T) -> Vec<u8> {
    let v = serde_json::to_value(value).expect("value must serialize to JSON");
    let sorted = sort_value(v);
    serde_json::to_vec(&sorted).expect("sorted value must serialize to JSON")
}

fn sort_value(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut sorted: std::collections::BTreeMap<String, Value> =
                std::collections::BTreeMap::new();
            for (k, v) in map {
                sorted.insert(k, sort_value(v));
            }
            let mut out = serde_json::Map::new();
            for (k, v) in sorted {
                out.insert(k, v);
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_value).collect()),
        other => other,
    }
}
