//! Canonical payload serialization
//!
//! Turns a record state into text that is byte-for-byte identical for
//! identical states: object keys are written in byte-wise lexicographic order,
//! separators are compact, and numbers and strings use serde_json's
//! formatting. The digest of an audit record is computed over this text, so
//! any change here invalidates every stored digest.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{SimulottoError, SimulottoResult};

/// A record's fields, keyed by field name
pub type RecordState = Map<String, Value>;

/// Capture the state of an entity as a field mapping
///
/// Fails with a serialization error if the entity does not serialize to a
/// mapping, or holds a value serde_json cannot represent (for example a map
/// with non-string keys). Nothing is dropped silently.
pub fn state_of<T: Serialize>(entity: &T) -> SimulottoResult<RecordState> {
    match serde_json::to_value(entity) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(other) => Err(SimulottoError::Serialization(format!(
            "record state must be a mapping of field names, got {}",
            kind_of(&other)
        ))),
        Err(e) => Err(SimulottoError::Serialization(e.to_string())),
    }
}

/// Canonical text of a single state (Insert and Delete payloads)
pub fn canonicalize(state: &RecordState) -> SimulottoResult<String> {
    let mut out = String::new();
    write_object(state, &mut out)?;
    Ok(out)
}

/// Canonical text of an Update payload
///
/// The wrapper keys are always `before` then `after`; the states inside
/// follow the usual key ordering.
pub fn canonicalize_update(before: &RecordState, after: &RecordState) -> SimulottoResult<String> {
    let mut out = String::from("{\"before\":");
    write_object(before, &mut out)?;
    out.push_str(",\"after\":");
    write_object(after, &mut out)?;
    out.push('}');
    Ok(out)
}

fn write_value(value: &Value, out: &mut String) -> SimulottoResult<()> {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) => write_string(s, out)?,
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(item, out)?;
            }
            out.push(']');
        }
        Value::Object(fields) => write_object(fields, out)?,
    }
    Ok(())
}

fn write_object(fields: &Map<String, Value>, out: &mut String) -> SimulottoResult<()> {
    let mut keys: Vec<&String> = fields.keys().collect();
    keys.sort_unstable_by(|a, b| a.as_bytes().cmp(b.as_bytes()));

    out.push('{');
    for (i, key) in keys.into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        write_string(key, out)?;
        out.push(':');
        if let Some(value) = fields.get(key) {
            write_value(value, out)?;
        }
    }
    out.push('}');
    Ok(())
}

fn write_string(s: &str, out: &mut String) -> SimulottoResult<()> {
    let escaped =
        serde_json::to_string(s).map_err(|e| SimulottoError::Serialization(e.to_string()))?;
    out.push_str(&escaped);
    Ok(())
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn state(value: Value) -> RecordState {
        match value {
            Value::Object(map) => map,
            _ => panic!("test state must be an object"),
        }
    }

    #[test]
    fn test_keys_are_sorted_and_compact() {
        let s = state(json!({"numbers": [1, 2, 3], "id": "b1", "amount": 2.5}));
        assert_eq!(
            canonicalize(&s).unwrap(),
            r#"{"amount":2.5,"id":"b1","numbers":[1,2,3]}"#
        );
    }

    #[test]
    fn test_nested_objects_are_sorted() {
        let s = state(json!({"z": {"b": 1, "a": null}, "a": [ {"y": true, "x": false} ]}));
        assert_eq!(
            canonicalize(&s).unwrap(),
            r#"{"a":[{"x":false,"y":true}],"z":{"a":null,"b":1}}"#
        );
    }

    #[test]
    fn test_identical_states_serialize_identically() {
        let mut first = RecordState::new();
        first.insert("name".into(), json!("Quina"));
        first.insert("picks".into(), json!(5));

        let mut second = RecordState::new();
        second.insert("picks".into(), json!(5));
        second.insert("name".into(), json!("Quina"));

        assert_eq!(canonicalize(&first).unwrap(), canonicalize(&second).unwrap());
    }

    #[test]
    fn test_update_wraps_before_then_after() {
        let before = state(json!({"numbers": [1, 2, 3, 4, 5, 6]}));
        let after = state(json!({"numbers": [6, 12, 24, 36, 48, 54]}));

        let text = canonicalize_update(&before, &after).unwrap();
        assert_eq!(
            text,
            r#"{"before":{"numbers":[1,2,3,4,5,6]},"after":{"numbers":[6,12,24,36,48,54]}}"#
        );

        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.as_object().unwrap().len(), 2);
    }

    #[test]
    fn test_strings_are_escaped() {
        let s = state(json!({"name": "Say \"hi\"\n"}));
        assert_eq!(canonicalize(&s).unwrap(), r#"{"name":"Say \"hi\"\n"}"#);
    }

    #[test]
    fn test_non_mapping_state_is_rejected() {
        let err = state_of(&vec![1, 2, 3]).unwrap_err();
        assert!(err.is_serialization());
    }

    #[test]
    fn test_unrepresentable_value_is_rejected() {
        #[derive(Serialize)]
        struct Weird {
            lookup: HashMap<(u8, u8), u8>,
        }

        let mut lookup = HashMap::new();
        lookup.insert((1, 2), 3);

        let err = state_of(&Weird { lookup }).unwrap_err();
        assert!(err.is_serialization());
    }
}
