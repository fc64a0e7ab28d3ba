//! Field-level change summaries for audit records

use std::fmt;

use serde_json::Value;

use super::record::{AuditEvent, AuditRecord};
use crate::error::{SimulottoError, SimulottoResult};

/// Arrays longer than this are shown as an item count
const INLINE_ARRAY_MAX: usize = 12;

/// One changed field, addressed by a dotted path
#[derive(Debug, Clone, PartialEq)]
pub struct FieldChange {
    pub path: String,
    pub before: Option<Value>,
    pub after: Option<Value>,
}

impl fmt::Display for FieldChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let side = |v: &Option<Value>, missing: &str| match v {
            Some(v) => format_value(v),
            None => missing.to_string(),
        };
        write!(
            f,
            "{}: {} -> {}",
            self.path,
            side(&self.before, "(added)"),
            side(&self.after, "(removed)")
        )
    }
}

/// Changes recorded by an audit record
///
/// Inserts list every field as added, deletes every field as removed, and
/// updates the fields that differ between `before` and `after`.
pub fn record_changes(record: &AuditRecord) -> SimulottoResult<Vec<FieldChange>> {
    let doc = record.payload_document()?;

    let changes = match record.event() {
        AuditEvent::Insert => field_changes(&Value::Object(Default::default()), &doc, ""),
        AuditEvent::Delete => field_changes(&doc, &Value::Object(Default::default()), ""),
        AuditEvent::Update => {
            let (Some(before), Some(after)) = (doc.get("before"), doc.get("after")) else {
                return Err(SimulottoError::Json(format!(
                    "update record {} lacks a before/after pair",
                    record.id().full()
                )));
            };
            field_changes(before, after, "")
        }
    };

    Ok(changes)
}

/// One-line summary of a record's changes
pub fn summarize(record: &AuditRecord) -> SimulottoResult<String> {
    let changes = record_changes(record)?;
    if changes.is_empty() {
        return Ok("(no field changes)".to_string());
    }
    Ok(changes
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", "))
}

/// Compare two states, descending into nested objects
pub fn field_changes(before: &Value, after: &Value, prefix: &str) -> Vec<FieldChange> {
    let mut changes = Vec::new();

    match (before, after) {
        (Value::Object(before_obj), Value::Object(after_obj)) => {
            for (key, before_val) in before_obj {
                let path = join_path(prefix, key);
                match after_obj.get(key) {
                    Some(after_val) if before_val == after_val => {}
                    Some(after_val) if before_val.is_object() && after_val.is_object() => {
                        changes.extend(field_changes(before_val, after_val, &path));
                    }
                    Some(after_val) => changes.push(FieldChange {
                        path,
                        before: Some(before_val.clone()),
                        after: Some(after_val.clone()),
                    }),
                    None => changes.push(FieldChange {
                        path,
                        before: Some(before_val.clone()),
                        after: None,
                    }),
                }
            }

            for (key, after_val) in after_obj {
                if !before_obj.contains_key(key) {
                    changes.push(FieldChange {
                        path: join_path(prefix, key),
                        before: None,
                        after: Some(after_val.clone()),
                    });
                }
            }
        }
        _ if before != after => changes.push(FieldChange {
            path: prefix.to_string(),
            before: Some(before.clone()),
            after: Some(after.clone()),
        }),
        _ => {}
    }

    changes
}

fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", prefix, key)
    }
}

/// Format a JSON value for human-readable display
fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) if s.chars().count() > 50 => {
            let head: String = s.chars().take(47).collect();
            format!("\"{}...\"", head)
        }
        Value::Array(items)
            if items.len() <= INLINE_ARRAY_MAX && items.iter().all(is_scalar) =>
        {
            value.to_string()
        }
        Value::Array(items) => format!("[{} items]", items.len()),
        Value::Object(fields) => format!("{{{} fields}}", fields.len()),
        other => other.to_string(),
    }
}

fn is_scalar(value: &Value) -> bool {
    !(value.is_array() || value.is_object())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::canonical::{canonicalize, canonicalize_update, state_of};
    use crate::audit::hasher::SealedPayload;
    use crate::audit::record::RecordBuilder;
    use serde_json::json;

    fn update_record(before: Value, after: Value) -> AuditRecord {
        let text =
            canonicalize_update(&state_of(&before).unwrap(), &state_of(&after).unwrap()).unwrap();
        RecordBuilder::default()
            .build(AuditEvent::Update, "bets", "b-1", SealedPayload::seal(text))
            .unwrap()
    }

    #[test]
    fn test_bet_numbers_change() {
        let record = update_record(
            json!({"numbers": [1, 2, 3, 4, 5, 6], "user": "u-1"}),
            json!({"numbers": [6, 12, 24, 36, 48, 54], "user": "u-1"}),
        );

        let summary = summarize(&record).unwrap();
        assert_eq!(summary, "numbers: [1,2,3,4,5,6] -> [6,12,24,36,48,54]");
    }

    #[test]
    fn test_added_and_removed_fields() {
        let changes = field_changes(
            &json!({"name": "Test", "old_field": "value"}),
            &json!({"name": "Test", "balance": 100}),
            "",
        );

        let rendered: Vec<_> = changes.iter().map(ToString::to_string).collect();
        assert!(rendered.contains(&"old_field: \"value\" -> (removed)".to_string()));
        assert!(rendered.contains(&"balance: (added) -> 100".to_string()));
    }

    #[test]
    fn test_nested_paths() {
        let changes = field_changes(
            &json!({"game": {"name": "Old", "picks": 6}}),
            &json!({"game": {"name": "New", "picks": 6}}),
            "",
        );
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].path, "game.name");
    }

    #[test]
    fn test_unchanged_update() {
        let record = update_record(json!({"a": 1}), json!({"a": 1}));
        assert!(record_changes(&record).unwrap().is_empty());
        assert_eq!(summarize(&record).unwrap(), "(no field changes)");
    }

    #[test]
    fn test_insert_lists_all_fields() {
        let text = canonicalize(&state_of(&json!({"a": 1, "b": true})).unwrap()).unwrap();
        let record = RecordBuilder::default()
            .build(AuditEvent::Insert, "draws", "d-1", SealedPayload::seal(text))
            .unwrap();

        let changes = record_changes(&record).unwrap();
        assert_eq!(changes.len(), 2);
        assert!(changes.iter().all(|c| c.before.is_none()));
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(&json!(null)), "null");
        assert_eq!(format_value(&json!("test")), "\"test\"");
        assert_eq!(format_value(&json!([1, 2, 3])), "[1,2,3]");
        assert_eq!(format_value(&json!([[1], [2]])), "[2 items]");
        assert_eq!(format_value(&json!({"a": 1, "b": 2})), "{2 fields}");
        assert!(format_value(&json!("a".repeat(100))).ends_with("...\""));
    }
}
