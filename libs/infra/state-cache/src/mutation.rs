// [libs/infra/state-cache/src/mutation.rs]
//! Operaciones de fusion atomica sobre el campo `data` de una cara,
//! al estilo Firestore: fijar, incrementar, union de arreglo o sello
//! de server-timestamp. El merge nunca reemplaza el objeto entero,
//! solo las claves nombradas en el parche.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

#[derive(Debug, Clone)]
pub enum FieldValue {
    Set(Value),
    Increment(f64),
    ArrayUnion(Vec<Value>),
    ServerTimestamp,
}

/// Aplica un conjunto de operaciones de campo sobre un objeto JSON,
/// creando el objeto si `target` todavia no es uno.
pub fn apply_patch(target: &mut Value, patch: &[(String, FieldValue)], now: DateTime<Utc>) {
    if !target.is_object() {
        *target = Value::Object(Map::new());
    }
    let obj = target.as_object_mut().expect("coerced to object above");

    for (field, op) in patch {
        match op {
            FieldValue::Set(value) => {
                obj.insert(field.clone(), value.clone());
            }
            FieldValue::Increment(delta) => {
                let current = obj.get(field).and_then(Value::as_f64).unwrap_or(0.0);
                let updated = current + delta;
                obj.insert(field.clone(), serde_json::json!(updated));
            }
            FieldValue::ArrayUnion(additions) => {
                let mut existing = obj
                    .get(field)
                    .and_then(Value::as_array)
                    .cloned()
                    .unwrap_or_default();
                for candidate in additions {
                    if !existing.contains(candidate) {
                        existing.push(candidate.clone());
                    }
                }
                obj.insert(field.clone(), Value::Array(existing));
            }
            FieldValue::ServerTimestamp => {
                obj.insert(field.clone(), serde_json::json!(now.to_rfc3339()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increment_treats_missing_field_as_zero() {
        let mut doc = serde_json::json!({});
        apply_patch(&mut doc, &[("gaze_count".to_string(), FieldValue::Increment(3.0))], Utc::now());
        assert_eq!(doc["gaze_count"], serde_json::json!(3.0));
    }

    #[test]
    fn array_union_deduplicates() {
        let mut doc = serde_json::json!({ "tags": ["a", "b"] });
        apply_patch(
            &mut doc,
            &[("tags".to_string(), FieldValue::ArrayUnion(vec![serde_json::json!("b"), serde_json::json!("c")]))],
            Utc::now(),
        );
        assert_eq!(doc["tags"], serde_json::json!(["a", "b", "c"]));
    }

    #[test]
    fn server_timestamp_writes_rfc3339() {
        let mut doc = serde_json::json!({});
        let now = Utc::now();
        apply_patch(&mut doc, &[("synced_at".to_string(), FieldValue::ServerTimestamp)], now);
        assert_eq!(doc["synced_at"], serde_json::json!(now.to_rfc3339()));
    }
}
