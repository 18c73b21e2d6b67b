// [libs/shared/telemetry/src/redaction.rs]
//! Frontera unica de redaccion de PII. La misma funcion se invoca
//! tanto al emitir logs estructurados como al serializar filas hacia
//! afuera del sistema; la representacion interna (base de datos,
//! memoria de proceso) nunca pasa por aqui y conserva los
//! identificadores completos.
//!
//! Conjuntos de campos fijados explicitamente: redaccion total para
//! {email, phone, ssn, credit_card, address}; redaccion parcial para
//! user_id y sus alias (las columnas que tambien portan un
//! identificador de usuario a traves del esquema).

use serde_json::Value;

const FULL_REDACT_FIELDS: &[&str] = &["email", "phone", "ssn", "credit_card", "address"];

const PARTIAL_REDACT_FIELDS: &[&str] = &[
    "user_id",
    "owner_id",
    "creator_user_id",
    "current_owner_id",
    "to_user_id",
    "from_user_id",
    "triggered_by",
    "requested_by",
    "grantee_user_id",
    "viewer_id",
];

const REDACTED_PLACEHOLDER: &str = "[REDACTED]";
const PARTIAL_VISIBLE_PREFIX: usize = 4;
const PARTIAL_MASK: &str = "***";

/// Redacta en el lugar un arbol JSON arbitrario, recorriendo objetos
/// y arreglos anidados. Los campos no enumerados pasan sin cambios.
pub fn redact(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (field, entry) in map.iter_mut() {
                let field_lower = field.to_ascii_lowercase();
                if FULL_REDACT_FIELDS.contains(&field_lower.as_str()) {
                    *entry = Value::String(REDACTED_PLACEHOLDER.to_string());
                    continue;
                }
                if PARTIAL_REDACT_FIELDS.contains(&field_lower.as_str()) {
                    if let Value::String(raw) = entry {
                        *raw = partial_mask(raw);
                    }
                    continue;
                }
                redact(entry);
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                redact(item);
            }
        }
        _ => {}
    }
}

/// Conserva un prefijo corto y enmascara el resto; suficiente para
/// correlacionar entradas de log sin exponer el identificador completo.
fn partial_mask(raw: &str) -> String {
    if raw.len() <= PARTIAL_VISIBLE_PREFIX {
        return PARTIAL_MASK.to_string();
    }
    let visible: String = raw.chars().take(PARTIAL_VISIBLE_PREFIX).collect();
    format!("{visible}{PARTIAL_MASK}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn full_redact_fields_become_placeholder() {
        let mut value = json!({ "email": "a@b.com", "phone": "555-1234", "name": "kept" });
        redact(&mut value);
        assert_eq!(value["email"], json!(REDACTED_PLACEHOLDER));
        assert_eq!(value["phone"], json!(REDACTED_PLACEHOLDER));
        assert_eq!(value["name"], json!("kept"));
    }

    #[test]
    fn partial_redact_keeps_prefix_only() {
        let mut value = json!({ "owner_id": "usr_abcdef123456" });
        redact(&mut value);
        assert_eq!(value["owner_id"], json!("usr_***"));
    }

    #[test]
    fn short_identifiers_fully_masked() {
        let mut value = json!({ "user_id": "ab" });
        redact(&mut value);
        assert_eq!(value["user_id"], json!(PARTIAL_MASK));
    }

    #[test]
    fn nested_objects_and_arrays_are_walked() {
        let mut value = json!({
            "faces": [
                { "owner_id": "owner_1234567", "email": "x@y.com" }
            ]
        });
        redact(&mut value);
        assert_eq!(value["faces"][0]["email"], json!(REDACTED_PLACEHOLDER));
        assert_eq!(value["faces"][0]["owner_id"], json!("owne***"));
    }

    #[test]
    fn unrelated_fields_survive_untouched() {
        let mut value = json!({ "asset_id": "asset-1", "lifecycle_state": "ACTIVE" });
        redact(&mut value);
        assert_eq!(value["asset_id"], json!("asset-1"));
        assert_eq!(value["lifecycle_state"], json!("ACTIVE"));
    }
}
