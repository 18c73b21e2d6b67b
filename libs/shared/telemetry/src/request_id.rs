// [libs/shared/telemetry/src/request_id.rs]
//! `X-Request-Id` util compartida entre el servidor HTTP y los
//! adaptadores que lo propagan (ledger, verificadores externos).
//! Generado en el ingreso si el cliente no lo suministro, eco en la
//! respuesta, e hilado como portador de cancelacion a traves de cada
//! salto interno (ver `tracing::instrument(fields(request_id = ...))`
//! en los handlers del app shell).

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Valida que un `X-Request-Id` entrante sea razonable antes de
/// reusarlo: longitud acotada y solo caracteres seguros para
/// encabezados HTTP y para interpolar en logs/SQL de diagnostico.
pub fn sanitize_incoming(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.len() > 128 {
        return None;
    }
    let is_safe = trimmed.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    is_safe.then(|| trimmed.to_string())
}

/// Obtiene el `X-Request-Id` de la cabecera entrante o genera uno
/// nuevo (UUID v4) si esta ausente o es invalido.
pub fn resolve_or_generate(incoming: Option<&str>) -> String {
    incoming
        .and_then(sanitize_incoming)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_rejects_empty_and_oversized() {
        assert!(sanitize_incoming("").is_none());
        assert!(sanitize_incoming(&"a".repeat(200)).is_none());
    }

    #[test]
    fn sanitize_rejects_unsafe_characters() {
        assert!(sanitize_incoming("abc;drop table").is_none());
        assert!(sanitize_incoming("abc\r\ninjected").is_none());
    }

    #[test]
    fn sanitize_accepts_uuid_like_values() {
        assert_eq!(sanitize_incoming("req-abc123_9"), Some("req-abc123_9".to_string()));
    }

    #[test]
    fn resolve_generates_when_absent() {
        let generated = resolve_or_generate(None);
        assert!(uuid::Uuid::parse_str(&generated).is_ok());
    }

    #[test]
    fn resolve_reuses_valid_incoming_value() {
        let resolved = resolve_or_generate(Some("client-supplied-id"));
        assert_eq!(resolved, "client-supplied-id");
    }
}
