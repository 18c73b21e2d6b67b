// [apps/integrity-spine/src/middleware.rs]
/*!
 * =================================================================
 * APARATO: PERIMETER GUARDS (V1.0 - SPINE GENESIS)
 * CLASIFICACION: SECURITY STRATUM (ESTRATO L4)
 * RESPONSABILIDAD: PROPAGACION DE REQUEST-ID Y GUARDIA DE SALUD
 *
 * Este servicio no impone un esquema de autenticacion de cliente
 * final propio; la identidad del agente viaja en el cuerpo de cada
 * peticion. El guardia de salud rechaza trafico mientras `SystemMode`
 * no sea `Operational`, y el guardia de propagacion resuelve o genera
 * `X-Request-Id` en el borde.
 * =================================================================
 */

use axum::{
    extract::{Request, State},
    http::{HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use spine_shared_telemetry::{resolve_or_generate, REQUEST_ID_HEADER};
use tracing::{warn, Instrument};

use crate::state::AppState;

/// Extension inyectada en la peticion con el `X-Request-Id` resuelto,
/// disponible a los handlers para encadenarlo en auditoria y logs.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Resuelve o genera el `X-Request-Id` de ingreso, lo inyecta como
/// extension y lo hace eco en la respuesta; envuelve el resto de la
/// cadena en un span de tracing con el id adjunto.
pub async fn request_id_guard(mut req: Request, next: Next) -> Response {
    let incoming = req.headers().get(REQUEST_ID_HEADER).and_then(|h| h.to_str().ok());
    let request_id = resolve_or_generate(incoming);
    req.extensions_mut().insert(RequestId(request_id.clone()));

    let span = tracing::info_span!("request", request_id = %request_id);
    let mut response = next.run(req).instrument(span).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// Bloquea el acceso si el sistema esta en mantenimiento (pre-vuelo de
/// arranque aun en curso o fallido).
pub async fn health_guard(State(state): State<AppState>, req: Request, next: Next) -> Response {
    if let Err(reason) = state.is_operational() {
        warn!("⛔ [ACCESS_DENIED]: Strata under maintenance: {}", reason);
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "error": "service_unavailable",
                "message": reason,
            })),
        )
            .into_response();
    }
    next.run(req).await
}
