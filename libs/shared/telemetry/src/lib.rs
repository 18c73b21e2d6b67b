// [libs/shared/telemetry/src/lib.rs]
/*!
 * =================================================================
 * APARATO: INTEGRITY SPINE TELEMETRY (V1.0 - SPINE GENESIS)
 * CLASIFICACION: SHARED UTILITY (ESTRATO L4/L6)
 * RESPONSABILIDAD: TRAZADO ESTRUCTURADO, PROPAGACION DE REQUEST-ID Y
 *                   FRONTERA DE REDACCION DE PII
 *
 * Inicializacion dual (JSON en produccion, compacto en desarrollo) con
 * blindaje de panico, mas la propagacion de request-id y la frontera
 * de redaccion de PII que todo log y toda respuesta externa deben
 * atravesar.
 * =================================================================
 */

pub mod redaction;
pub mod request_id;

pub use redaction::redact;
pub use request_id::{resolve_or_generate, sanitize_incoming, REQUEST_ID_HEADER};

use std::panic;

use tracing::{error, info, instrument};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt as formatting_layer, EnvFilter};

/// Inicializa el sistema de trazas con blindaje de panicos soberano.
///
/// # Comportamiento:
/// - Desarrollo: logs interactivos compactos con marcas de tiempo locales.
/// - Produccion: estructura JSON plana apta para ingestion por el
///   agregador de logs.
///
/// # Errors:
/// Entra en panico si otro suscriptor global ya fue inicializado en
/// el runtime (invariante del propio `tracing_subscriber`).
#[instrument(skip_all)]
pub fn init_tracing(service_nominal_identifier: &str) {
    let environmental_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "{}={level},tower_http=warn,hyper=warn,libsql=error",
            service_nominal_identifier,
            level = if cfg!(debug_assertions) { "debug" } else { "info" }
        )
        .into()
    });

    let is_production_strata = !cfg!(debug_assertions);

    if is_production_strata {
        tracing_subscriber::registry()
            .with(environmental_filter)
            .with(formatting_layer::layer().json().flatten_event(true))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(environmental_filter)
            .with(formatting_layer::layer().compact().with_target(false))
            .init();
    }

    let service_id_snapshot = service_nominal_identifier.to_string();

    panic::set_hook(Box::new(move |panic_metadata| {
        let panic_location = panic_metadata
            .location()
            .map(|location| format!("{}:{}:{}", location.file(), location.line(), location.column()))
            .unwrap_or_else(|| "UNKNOWN_STRATA_COORDINATES".to_string());

        let panic_payload_message = panic_metadata
            .payload()
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| panic_metadata.payload().downcast_ref::<String>().map(|s| s.as_str()))
            .unwrap_or("UNDEFINED_KERNEL_COLLAPSE_PAYLOAD");

        error!(
            target: "panic_monitor",
            service = %service_id_snapshot,
            estrato = %panic_location,
            "🔥 [CRITICAL_PANIC]: Thread terminated abruptly. Analysis: {}",
            panic_payload_message
        );
    }));

    info!("👁️ [TELEMETRY_ONLINE]: Observability strata levelized for [{}].", service_nominal_identifier);
}
