// [apps/integrity-spine/src/services/mod.rs]
/*!
 * =================================================================
 * APARATO: APPLICATION SERVICE HUB (V1.0 - SPINE GENESIS)
 * CLASIFICACION: APPLICATION SERVICES (ESTRATO L4)
 * RESPONSABILIDAD: EXPOSICION NOMINAL DE SERVICIOS DE APLICACION
 *
 * Un unico servicio: el orquestador de integridad. Sin procesos de
 * fondo propios de este estrato, solo la composicion de fases de
 * `process_allowed` invocada sincronamente por los handlers.
 * =================================================================
 */

pub mod consent;
pub mod orchestrator;
pub mod verifiers;
