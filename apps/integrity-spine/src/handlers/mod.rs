// [apps/integrity-spine/src/handlers/mod.rs]
/*!
 * =================================================================
 * APARATO: INTEGRITY SPINE HANDLER HUB (V1.0 - SPINE GENESIS)
 * CLASIFICACION: APPLICATION ADAPTERS (ESTRATO L4)
 * RESPONSABILIDAD: EXPOSICION NOMINAL DE PUNTOS DE ENTRADA (HANDLERS)
 *
 * - policy:       Motor de consentimiento + region (sin efectos).
 * - orchestrator: Resolucion de intent y ejecucion de transferencias.
 * - audit:        Bitacora encadenada por hash y anclaje dual-ledger.
 * - governance:   Cola de escalamiento y decisiones humanas.
 * - cube:         Servicio de facetas del pasaporte digital.
 * - lifecycle:    Maquina de estados PRODUCED..REPRINT.
 * =================================================================
 */

pub mod audit;
pub mod cube;
pub mod governance;
pub mod lifecycle;
pub mod orchestrator;
pub mod policy;
