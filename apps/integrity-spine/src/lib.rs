// [apps/integrity-spine/src/lib.rs]
/*!
 * =================================================================
 * APARATO: INTEGRITY SPINE LIBRARY ROOT (V1.0 - SPINE GENESIS)
 * CLASIFICACION: CRATE ROOT (ESTRATO L3)
 * RESPONSABILIDAD: DEFINICION SUPREMA DEL ARBOL DE MODULOS
 *
 * bootstrap -> kernel -> routes -> handlers/services, estado
 * compartido inyectado una sola vez en `AppState`.
 * =================================================================
 */

pub mod bootstrap;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod kernel;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;

pub mod prelude {
    pub use crate::config::SpineConfig;
    pub use crate::errors::SpineError;
    pub use crate::kernel::SpineKernel;
    pub use crate::state::{AppState, SystemMode};
}
