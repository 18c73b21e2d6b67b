// [libs/infra/db/src/lib.rs]
/*!
 * =================================================================
 * APARATO: INFRASTRUCTURE PERSISTENCE ROOT (V1.0 - SPINE GENESIS)
 * CLASIFICACION: CRATE ROOT (ESTRATO L3)
 * RESPONSABILIDAD: ENLACE LIBSQL, ESQUEMA Y REPOSITORIOS POR AGREGADO
 * =================================================================
 */

pub mod client;
pub mod errors;
pub mod repositories;
pub mod schema;

pub use client::{HealthBreaker, SpineDbClient};
pub use errors::DbError;
