// [libs/domain/lifecycle/src/lib.rs]
/*!
 * =================================================================
 * APARATO: DOMAIN LIFECYCLE STATE MACHINE (V1.0 - SPINE GENESIS)
 * CLASIFICACION: LOGICA PURA (ESTRATO L2)
 * RESPONSABILIDAD: TRANSICIONES DE CICLO DE VIDA DEL ACTIVO, GATES DE
 *                   AUTORIZACION, TABLA DE IMPACTO ESG
 * =================================================================
 */

pub mod errors;
pub mod esg_impact;
pub mod state_machine;

pub use errors::LifecycleError;
pub use esg_impact::{impact_for, EsgImpact};
pub use state_machine::{authorize_and_apply, hash_dissolve_auth_key, is_valid_transition, reprint_generation_delta, VALID_TRANSITIONS};
