// [libs/infra/state-cache/src/lib.rs]
/*!
 * =================================================================
 * APARATO: STATE CACHE ROOT (V1.0 - SPINE GENESIS)
 * CLASIFICACION: CRATE ROOT (ESTRATO L3)
 * RESPONSABILIDAD: DOCUMENTO-POR-CUBO EN MEMORIA PARA EL WARDROBE
 * =================================================================
 */

pub mod document;
pub mod mutation;
pub mod store;

pub use document::{AgenticState, BiometricSync, CubeDocumentKey, FaceEntry, WardrobeCubeDocument};
pub use mutation::FieldValue;
pub use store::{ChangeEvent, ChangeKind, FacePatch, StateCacheStore};
