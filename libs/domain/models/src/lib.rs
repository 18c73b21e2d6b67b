// [libs/domain/models/src/lib.rs]
/*!
 * =================================================================
 * APARATO: DOMAIN MODEL ROOT (V1.0 - SPINE GENESIS)
 * CLASIFICACION: CRATE ROOT (ESTRATO L2)
 * RESPONSABILIDAD: DEFINICION SUPREMA DEL ARBOL DE TIPOS DE DOMINIO
 *
 * Unica fuente de verdad para las entidades que cruzan limites de
 * crate: Usuario, Activo, Cadena de Provenance, Politicas de Consentimiento,
 * Amistad, Log de Mutaciones (idempotencia), Cadena de Auditoria,
 * Ciclo de Vida y el documento de estado en tiempo real del cubo.
 * =================================================================
 */

pub mod asset;
pub mod audit;
pub mod consent;
pub mod cube;
pub mod friendship;
pub mod lifecycle;
pub mod mutation;
pub mod provenance;
pub mod user;
pub mod verifier;

pub use asset::{Asset, LifecycleState};
pub use audit::{AnchorStatus, AuditEntry, ChainAnchor};
pub use consent::{ConsentDecision, ConsentPolicy, ConsentScope, ConsentScopeKind, Visibility};
pub use cube::{CubeDocument, FaceState, Facet};
pub use friendship::{FriendRequestStatus, FriendsWith, FriendshipStatus};
pub use lifecycle::{LifecycleEvent, TransitionRequest, TransitionResult, TriggerType};
pub use mutation::{MutationLogRow, MutationOutcome};
pub use provenance::{ChainVerification, ProvenanceEntry, TransferType};
pub use user::User;
pub use verifier::{EsgScore, VerifierResult};
