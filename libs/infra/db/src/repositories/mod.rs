// [libs/infra/db/src/repositories/mod.rs]
//! Un repositorio por agregado. Cada uno encapsula su propio SQL y sus
//! propias fronteras transaccionales; no hay un "repositorio generico"
//! que las sobreponga.

pub mod assets;
pub mod audit;
pub mod chain_anchor;
pub mod consent;
pub mod friendship;
pub mod lifecycle;
pub mod mutation_log;
pub mod provenance;
pub mod users;
pub mod verifier_cache;

pub use assets::AssetRepository;
pub use audit::{AuditExplainView, AuditRepository, EscalationRow};
pub use chain_anchor::ChainAnchorRepository;
pub use consent::ConsentRepository;
pub use friendship::FriendshipRepository;
pub use lifecycle::LifecycleRepository;
pub use mutation_log::{compute_mutation_id, BeginOutcome, MutationLogRepository};
pub use provenance::{AssetProvenance, ProvenanceRepository};
pub use users::UserRepository;
pub use verifier_cache::DbVerifierCache;
