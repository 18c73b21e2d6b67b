// [libs/domain/lifecycle/src/errors.rs]
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("[L2_LIFECYCLE_INVALID_TRANSITION] no valid path from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("[L2_LIFECYCLE_DISSOLVE_AUTH_REQUIRED] dissolve_auth_key missing or does not match the asset's stored hash")]
    DissolveAuthRequired,

    #[error("[L2_LIFECYCLE_BURN_PROOF_REQUIRED] burn_proof_hash and parent_material_batch are both required for REPRINT")]
    BurnProofRequired,

    #[error("[L2_LIFECYCLE_BURN_PROOF_INVALID] burn-proof verifier rejected the supplied proof")]
    BurnProofInvalid,
}
