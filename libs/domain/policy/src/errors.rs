// [libs/domain/policy/src/errors.rs]
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("[L2_POLICY_UNKNOWN_REGION] no region rule document registered for region code '{0}'")]
    UnknownRegion(String),

    #[error("[L2_POLICY_MISSING_FACET] action requires a facet but none was supplied")]
    MissingFacet,

    #[error("[L2_POLICY_AMBIGUOUS_TRANSFER] caller must supply an explicit transfer_type")]
    AmbiguousTransferType,
}
