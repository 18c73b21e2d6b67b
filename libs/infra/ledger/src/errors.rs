// [libs/infra/ledger/src/errors.rs]
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("[L4_LEDGER_NET_FAULT]: adapter unreachable after retries -> {0}")]
    Unreachable(String),

    /// 4xx from the adapter: permanent rejection, never retried.
    #[error("[L4_LEDGER_REJECTED]: permanent rejection from adapter -> {0}")]
    PermanentRejection(String),

    #[error("[L4_LEDGER_DECODE_FAULT]: malformed adapter response -> {0}")]
    DecodeError(String),
}
