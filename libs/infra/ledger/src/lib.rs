// [libs/infra/ledger/src/lib.rs]
/*!
 * =================================================================
 * APARATO: DUAL-LEDGER ADAPTER (V1.0 - SPINE GENESIS)
 * CLASIFICACION: INFRASTRUCTURE ADAPTER (ESTRATO L4)
 * RESPONSABILIDAD: ENVIO DE ANCLAS A CARDANO + MIDNIGHT, VERIFICACION
 *                   EXTERNA DE BURN-PROOF Y ESG
 *
 * Cliente HTTP con timeout + reintento con backoff por cada cadena,
 * mas los dos verificadores externos que comparten la misma politica
 * de degradacion (`require_ledger` / `allow_stub_fallback`).
 * =================================================================
 */

pub mod anchor;
pub mod burn_proof;
pub mod cache;
pub mod errors;
pub mod esg;

pub use anchor::{anchor_both, cross_chain_root, AnchorClient, AnchorSubmission, DualAnchorOutcome, LedgerName};
pub use burn_proof::{BurnProofDetail, BurnProofVerifier};
pub use cache::{NoopVerifierCache, VerifierCache};
pub use errors::LedgerError;
pub use esg::{effective_threshold, threshold_for, EsgVerifier};
