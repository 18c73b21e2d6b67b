// [apps/integrity-spine/src/services/verifiers.rs]
//! Colapso de `VerifierResult<T>` al tipo binario que consume el motor
//! de politica: `Some(true)` valido, `Some(false)` invalido,
//! `None` inalcanzable. El modo stub ya viene cerrado por el
//! verificador mismo (solo corre si `allow_stub_fallback=true`), asi
//! que este punto no necesita volver a distinguirlo.

use spine_domain_models::VerifierResult;
use spine_domain_policy::VerifierOutcome;

pub fn collapse<T>(result: &VerifierResult<T>) -> VerifierOutcome {
    match result {
        VerifierResult::Valid(_) => Some(true),
        VerifierResult::Invalid { .. } => Some(false),
        VerifierResult::Unavailable { .. } => None,
    }
}
