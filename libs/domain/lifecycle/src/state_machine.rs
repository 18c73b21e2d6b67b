// [libs/domain/lifecycle/src/state_machine.rs]
//! Maquina de estados del ciclo de vida del activo. Sin IO: el
//! verificador de burn-proof corre aguas arriba (spine-infra-ledger) y
//! llega aqui ya colapsado a `Option<bool>`.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use spine_domain_models::{LifecycleEvent, LifecycleState, TransitionRequest, TransitionResult};

use crate::errors::LifecycleError;
use crate::esg_impact::impact_for;

/// Las unicas aristas legales del grafo de transicion.
pub const VALID_TRANSITIONS: &[(LifecycleState, LifecycleState)] = &[
    (LifecycleState::Produced, LifecycleState::Active),
    (LifecycleState::Active, LifecycleState::Repair),
    (LifecycleState::Active, LifecycleState::Dissolve),
    (LifecycleState::Repair, LifecycleState::Active),
    (LifecycleState::Repair, LifecycleState::Dissolve),
    (LifecycleState::Dissolve, LifecycleState::Reprint),
    (LifecycleState::Reprint, LifecycleState::Produced),
];

pub fn is_valid_transition(from: LifecycleState, to: LifecycleState) -> bool {
    VALID_TRANSITIONS.contains(&(from, to))
}

pub fn hash_dissolve_auth_key(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hex::encode(hasher.finalize())
}

/// Aplica una transicion si es legal y sus gates de autorizacion pasan.
/// `dissolve_auth_key_hash` es el hash almacenado en el activo (de una
/// `authorize_dissolve` previa); `burn_proof_valid` es `None` cuando la
/// transicion destino no es REPRINT (el verificador no corre), y
/// `Some(bool)` con el veredicto ya resuelto por el verificador externo
/// en caso contrario.
#[allow(clippy::too_many_arguments)]
pub fn authorize_and_apply(
    current_state: LifecycleState,
    dissolve_auth_key_hash: Option<&str>,
    request: &TransitionRequest,
    burn_proof_valid: Option<bool>,
    event_id: String,
    now: DateTime<Utc>,
) -> Result<TransitionResult, LifecycleError> {
    let target = request.target_state;

    if !is_valid_transition(current_state, target) {
        return Err(LifecycleError::InvalidTransition {
            from: current_state.as_str().to_string(),
            to: target.as_str().to_string(),
        });
    }

    let mut dissolve_auth_verified = false;
    if target == LifecycleState::Dissolve {
        let supplied = request.dissolve_auth_key.as_deref().ok_or(LifecycleError::DissolveAuthRequired)?;
        let stored = dissolve_auth_key_hash.ok_or(LifecycleError::DissolveAuthRequired)?;
        if hash_dissolve_auth_key(supplied) != stored {
            return Err(LifecycleError::DissolveAuthRequired);
        }
        dissolve_auth_verified = true;
    }

    if current_state == LifecycleState::Dissolve && target == LifecycleState::Reprint {
        if request.burn_proof_hash.is_none() || request.parent_material_batch.is_none() {
            return Err(LifecycleError::BurnProofRequired);
        }
        match burn_proof_valid {
            Some(true) => {}
            Some(false) => return Err(LifecycleError::BurnProofInvalid),
            None => return Err(LifecycleError::BurnProofRequired),
        }
    }

    let impact = impact_for(current_state, target);

    Ok(TransitionResult {
        event: LifecycleEvent {
            event_id,
            asset_id: request.asset_id.clone(),
            from_state: Some(current_state),
            to_state: target,
            triggered_by: request.requested_by.clone(),
            trigger_type: request.trigger_type,
            dissolve_auth_verified,
            burn_proof_hash: request.burn_proof_hash.clone(),
            parent_material_batch: request.parent_material_batch.clone(),
            esg_delta: impact.esg_delta,
            carbon_saved_kg: impact.carbon_saved_kg,
            water_saved_liters: impact.water_saved_liters,
            occurred_at: now,
        },
    })
}

/// `reprint_generation` solo se incrementa en la transicion terminal
/// REPRINT->PRODUCED; el llamador (repositorio) aplica este delta sobre
/// la fila de Asset dentro de la misma transaccion que inserta el evento.
pub fn reprint_generation_delta(from: LifecycleState, to: LifecycleState) -> u32 {
    if from == LifecycleState::Reprint && to == LifecycleState::Produced {
        1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use spine_domain_models::TriggerType;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
    }

    fn base_request(target: LifecycleState) -> TransitionRequest {
        TransitionRequest {
            asset_id: "asset-1".to_string(),
            requested_by: "user-1".to_string(),
            trigger_type: TriggerType::User,
            target_state: target,
            dissolve_auth_key: None,
            burn_proof_hash: None,
            parent_material_batch: None,
            reason: None,
        }
    }

    #[test]
    fn rejects_illegal_transition() {
        let req = base_request(LifecycleState::Dissolve);
        let err = authorize_and_apply(LifecycleState::Produced, None, &req, None, "e1".to_string(), now());
        assert_eq!(
            err.unwrap_err(),
            LifecycleError::InvalidTransition { from: "PRODUCED".to_string(), to: "DISSOLVE".to_string() }
        );
    }

    #[test]
    fn dissolve_requires_matching_auth_key() {
        let mut req = base_request(LifecycleState::Dissolve);
        req.dissolve_auth_key = Some("wrong-key".to_string());
        let stored = hash_dissolve_auth_key("correct-key");
        let err = authorize_and_apply(LifecycleState::Active, Some(&stored), &req, None, "e1".to_string(), now());
        assert_eq!(err.unwrap_err(), LifecycleError::DissolveAuthRequired);
    }

    #[test]
    fn dissolve_succeeds_with_matching_key() {
        let mut req = base_request(LifecycleState::Dissolve);
        req.dissolve_auth_key = Some("correct-key".to_string());
        let stored = hash_dissolve_auth_key("correct-key");
        let result = authorize_and_apply(LifecycleState::Active, Some(&stored), &req, None, "e1".to_string(), now()).unwrap();
        assert!(result.event.dissolve_auth_verified);
        assert_eq!(result.event.esg_delta, 0.0);
    }

    #[test]
    fn reprint_requires_burn_proof_fields() {
        let req = base_request(LifecycleState::Reprint);
        let err = authorize_and_apply(LifecycleState::Dissolve, None, &req, None, "e1".to_string(), now());
        assert_eq!(err.unwrap_err(), LifecycleError::BurnProofRequired);
    }

    #[test]
    fn reprint_rejects_invalid_burn_proof() {
        let mut req = base_request(LifecycleState::Reprint);
        req.burn_proof_hash = Some("abc123".to_string());
        req.parent_material_batch = Some("batch-7".to_string());
        let err = authorize_and_apply(LifecycleState::Dissolve, None, &req, Some(false), "e1".to_string(), now());
        assert_eq!(err.unwrap_err(), LifecycleError::BurnProofInvalid);
    }

    #[test]
    fn reprint_applies_esg_impact_on_valid_burn_proof() {
        let mut req = base_request(LifecycleState::Reprint);
        req.burn_proof_hash = Some("abc123".to_string());
        req.parent_material_batch = Some("batch-7".to_string());
        let result = authorize_and_apply(LifecycleState::Dissolve, None, &req, Some(true), "e1".to_string(), now()).unwrap();
        assert_eq!(result.event.esg_delta, 0.3);
        assert_eq!(result.event.carbon_saved_kg, 8.0);
        assert_eq!(result.event.water_saved_liters, 200.0);
    }

    #[test]
    fn reprint_to_produced_increments_generation() {
        assert_eq!(reprint_generation_delta(LifecycleState::Reprint, LifecycleState::Produced), 1);
        assert_eq!(reprint_generation_delta(LifecycleState::Active, LifecycleState::Repair), 0);
    }
}
