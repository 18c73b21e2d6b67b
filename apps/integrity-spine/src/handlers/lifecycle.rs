// [apps/integrity-spine/src/handlers/lifecycle.rs]
/*!
 * =================================================================
 * APARATO: LIFECYCLE ADAPTER (V1.0 - SPINE GENESIS)
 * CLASIFICACION: API ADAPTER LAYER (ESTRATO L3)
 * RESPONSABILIDAD: EXPOSICION HTTP DE LA MAQUINA DE ESTADOS
 *                   PRODUCED..REPRINT Y DE LA EMISION DE LA LLAVE DE
 *                   AUTORIZACION DE DISOLUCION
 *
 * `transition` es la unica puerta de escritura sobre el estado de
 * ciclo de vida de un activo: trae el estado actual, deja que
 * `spine-domain-lifecycle` (logica pura) decida si la transicion es
 * legal y si sus gates pasan, persiste el evento, y sella una entrada
 * de auditoria describiendolo. `authorize_dissolve` es un tramite
 * aparte que nunca muta el estado: solo emite la llave en claro que
 * el propietario debera volver a presentar en una transicion a
 * DISSOLVE.
 * =================================================================
 */

use axum::extract::{Path, State};
use axum::Json;
use rand::Rng;
use serde::{Deserialize, Serialize};
use spine_domain_lifecycle::{authorize_and_apply, hash_dissolve_auth_key};
use spine_domain_models::{LifecycleEvent, LifecycleState, TransitionRequest, TriggerType};
use spine_infra_db::repositories::{AssetRepository, AuditRepository, LifecycleRepository};
use uuid::Uuid;

use crate::errors::SpineError;
use crate::services::verifiers;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TransitionBody {
    pub requested_by: String,
    #[serde(default)]
    pub trigger_type: TriggerTypeWire,
    pub target_state: String,
    pub dissolve_auth_key: Option<String>,
    pub burn_proof_hash: Option<String>,
    pub parent_material_batch: Option<String>,
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TriggerTypeWire {
    #[default]
    User,
    Agent,
    System,
}

impl From<TriggerTypeWire> for TriggerType {
    fn from(value: TriggerTypeWire) -> Self {
        match value {
            TriggerTypeWire::User => TriggerType::User,
            TriggerTypeWire::Agent => TriggerType::Agent,
            TriggerTypeWire::System => TriggerType::System,
        }
    }
}

/// `/cubes/:cube_id/lifecycle/transition`: el burn-proof solo se
/// consulta cuando la transicion realmente lo necesita (DISSOLVE ->
/// REPRINT); cualquier otra transicion pasa `None` a
/// `authorize_and_apply`, que la ignora por construccion.
pub async fn transition(
    State(state): State<AppState>,
    Path(cube_id): Path<String>,
    Json(body): Json<TransitionBody>,
) -> Result<Json<LifecycleEvent>, SpineError> {
    let target_state = LifecycleState::parse(&body.target_state)
        .ok_or_else(|| SpineError::Validation(format!("unknown lifecycle target_state {}", body.target_state)))?;

    let conn = state.db.acquire_session().await?;
    let (current_state, dissolve_auth_key_hash) = LifecycleRepository::current_state(&conn, &cube_id).await?;

    let burn_proof_valid = if current_state == LifecycleState::Dissolve && target_state == LifecycleState::Reprint {
        match (&body.burn_proof_hash, &body.parent_material_batch) {
            (Some(proof_hash), Some(parent_batch)) => {
                let verification = state.burn_proof_verifier.verify(proof_hash, parent_batch).await;
                verifiers::collapse(&verification)
            }
            _ => None,
        }
    } else {
        None
    };

    let request = TransitionRequest {
        asset_id: cube_id.clone(),
        requested_by: body.requested_by.clone(),
        trigger_type: body.trigger_type.into(),
        target_state,
        dissolve_auth_key: body.dissolve_auth_key,
        burn_proof_hash: body.burn_proof_hash,
        parent_material_batch: body.parent_material_batch,
        reason: body.reason,
    };

    let result = authorize_and_apply(
        current_state,
        dissolve_auth_key_hash.as_deref(),
        &request,
        burn_proof_valid,
        Uuid::new_v4().to_string(),
        chrono::Utc::now(),
    )?;

    LifecycleRepository::commit_transition(&conn, &result).await?;

    let detail = serde_json::json!({
        "from_state": result.event.from_state.map(|s| s.as_str()),
        "to_state": result.event.to_state.as_str(),
        "requested_by": request.requested_by,
        "dissolve_auth_verified": result.event.dissolve_auth_verified,
        "esg_delta": result.event.esg_delta,
    });
    AuditRepository::append(
        &conn,
        &Uuid::new_v4().to_string(),
        &cube_id,
        Some(&body.requested_by),
        "lifecycle_transition",
        "lifecycle_transition_committed",
        &detail,
        false,
        false,
        None,
        None,
    )
    .await?;

    Ok(Json(result.event))
}

#[derive(Debug, Deserialize)]
pub struct AuthorizeDissolveBody {
    pub requested_by: String,
}

#[derive(Debug, Serialize)]
pub struct AuthorizeDissolveResponse {
    pub dissolve_auth_key: String,
}

/// `/cubes/:cube_id/lifecycle/authorize_dissolve`: genera una llave de
/// 32 bytes aleatorios, persiste solo su hash, y devuelve la llave en
/// claro esta unica vez -- no hay manera de recuperarla despues de
/// esta respuesta. No existe capa de autenticacion propia (ver
/// middleware.rs), asi que este es el unico punto que puede negar el
/// tramite a alguien que no sea el propietario actual: sin el, `body`
/// es puramente informativo y cualquier llamador podria emitir una
/// llave de disolucion valida para un activo ajeno.
pub async fn authorize_dissolve(
    State(state): State<AppState>,
    Path(cube_id): Path<String>,
    Json(body): Json<AuthorizeDissolveBody>,
) -> Result<Json<AuthorizeDissolveResponse>, SpineError> {
    let conn = state.db.acquire_session().await?;
    let asset = AssetRepository::get(&conn, &cube_id).await?;
    if body.requested_by != asset.current_owner_id {
        return Err(SpineError::PermissionDenied("not_asset_owner".to_string()));
    }

    let mut key_bytes = [0u8; 32];
    rand::thread_rng().fill(&mut key_bytes);
    let dissolve_auth_key = hex::encode(key_bytes);
    let key_hash = hash_dissolve_auth_key(&dissolve_auth_key);

    AssetRepository::set_dissolve_auth_key_hash(&conn, &cube_id, &key_hash).await?;

    Ok(Json(AuthorizeDissolveResponse { dissolve_auth_key }))
}
