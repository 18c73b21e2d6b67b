// [apps/integrity-spine/src/handlers/policy.rs]
/*!
 * =================================================================
 * APARATO: POLICY ENGINE ADAPTER (V1.0 - SPINE GENESIS)
 * CLASIFICACION: API ADAPTER LAYER (ESTRATO L3)
 * RESPONSABILIDAD: EXPOSICION HTTP DE LA EVALUACION DE CONSENTIMIENTO
 *                   + REGION, SIN EFECTOS SECUNDARIOS
 *
 * Ambas rutas solo leen: ni graban auditoria ni anclan. `/policy/check`
 * y `/policy/canViewFace` comparten la misma composicion
 * (`resolve_consent` + `evaluate`) que el facet service usa
 * internamente; la diferencia es puramente de forma de entrada/salida.
 * =================================================================
 */

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use spine_domain_policy::{evaluate, ActionKind};

use crate::errors::SpineError;
use crate::services::consent::{resolve_consent, ASSET_LEVEL_FACET};
use crate::state::AppState;

fn parse_action(raw: &str) -> ActionKind {
    match raw {
        "transfer_ownership" => ActionKind::TransferOwnership,
        "dissolve" => ActionKind::Dissolve,
        "reprint" => ActionKind::Reprint,
        _ => ActionKind::ViewFacet,
    }
}

#[derive(Debug, Deserialize)]
pub struct PolicyCheckRequest {
    pub scanner_user_id: String,
    pub owner_id: String,
    pub garment_id: String,
    pub facet: Option<String>,
    pub region_code: String,
    #[serde(default)]
    pub action: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PolicyCheckResponse {
    pub decision: String,
    pub resolved_scope: String,
    pub policy_version: String,
    pub reason: String,
}

/// `/policy/check`: evaluacion general de una accion sobre un activo,
/// sin comprometer ningun verificador externo -- las acciones
/// transaccionales que dependen de un verificador se resuelven siempre
/// en `escalate` aqui, porque esta ruta nunca recibe el resultado de
/// ESG/burn-proof. Solo el orquestador, que si los consulta, puede
/// convertir esa escalada en un `allow` o `deny` definitivo.
pub async fn check(State(state): State<AppState>, Json(body): Json<PolicyCheckRequest>) -> Result<Json<PolicyCheckResponse>, SpineError> {
    let conn = state.db.acquire_read_session().await?;
    let facet = body.facet.as_deref().unwrap_or(ASSET_LEVEL_FACET);
    let consent = resolve_consent(&conn, &body.scanner_user_id, &body.owner_id, &body.garment_id, facet).await?;
    let action = parse_action(body.action.as_deref().unwrap_or("request_passport_view"));
    let verifier_outcomes = if action.is_transactional() { vec![None] } else { vec![] };
    let outcome = evaluate(&consent, &body.region_code, action, &verifier_outcomes);

    Ok(Json(PolicyCheckResponse {
        decision: consent_decision_str(&outcome.decision).to_string(),
        resolved_scope: consent.visibility.as_str().to_string(),
        policy_version: outcome.policy_version,
        reason: outcome.reason,
    }))
}

#[derive(Debug, Deserialize)]
pub struct CanViewFaceRequest {
    pub viewer_id: String,
    pub owner_id: String,
    pub cube_id: String,
    pub face_name: String,
}

#[derive(Debug, Serialize)]
pub struct CanViewFaceResponse {
    pub decision: String,
    pub visibility: String,
}

/// `/policy/canViewFace`: atajo booleano-equivalente usado por clientes
/// que solo necesitan saber si vale la pena pedir la faceta completa,
/// sin pagar el costo de traer su contenido del cache de estado.
pub async fn can_view_face(State(state): State<AppState>, Json(body): Json<CanViewFaceRequest>) -> Result<Json<CanViewFaceResponse>, SpineError> {
    let conn = state.db.acquire_read_session().await?;
    let consent = resolve_consent(&conn, &body.viewer_id, &body.owner_id, &body.cube_id, &body.face_name).await?;
    let outcome = evaluate(&consent, &state.region_default, ActionKind::ViewFacet, &[]);

    Ok(Json(CanViewFaceResponse { decision: consent_decision_str(&outcome.decision).to_string(), visibility: consent.visibility.as_str().to_string() }))
}

fn consent_decision_str(decision: &spine_domain_models::ConsentDecision) -> &'static str {
    match decision {
        spine_domain_models::ConsentDecision::Allow => "allow",
        spine_domain_models::ConsentDecision::Deny => "deny",
        spine_domain_models::ConsentDecision::Escalate => "escalate",
    }
}
