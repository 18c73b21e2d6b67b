// [apps/integrity-spine/src/handlers/governance.rs]
/*!
 * =================================================================
 * APARATO: GOVERNANCE ADAPTER (V1.0 - SPINE GENESIS)
 * CLASIFICACION: API ADAPTER LAYER (ESTRATO L3)
 * RESPONSABILIDAD: COLA DE ESCALAMIENTO Y DECISIONES HUMANAS
 *
 * Un revisor humano ve aqui lo que el motor de politica no pudo
 * resolver solo. Una aprobacion recupera `original_request` del
 * detalle de la entrada escalada y vuelve a invocar la operacion que
 * la produjo (§4.9) -- el revisor es, por definicion, la autoridad de
 * ultima instancia para estos casos, y la entrada escalada original
 * nunca llego a ejecutar ningun efecto que haya que deshacer antes
 * de reintentar.
 * =================================================================
 */

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use spine_domain_models::Facet;
use spine_infra_db::repositories::{AuditRepository, EscalationRow};

use crate::errors::SpineError;
use crate::services::orchestrator::{process_allowed, transfer_ownership};
use crate::state::AppState;

/// `/governance/escalations`: cola de casos pendientes, mas antiguo
/// primero -- el mismo orden en que un revisor humano esperaria
/// atenderlos.
pub async fn list_escalations(State(state): State<AppState>) -> Result<Json<Vec<EscalationRow>>, SpineError> {
    let conn = state.db.acquire_read_session().await?;
    let rows = AuditRepository::list_pending_escalations(&conn).await?;
    Ok(Json(rows))
}

#[derive(Debug, Deserialize)]
pub struct DecisionRequest {
    pub approved: bool,
    pub reviewer_user_id: String,
    #[serde(default)]
    pub note: String,
}

#[derive(Debug, Serialize)]
pub struct DecisionResponse {
    pub subject_id: String,
    pub approved: bool,
    pub entry_id: String,
    pub replayed: bool,
}

/// `/governance/escalations/:scan_id/decision`: cierra el caso mas
/// reciente pendiente de ese sujeto. Una aprobacion recupera
/// `original_request` del detalle de la entrada escalada y vuelve a
/// invocar la operacion original (§4.9) -- el llamador nunca
/// reconstruye el pedido: el revisor solo confirma que, por ejemplo,
/// el verificador ESG que antes era inalcanzable ya quedo resuelto
/// fuera de banda. Un rechazo solo deja constancia; no hay nada que
/// reintentar.
pub async fn decide_escalation(
    State(state): State<AppState>,
    Path(scan_id): Path<String>,
    Json(body): Json<DecisionRequest>,
) -> Result<Json<DecisionResponse>, SpineError> {
    let conn = state.db.acquire_session().await?;
    let resolved = AuditRepository::resolve_escalation(&conn, &scan_id, body.approved, &body.reviewer_user_id, &body.note)
        .await?
        .ok_or_else(|| SpineError::NotFound(format!("no pending escalation for {scan_id}")))?;

    let replayed = if body.approved {
        replay_original_request(&state, &resolved.detail).await?
    } else {
        false
    };

    Ok(Json(DecisionResponse { subject_id: resolved.subject_id, approved: body.approved, entry_id: resolved.entry_id, replayed }))
}

/// Reconoce `replay_kind`/`original_request` en el detalle de la
/// entrada escalada y vuelve a invocar la operacion que los produjo.
/// Ausencia de cualquiera de los dos campos significa que la entrada
/// se escalo manualmente via `/audit/escalate`, que no lleva pedido
/// original que repetir -- la aprobacion en ese caso solo es
/// constancia humana.
async fn replay_original_request(state: &AppState, detail: &serde_json::Value) -> Result<bool, SpineError> {
    let Some(kind) = detail.get("replay_kind").and_then(|v| v.as_str()) else { return Ok(false) };
    let Some(original) = detail.get("original_request") else { return Ok(false) };

    match kind {
        "transfer_ownership" => {
            let cube_id = field_str(original, "cube_id")?;
            let from = field_str(original, "from")?;
            let to = field_str(original, "to")?;
            let method = field_str(original, "method")?;
            let price = original.get("price").and_then(|v| v.as_f64());
            transfer_ownership(state, &cube_id, &from, &to, &method, price).await?;
            Ok(true)
        }
        "process_allowed" => {
            let scan_id = field_str(original, "scan_id")?;
            let scanner_user_id = field_str(original, "scanner_user_id")?;
            let garment_tag = field_str(original, "garment_tag")?;
            let region_code = field_str(original, "region_code")?;
            let owner_id = field_str(original, "owner_id")?;
            let policy_version = field_str(original, "policy_version")?;
            process_allowed(
                state,
                &scan_id,
                &scanner_user_id,
                &owner_id,
                &garment_tag,
                &Facet::ALL,
                &policy_version,
                &region_code,
                "request_passport_view",
            )
            .await?;
            Ok(true)
        }
        _ => Ok(false),
    }
}

fn field_str(value: &serde_json::Value, name: &str) -> Result<String, SpineError> {
    value
        .get(name)
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| SpineError::Internal(format!("original_request missing field {name}")))
}
