// [apps/integrity-spine/src/handlers/audit.rs]
/*!
 * =================================================================
 * APARATO: AUDIT LOG ADAPTER (V1.0 - SPINE GENESIS)
 * CLASIFICACION: API ADAPTER LAYER (ESTRATO L3)
 * RESPONSABILIDAD: EXPOSICION HTTP DE LA BITACORA ENCADENADA POR HASH
 *                   Y DEL ANCLAJE DUAL-LEDGER MANUAL
 *
 * `log`/`explain` hablan de entradas individuales; `anchorChain`
 * permite a un llamador externo fijar transacciones de ancla ya
 * confirmadas sin re-correr `anchor_both` (uso principal: pruebas de
 * integracion y reconciliacion manual tras un incidente). `escalate`
 * es la unica manera de empujar un sujeto directo a la cola de
 * gobernanza sin pasar por una decision de politica previa.
 * =================================================================
 */

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use spine_infra_db::repositories::{AuditExplainView, AuditRepository, ChainAnchorRepository};
use uuid::Uuid;

use crate::errors::SpineError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AuditLogRequest {
    pub subject_id: String,
    pub actor_user_id: Option<String>,
    pub action: String,
    pub summary: String,
    #[serde(default)]
    pub detail: Value,
    #[serde(default)]
    pub risk_flagged: bool,
    #[serde(default)]
    pub escalated_to_human: bool,
}

#[derive(Debug, Serialize)]
pub struct AuditLogResponse {
    pub entry_id: String,
    pub sequence_num: i64,
    pub entry_hash: String,
}

/// `/audit/log`: punto de entrada directo a la bitacora para
/// llamadores que ya tienen su propia decision tomada (p.ej. el
/// verificador de disolucion, desde `lifecycle::transition`). El
/// orquestador y `transfer_ownership` nunca pasan por aqui: ellos
/// llaman `AuditRepository::append` directamente para mantener su
/// propia transaccion.
pub async fn log(State(state): State<AppState>, Json(body): Json<AuditLogRequest>) -> Result<Json<AuditLogResponse>, SpineError> {
    let conn = state.db.acquire_session().await?;
    let entry = AuditRepository::append(
        &conn,
        &Uuid::new_v4().to_string(),
        &body.subject_id,
        body.actor_user_id.as_deref(),
        &body.action,
        &body.summary,
        &body.detail,
        body.risk_flagged,
        body.escalated_to_human,
        None,
        None,
    )
    .await?;

    Ok(Json(AuditLogResponse { entry_id: entry.entry_id, sequence_num: entry.sequence_num, entry_hash: entry.entry_hash }))
}

#[derive(Debug, Deserialize)]
pub struct AnchorChainRequest {
    pub subject_id: String,
    pub cardano_tx_hash: Option<String>,
    pub midnight_tx_hash: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AnchorChainResponse {
    pub anchor_id: String,
    pub status: String,
}

/// `/audit/anchorChain`: fija manualmente las transacciones de ancla
/// de un sujeto. Si el sujeto no tiene ancla previa, nace una
/// `pending` sobre la secuencia mas reciente de su bitacora antes de
/// grabar las transacciones suministradas.
pub async fn anchor_chain(State(state): State<AppState>, Json(body): Json<AnchorChainRequest>) -> Result<Json<AnchorChainResponse>, SpineError> {
    let conn = state.db.acquire_session().await?;

    let anchor = match ChainAnchorRepository::latest_for_subject(&conn, &body.subject_id).await? {
        Some(existing) => existing,
        None => {
            let (up_to_sequence_num, _) = AuditRepository::latest(&conn, &body.subject_id).await?.unwrap_or((0, String::new()));
            let anchor_id = Uuid::new_v4().to_string();
            let placeholder_root = format!("manual:{}", body.subject_id);
            ChainAnchorRepository::create_pending(&conn, &anchor_id, &body.subject_id, up_to_sequence_num, &placeholder_root).await?
        }
    };

    if let Some(tx) = &body.cardano_tx_hash {
        ChainAnchorRepository::record_cardano_tx(&conn, &anchor.anchor_id, tx).await?;
    }
    if let Some(tx) = &body.midnight_tx_hash {
        ChainAnchorRepository::record_midnight_tx(&conn, &anchor.anchor_id, tx).await?;
    }

    let refreshed = ChainAnchorRepository::latest_for_subject(&conn, &body.subject_id)
        .await?
        .ok_or_else(|| SpineError::Internal("anchor vanished immediately after write".to_string()))?;

    Ok(Json(AnchorChainResponse { anchor_id: refreshed.anchor_id, status: anchor_status_str(refreshed.status).to_string() }))
}

fn anchor_status_str(status: spine_domain_models::AnchorStatus) -> &'static str {
    match status {
        spine_domain_models::AnchorStatus::Pending => "pending",
        spine_domain_models::AnchorStatus::Partial => "partial",
        spine_domain_models::AnchorStatus::Anchored => "anchored",
        spine_domain_models::AnchorStatus::Failed => "failed",
    }
}

/// `/audit/:scan_id/explain`: la unica ventana de solo-lectura de
/// lista blanca hacia la bitacora -- ve `AuditExplainView` para los
/// campos que pueden atravesar esta frontera.
pub async fn explain(State(state): State<AppState>, Path(scan_id): Path<String>) -> Result<Json<AuditExplainView>, SpineError> {
    let conn = state.db.acquire_read_session().await?;
    let view = AuditRepository::explain(&conn, &scan_id).await?.ok_or_else(|| SpineError::NotFound(format!("no audit entries for {scan_id}")))?;
    Ok(Json(view))
}

#[derive(Debug, Deserialize)]
pub struct EscalateRequest {
    pub subject_id: String,
    pub actor_user_id: Option<String>,
    pub action: String,
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct EscalateResponse {
    pub escalation_id: String,
}

/// `/audit/escalate`: empuja un sujeto a la cola de gobernanza sin
/// pasar por una evaluacion de politica -- uso principal: un
/// moderador humano abre un caso manual sobre un activo que no
/// disparo ninguna escalada automatica.
pub async fn escalate(State(state): State<AppState>, Json(body): Json<EscalateRequest>) -> Result<Json<EscalateResponse>, SpineError> {
    let conn = state.db.acquire_session().await?;
    let detail = serde_json::json!({ "reason": body.reason, "manual_escalation": true });
    let entry = AuditRepository::append(
        &conn,
        &Uuid::new_v4().to_string(),
        &body.subject_id,
        body.actor_user_id.as_deref(),
        &body.action,
        "manual_escalation",
        &detail,
        true,
        true,
        None,
        None,
    )
    .await?;

    Ok(Json(EscalateResponse { escalation_id: entry.entry_id }))
}
