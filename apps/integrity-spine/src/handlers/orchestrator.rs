// [apps/integrity-spine/src/handlers/orchestrator.rs]
/*!
 * =================================================================
 * APARATO: ORCHESTRATOR ADAPTER (V1.0 - SPINE GENESIS)
 * CLASIFICACION: API ADAPTER LAYER (ESTRATO L3)
 * RESPONSABILIDAD: RESOLUCION DE INTENT DE ESCANEO Y EJECUCION DE
 *                   TRANSFERENCIAS DE PROPIEDAD DESDE HTTP
 *
 * `resolve_intent` es la puerta de entrada de un escaneo: evalua
 * politica + region sobre el activo completo y, si el resultado es
 * `allow`, delega en `services::orchestrator::process_allowed` para
 * correr las seis fases de persistencia/anclaje. Una escalada nunca
 * llega a esas fases -- queda registrada para revision humana y el
 * cliente recibe `escalation_id` en lugar de un anclaje.
 * =================================================================
 */

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use spine_domain_models::{ConsentDecision, Facet};
use spine_domain_policy::{evaluate, ActionKind};
use spine_infra_db::repositories::{AssetRepository, AuditRepository};
use uuid::Uuid;

use crate::errors::SpineError;
use crate::services::consent::{resolve_consent, ASSET_LEVEL_FACET};
use crate::services::orchestrator::{process_allowed, transfer_ownership, TransferOutcome};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct IntentResolveRequest {
    pub scan_id: String,
    pub scanner_user_id: String,
    pub garment_tag: String,
    pub region_code: String,
}

#[derive(Debug, Serialize)]
pub struct IntentResolveResponse {
    pub action: String,
    pub garment_id: String,
    pub decision: String,
    pub resolved_scope: String,
    pub policy_version: String,
    pub anchored: Option<bool>,
    pub partial_anchor: Option<bool>,
    pub cardano_tx_hash: Option<String>,
    pub midnight_tx_hash: Option<String>,
    pub crosschain_root_hash: Option<String>,
    pub escalation_id: Option<String>,
}

/// `/intent/resolve`: un escaneo fisico pasa por aqui antes de que el
/// cliente sepa si puede pedir facetas individuales. `allow` dispara
/// de inmediato las seis fases (persistencia + anclaje dual-ledger);
/// `deny`/`escalate` nunca las alcanzan.
pub async fn resolve_intent(State(state): State<AppState>, Json(body): Json<IntentResolveRequest>) -> Result<Json<IntentResolveResponse>, SpineError> {
    let action = "request_passport_view";
    // Sesion de escritura: una escalada sella una entrada de auditoria
    // sobre esta misma conexion, y las escrituras nunca deben degradar
    // al cupo de respaldo de `acquire_read_session`.
    let conn = state.db.acquire_session().await?;
    let asset = AssetRepository::get(&conn, &body.garment_tag).await?;
    let owner_id = asset.current_owner_id.clone();

    let consent = resolve_consent(&conn, &body.scanner_user_id, &owner_id, &body.garment_tag, ASSET_LEVEL_FACET).await?;
    let outcome = evaluate(&consent, &body.region_code, ActionKind::ViewFacet, &[]);

    match outcome.decision {
        ConsentDecision::Deny => Ok(Json(IntentResolveResponse {
            action: action.to_string(),
            garment_id: body.garment_tag,
            decision: "deny".to_string(),
            resolved_scope: consent.visibility.as_str().to_string(),
            policy_version: outcome.policy_version,
            anchored: None,
            partial_anchor: None,
            cardano_tx_hash: None,
            midnight_tx_hash: None,
            crosschain_root_hash: None,
            escalation_id: None,
        })),
        ConsentDecision::Escalate => {
            let detail = json!({
                "reason": outcome.reason,
                "region_code": body.region_code,
                "policy_version": outcome.policy_version,
                "scanner_user_id": body.scanner_user_id,
                "owner_id": owner_id,
                "replay_kind": "process_allowed",
                "original_request": {
                    "scan_id": body.scan_id,
                    "scanner_user_id": body.scanner_user_id,
                    "garment_tag": body.garment_tag,
                    "region_code": body.region_code,
                    "owner_id": owner_id,
                    "policy_version": outcome.policy_version,
                },
            });
            let entry = AuditRepository::append(
                &conn,
                &Uuid::new_v4().to_string(),
                &body.scan_id,
                Some(&body.scanner_user_id),
                action,
                "intent_escalated",
                &detail,
                true,
                true,
                None,
                None,
            )
            .await?;
            Ok(Json(IntentResolveResponse {
                action: action.to_string(),
                garment_id: body.garment_tag,
                decision: "escalate".to_string(),
                resolved_scope: consent.visibility.as_str().to_string(),
                policy_version: outcome.policy_version,
                anchored: None,
                partial_anchor: None,
                cardano_tx_hash: None,
                midnight_tx_hash: None,
                crosschain_root_hash: None,
                escalation_id: Some(entry.entry_id),
            }))
        }
        ConsentDecision::Allow => {
            let process_outcome = process_allowed(
                &state,
                &body.scan_id,
                &body.scanner_user_id,
                &owner_id,
                &body.garment_tag,
                &Facet::ALL,
                &outcome.policy_version,
                &body.region_code,
                action,
            )
            .await?;

            Ok(Json(IntentResolveResponse {
                action: action.to_string(),
                garment_id: body.garment_tag,
                decision: "allow".to_string(),
                resolved_scope: consent.visibility.as_str().to_string(),
                policy_version: outcome.policy_version,
                anchored: Some(process_outcome.anchored),
                partial_anchor: Some(process_outcome.partial_anchor),
                cardano_tx_hash: process_outcome.cardano_tx_hash,
                midnight_tx_hash: process_outcome.midnight_tx_hash,
                crosschain_root_hash: process_outcome.crosschain_root_hash,
                escalation_id: None,
            }))
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ExecuteTransferRequest {
    pub cube_id: String,
    pub from: String,
    pub to: String,
    pub method: String,
    pub price: Option<f64>,
}

/// `/execute/transfer_ownership`: alias orquestador-first de
/// `cube::transfer_ownership_endpoint`. Ambas rutas llaman a la misma
/// puerta de escritura idempotente; esta existe porque el cliente
/// orquestador no siempre conoce el `cube_id` de antemano via path.
pub async fn execute_transfer_ownership(State(state): State<AppState>, Json(body): Json<ExecuteTransferRequest>) -> Result<Json<TransferOutcome>, SpineError> {
    let outcome = transfer_ownership(&state, &body.cube_id, &body.from, &body.to, &body.method, body.price).await?;
    Ok(Json(outcome))
}
