// [apps/integrity-spine/src/services/orchestrator.rs]
/*!
 * =================================================================
 * APARATO: INTEGRITY ORCHESTRATOR (V1.0 - SPINE GENESIS)
 * CLASIFICACION: APPLICATION SERVICE (ESTRATO L4)
 * RESPONSABILIDAD: COMPOSICION DE FASES DE process_allowed
 *
 * Seis fases independientes, cada una con su propio presupuesto de
 * reintento: persistir el evento de scan, traer las facetas visibles,
 * anclar en paralelo a los dos ledgers, calcular la raiz cruzada,
 * sellar la entrada de auditoria y publicar al cache de estado. Un
 * unico flujo sincrono de fases: no hay trabajo en segundo plano que
 * reconciliar, solo una peticion que atraviesa pasos con fronteras de
 * reintento distintas.
 * =================================================================
 */

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::json;
use spine_domain_models::{Facet, TransferType};
use spine_domain_policy::{self as policy, ActionKind};
use spine_infra_db::repositories::{
    compute_mutation_id, AssetRepository, AuditRepository, BeginOutcome, ChainAnchorRepository, MutationLogRepository,
    ProvenanceRepository,
};
use spine_infra_ledger::{anchor_both, AnchorSubmission};
use spine_infra_state_cache::{CubeDocumentKey, FacePatch};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::errors::SpineError;
use crate::services::verifiers;
use crate::state::AppState;

#[derive(Debug, Clone, Serialize)]
pub struct ScopedFacet {
    pub facet: Facet,
    pub data: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessAllowedOutcome {
    pub scan_id: String,
    pub anchored: bool,
    pub partial_anchor: bool,
    pub cardano_tx_hash: Option<String>,
    pub midnight_tx_hash: Option<String>,
    pub crosschain_root_hash: Option<String>,
    pub shown_facets: Vec<Facet>,
    pub entry_hash: String,
}

/// Unica entrada publica: compone las seis fases de §4.7. Idempotente
/// por `mutation_id = H("process_allowed", scan_id)` -- un reintento
/// del mismo `scan_id` encuentra la fila ya comprometida y devuelve el
/// resultado cacheado sin repetir ningun efecto.
#[instrument(skip(state, region_code, resolved_scope), fields(scan_id = %scan_id, asset_id = %asset_id))]
pub async fn process_allowed(
    state: &AppState,
    scan_id: &str,
    viewer_id: &str,
    owner_id: &str,
    asset_id: &str,
    resolved_scope: &[Facet],
    policy_version: &str,
    region_code: &str,
    action: &str,
) -> Result<ProcessAllowedOutcome, SpineError> {
    let mut mutation_params = BTreeMap::new();
    mutation_params.insert("scan_id".to_string(), scan_id.to_string());
    let mutation_id = compute_mutation_id("process_allowed", &mutation_params);

    let conn = state.db.acquire_session().await?;
    match MutationLogRepository::begin(&conn, &mutation_id, "process_allowed", viewer_id).await? {
        BeginOutcome::Existing(row) => {
            if let Some(cached) = row.result {
                info!("🔁 [ORCHESTRATOR]: mutacion {} ya comprometida, devolviendo resultado cacheado", mutation_id);
                return serde_json::from_value(cached).map_err(|e| SpineError::Internal(e.to_string()));
            }
            return Err(SpineError::Conflict(format!("process_allowed for {scan_id} is still in progress")));
        }
        BeginOutcome::Fresh => {}
    }

    let outcome = run_phases(state, &conn, scan_id, viewer_id, owner_id, asset_id, resolved_scope, policy_version, region_code, action).await;

    match &outcome {
        Ok(result) => {
            let as_json = serde_json::to_value(result).map_err(|e| SpineError::Internal(e.to_string()))?;
            MutationLogRepository::complete(&conn, &mutation_id, &as_json).await?;
        }
        Err(_) => {
            MutationLogRepository::fail(&conn, &mutation_id).await?;
        }
    }

    outcome
}

#[allow(clippy::too_many_arguments)]
async fn run_phases(
    state: &AppState,
    conn: &libsql::Connection,
    scan_id: &str,
    viewer_id: &str,
    owner_id: &str,
    asset_id: &str,
    resolved_scope: &[Facet],
    policy_version: &str,
    region_code: &str,
    action: &str,
) -> Result<ProcessAllowedOutcome, SpineError> {
    // Fase 1: persistir el evento de scan -- entrada de auditoria
    // provisional + ancla pendiente, ambos en el mismo sujeto.
    let provisional_detail = json!({
        "phase": "scan_persisted",
        "viewer_id": viewer_id,
        "owner_id": owner_id,
        "asset_id": asset_id,
        "region_code": region_code,
        "policy_version": policy_version,
        "action": action,
    });
    AuditRepository::append(
        conn,
        &Uuid::new_v4().to_string(),
        scan_id,
        Some(viewer_id),
        action,
        "scan_persisted",
        &provisional_detail,
        false,
        false,
        None,
        None,
    )
    .await?;

    let anchor_id = Uuid::new_v4().to_string();
    let root_hash_placeholder = format!("pending:{scan_id}");
    ChainAnchorRepository::create_pending(conn, &anchor_id, scan_id, 0, &root_hash_placeholder).await?;

    // Fase 2: traer las facetas visibles segun el ambito resuelto. El
    // cuerpo de cada faceta nunca se escribe en la bitacora: solo el
    // conteo viaja al detalle de auditoria.
    let shown_facets = fetch_scoped_facets(state, owner_id, asset_id, resolved_scope).await?;

    // Fase 3: anclar en paralelo en ambos ledgers.
    let submission = AnchorSubmission { subject_id: scan_id, root_hash: &root_hash_placeholder };
    let anchor_outcome = anchor_both(&state.cardano_anchor, &state.midnight_anchor, &submission).await;

    if let Some(tx) = &anchor_outcome.cardano_tx_hash {
        ChainAnchorRepository::record_cardano_tx(conn, &anchor_id, tx).await?;
    }
    if let Some(tx) = &anchor_outcome.midnight_tx_hash {
        ChainAnchorRepository::record_midnight_tx(conn, &anchor_id, tx).await?;
    }
    if anchor_outcome.cardano_tx_hash.is_none() && anchor_outcome.midnight_tx_hash.is_none() {
        ChainAnchorRepository::mark_failed(conn, &anchor_id).await?;
    }

    let risk_flagged = anchor_outcome.is_partial() || !anchor_outcome.is_fully_anchored();
    if risk_flagged {
        warn!(scan_id, cardano_err = ?anchor_outcome.cardano_error, midnight_err = ?anchor_outcome.midnight_error, "⚠️ [ORCHESTRATOR]: anclaje parcial o fallido");
    }

    // Fase 4: raiz cruzada, solo si ambas cadenas confirmaron.
    let crosschain_root_hash = match (&anchor_outcome.cardano_tx_hash, &anchor_outcome.midnight_tx_hash) {
        (Some(c), Some(m)) => Some(spine_infra_ledger::cross_chain_root(c, m, scan_id)),
        _ => None,
    };

    // Fase 5: sellar la entrada de auditoria final describiendo las fases 1-4.
    let final_detail = json!({
        "phase": "anchor_resolved",
        "region_code": region_code,
        "policy_version": policy_version,
        "resolved_scope": resolved_scope.iter().map(Facet::as_str).collect::<Vec<_>>(),
        "shown_facets_count": shown_facets.len(),
        "cardano_tx_hash": anchor_outcome.cardano_tx_hash,
        "midnight_tx_hash": anchor_outcome.midnight_tx_hash,
        "crosschain_root_hash": crosschain_root_hash,
    });
    let final_entry = AuditRepository::append(
        conn,
        &Uuid::new_v4().to_string(),
        scan_id,
        Some(viewer_id),
        action,
        "anchor_resolved",
        &final_detail,
        risk_flagged,
        false,
        None,
        None,
    )
    .await?;

    // Fase 6: publicar al documento del wardrobe del propietario.
    let key = CubeDocumentKey::new(owner_id, asset_id);
    for facet in resolved_scope {
        state.state_cache.upsert_face(
            &key,
            *facet,
            FacePatch { visibility: Some("visible".to_string()), agentic_state: None, data_ops: vec![] },
        );
    }

    Ok(ProcessAllowedOutcome {
        scan_id: scan_id.to_string(),
        anchored: anchor_outcome.is_fully_anchored(),
        partial_anchor: anchor_outcome.is_partial(),
        cardano_tx_hash: anchor_outcome.cardano_tx_hash,
        midnight_tx_hash: anchor_outcome.midnight_tx_hash,
        crosschain_root_hash,
        shown_facets: resolved_scope.to_vec(),
        entry_hash: final_entry.entry_hash,
    })
}

/// Trae el contenido visible de cada faceta del ambito resuelto desde
/// el documento wardrobe en memoria; una faceta ausente del cache se
/// sirve vacia en lugar de fallar toda la fase.
async fn fetch_scoped_facets(
    state: &AppState,
    owner_id: &str,
    asset_id: &str,
    resolved_scope: &[Facet],
) -> Result<Vec<ScopedFacet>, SpineError> {
    let key = CubeDocumentKey::new(owner_id, asset_id);
    let doc = state.state_cache.get(&key);

    let facets = resolved_scope
        .iter()
        .map(|facet| {
            let data = doc
                .as_ref()
                .and_then(|d| d.faces.get(facet))
                .map(|face| face.data.clone())
                .unwrap_or_else(|| json!({}));
            ScopedFacet { facet: *facet, data }
        })
        .collect();

    Ok(facets)
}

/// Resultado de una transferencia de propiedad, compartido por el
/// facet service (`cube::transfer_ownership`) y el orquestador
/// (`orchestrator::execute_transfer_ownership`): ambos delegan aqui y
/// solo le dan forma distinta al JSON de respuesta.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status")]
pub enum TransferOutcome {
    #[serde(rename = "transfer_complete")]
    Completed { transfer_id: String, blockchain_tx_hash: Option<String>, new_owner: String, crosschain_root_hash: Option<String> },
    #[serde(rename = "transfer_pending_approval")]
    PendingApproval { escalation_id: String },
}

/// Unica puerta de escritura para una transferencia de propiedad.
/// Idempotente por `mutation_id = H("transfer_ownership", {cube_id,
/// from, to, method})`. El remitente debe ser el propietario actual
/// (§8: "Transfer attempted from a non-owner -> permission_denied");
/// mas alla de eso, la decision de politica (consentimiento + region +
/// verificador ESG del metodo de transferencia) puede todavia negar o
/// escalar.
#[instrument(skip(state), fields(cube_id = %cube_id))]
pub async fn transfer_ownership(
    state: &AppState,
    cube_id: &str,
    from: &str,
    to: &str,
    method: &str,
    price: Option<f64>,
) -> Result<TransferOutcome, SpineError> {
    let mut mutation_params = BTreeMap::new();
    mutation_params.insert("cube_id".to_string(), cube_id.to_string());
    mutation_params.insert("from".to_string(), from.to_string());
    mutation_params.insert("to".to_string(), to.to_string());
    mutation_params.insert("method".to_string(), method.to_string());
    let mutation_id = compute_mutation_id("transfer_ownership", &mutation_params);

    let conn = state.db.acquire_session().await?;
    match MutationLogRepository::begin(&conn, &mutation_id, "transfer_ownership", from).await? {
        BeginOutcome::Existing(row) => {
            if let Some(cached) = row.result {
                info!("🔁 [TRANSFER]: mutacion {} ya comprometida, devolviendo resultado cacheado", mutation_id);
                return serde_json::from_value(cached).map_err(|e| SpineError::Internal(e.to_string()));
            }
            return Err(SpineError::Conflict(format!("transfer_ownership for {cube_id} is still in progress")));
        }
        BeginOutcome::Fresh => {}
    }

    let outcome = run_transfer(state, &conn, cube_id, from, to, method, price).await;

    match &outcome {
        Ok(result) => {
            let as_json = serde_json::to_value(result).map_err(|e| SpineError::Internal(e.to_string()))?;
            MutationLogRepository::complete(&conn, &mutation_id, &as_json).await?;
        }
        Err(_) => {
            MutationLogRepository::fail(&conn, &mutation_id).await?;
        }
    }

    outcome
}

#[allow(clippy::too_many_arguments)]
async fn run_transfer(
    state: &AppState,
    conn: &libsql::Connection,
    cube_id: &str,
    from: &str,
    to: &str,
    method: &str,
    price: Option<f64>,
) -> Result<TransferOutcome, SpineError> {
    let asset = AssetRepository::get(conn, cube_id).await?;
    if asset.current_owner_id != from {
        return Err(SpineError::PermissionDenied(format!("{from} is not the current owner of {cube_id}")));
    }

    let now = chrono::Utc::now();
    let consent = policy::check(from, from, Some(cube_id), None, &[], None, now);
    let esg_result = state.esg_verifier.verify(cube_id, method, None).await;
    let verifier_outcome = verifiers::collapse(&esg_result);
    let outcome = policy::evaluate(&consent, &state.region_default, ActionKind::TransferOwnership, &[verifier_outcome]);

    match outcome.decision {
        spine_domain_models::ConsentDecision::Deny => {
            Err(SpineError::PermissionDenied(format!("transfer_denied:{}", outcome.reason)))
        }
        spine_domain_models::ConsentDecision::Escalate => {
            let detail = json!({
                "reason": outcome.reason,
                "region_code": state.region_default,
                "policy_version": outcome.policy_version,
                "method": method,
                "from": from,
                "to": to,
                "replay_kind": "transfer_ownership",
                "original_request": {
                    "cube_id": cube_id,
                    "from": from,
                    "to": to,
                    "method": method,
                    "price": price,
                },
            });
            let entry = AuditRepository::append(
                conn,
                &Uuid::new_v4().to_string(),
                cube_id,
                Some(from),
                "transfer_ownership",
                "transfer_escalated",
                &detail,
                true,
                true,
                None,
                None,
            )
            .await?;
            Ok(TransferOutcome::PendingApproval { escalation_id: entry.entry_id })
        }
        spine_domain_models::ConsentDecision::Allow => {
            let transfer_type = TransferType::parse(method).unwrap_or(TransferType::Trade);
            let provenance_id = Uuid::new_v4().to_string();
            let provenance_entry = ProvenanceRepository::append_transfer(
                conn,
                &provenance_id,
                cube_id,
                Some(from),
                to,
                transfer_type,
                price,
                None,
                None,
                None,
            )
            .await?;

            let scan_id = format!("transfer:{provenance_id}");
            let process_outcome = process_allowed(
                state,
                &scan_id,
                from,
                to,
                cube_id,
                &[Facet::OwnershipHistory],
                &outcome.policy_version,
                &state.region_default,
                "transfer_ownership",
            )
            .await?;

            Ok(TransferOutcome::Completed {
                transfer_id: provenance_entry.provenance_id,
                blockchain_tx_hash: process_outcome.cardano_tx_hash,
                new_owner: to.to_string(),
                crosschain_root_hash: process_outcome.crosschain_root_hash,
            })
        }
    }
}
