// [apps/integrity-spine/src/handlers/cube.rs]
/*!
 * =================================================================
 * APARATO: CUBE FACET SERVICE (V1.0 - SPINE GENESIS)
 * CLASIFICACION: API ADAPTER LAYER (ESTRATO L3)
 * RESPONSABILIDAD: LECTURA DEL CUBO COMPUESTO Y TRANSFERENCIA DE
 *                   PROPIEDAD SOBRE UN SOLO ACTIVO
 *
 * Este servicio no tiene esquema de autenticacion propio (ver
 * middleware.rs); la identidad de quien mira viaja como
 * `?viewer_id=` en las dos rutas de lectura, sin cuerpo de peticion.
 * =================================================================
 */

use std::collections::BTreeMap;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use spine_domain_models::{ConsentDecision, Facet};
use spine_domain_policy::{evaluate, ActionKind};
use spine_infra_db::repositories::{AssetRepository, AuditRepository};
use spine_infra_state_cache::CubeDocumentKey;
use uuid::Uuid;

use crate::errors::SpineError;
use crate::services::{consent::resolve_consent, orchestrator::transfer_ownership};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ViewerQuery {
    pub viewer_id: String,
}

#[derive(Debug, Serialize)]
pub struct CubeResponse {
    pub cube_id: String,
    pub owner_id: String,
    pub faces: BTreeMap<String, Value>,
}

/// Compone las siete facetas del cubo para un `viewer_id` dado. Una
/// faceta denegada se omite por completo del mapa de respuesta; no hay
/// manera de distinguir "denegado" de "faceta inexistente" desde
/// afuera, por diseño (§7: "denied access returns a generic code and
/// no diagnostic").
pub async fn get_cube(
    State(state): State<AppState>,
    Path(cube_id): Path<String>,
    Query(query): Query<ViewerQuery>,
) -> Result<Json<CubeResponse>, SpineError> {
    // Sesion de escritura, no de lectura: cada faceta resuelta sella
    // una entrada de auditoria (allow/deny/escalate), asi que el
    // cupo de respaldo de `acquire_read_session` no sirve aqui.
    let conn = state.db.acquire_session().await?;
    let asset = AssetRepository::get(&conn, &cube_id).await?;
    let owner_id = asset.current_owner_id.clone();
    let key = CubeDocumentKey::new(owner_id.clone(), cube_id.clone());
    let document = state.state_cache.get(&key);

    let mut faces = BTreeMap::new();
    for facet in Facet::ALL {
        let consent = resolve_consent(&conn, &query.viewer_id, &owner_id, &cube_id, facet.as_str()).await?;
        let outcome = evaluate(&consent, &state.region_default, ActionKind::ViewFacet, &[]);

        let detail = json!({
            "viewer_id": query.viewer_id,
            "owner_id": owner_id,
            "facet": facet.as_str(),
            "visibility": consent.visibility.as_str(),
            "policy_version": outcome.policy_version,
            "reason": outcome.reason,
        });

        let face_json = match outcome.decision {
            ConsentDecision::Deny => {
                AuditRepository::append(
                    &conn,
                    &Uuid::new_v4().to_string(),
                    &cube_id,
                    Some(&query.viewer_id),
                    "view_face",
                    "view_face/deny",
                    &detail,
                    false,
                    false,
                    None,
                    None,
                )
                .await?;
                continue;
            }
            ConsentDecision::Escalate => {
                let entry = AuditRepository::append(
                    &conn,
                    &Uuid::new_v4().to_string(),
                    &cube_id,
                    Some(&query.viewer_id),
                    "view_face",
                    "view_face/escalate",
                    &detail,
                    true,
                    true,
                    None,
                    None,
                )
                .await?;
                json!({
                    "status": "escalated_pending_human",
                    "visibility": consent.visibility.as_str(),
                    "escalation_id": entry.entry_id,
                    "message": outcome.reason,
                })
            }
            ConsentDecision::Allow => {
                AuditRepository::append(
                    &conn,
                    &Uuid::new_v4().to_string(),
                    &cube_id,
                    Some(&query.viewer_id),
                    "view_face",
                    "view_face/allow",
                    &detail,
                    false,
                    false,
                    None,
                    None,
                )
                .await?;
                let data = document
                    .as_ref()
                    .and_then(|d| d.faces.get(&facet))
                    .map(|f| f.data.clone())
                    .unwrap_or_else(|| json!({}));
                json!({
                    "status": "visible",
                    "visibility": consent.visibility.as_str(),
                    "data": data,
                })
            }
        };

        faces.insert(facet.as_str().to_string(), face_json);
    }

    Ok(Json(CubeResponse { cube_id, owner_id, faces }))
}

#[derive(Debug, Serialize)]
#[serde(tag = "status")]
pub enum FaceResponse {
    #[serde(rename = "visible")]
    Visible { visibility: String, data: Value },
    #[serde(rename = "escalated_pending_human")]
    Escalated { visibility: String, escalation_id: String, message: String },
}

/// Una sola faceta. A diferencia de `get_cube`, un resultado denegado
/// aqui no puede omitirse (la peticion nombra la faceta explicitamente)
/// asi que se traduce al 403 generico de la taxonomia de errores.
pub async fn get_face(
    State(state): State<AppState>,
    Path((cube_id, facet_name)): Path<(String, String)>,
    Query(query): Query<ViewerQuery>,
) -> Result<Json<FaceResponse>, SpineError> {
    let facet = Facet::parse(&facet_name).ok_or_else(|| SpineError::Validation(format!("unknown facet {facet_name}")))?;

    let conn = state.db.acquire_session().await?;
    let asset = AssetRepository::get(&conn, &cube_id).await?;
    let owner_id = asset.current_owner_id;

    let consent = resolve_consent(&conn, &query.viewer_id, &owner_id, &cube_id, facet.as_str()).await?;
    let outcome = evaluate(&consent, &state.region_default, ActionKind::ViewFacet, &[]);

    let detail = json!({
        "viewer_id": query.viewer_id,
        "owner_id": owner_id,
        "facet": facet.as_str(),
        "visibility": consent.visibility.as_str(),
        "policy_version": outcome.policy_version,
        "reason": outcome.reason,
    });

    match outcome.decision {
        ConsentDecision::Deny => {
            AuditRepository::append(
                &conn,
                &Uuid::new_v4().to_string(),
                &cube_id,
                Some(&query.viewer_id),
                "view_face",
                "view_face/deny",
                &detail,
                false,
                false,
                None,
                None,
            )
            .await?;
            Err(SpineError::PermissionDenied("access_denied".to_string()))
        }
        ConsentDecision::Escalate => {
            let entry = AuditRepository::append(
                &conn,
                &Uuid::new_v4().to_string(),
                &cube_id,
                Some(&query.viewer_id),
                "view_face",
                "view_face/escalate",
                &detail,
                true,
                true,
                None,
                None,
            )
            .await?;
            Ok(Json(FaceResponse::Escalated {
                visibility: consent.visibility.as_str().to_string(),
                escalation_id: entry.entry_id,
                message: outcome.reason,
            }))
        }
        ConsentDecision::Allow => {
            AuditRepository::append(
                &conn,
                &Uuid::new_v4().to_string(),
                &cube_id,
                Some(&query.viewer_id),
                "view_face",
                "view_face/allow",
                &detail,
                false,
                false,
                None,
                None,
            )
            .await?;
            let key = CubeDocumentKey::new(owner_id, cube_id);
            let data = state
                .state_cache
                .get(&key)
                .and_then(|d| d.faces.get(&facet).map(|f| f.data.clone()))
                .unwrap_or_else(|| json!({}));
            Ok(Json(FaceResponse::Visible { visibility: consent.visibility.as_str().to_string(), data }))
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TransferOwnershipBody {
    pub from: String,
    pub to: String,
    pub method: String,
    pub price: Option<f64>,
}

pub async fn transfer_ownership_endpoint(
    State(state): State<AppState>,
    Path(cube_id): Path<String>,
    Json(body): Json<TransferOwnershipBody>,
) -> Result<Json<Value>, SpineError> {
    let outcome = transfer_ownership(&state, &cube_id, &body.from, &body.to, &body.method, body.price).await?;
    serde_json::to_value(&outcome).map(Json).map_err(|e| SpineError::Internal(e.to_string()))
}

pub use transfer_ownership_endpoint as transfer_ownership;
