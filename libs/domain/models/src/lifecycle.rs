// [libs/domain/models/src/lifecycle.rs]
//! Transiciones de la maquina de estados del ciclo de vida del activo.
//! Las reglas de que transiciones son legales viven en spine-domain-lifecycle;
//! este modulo solo define la forma de la solicitud y el evento persistido.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::asset::LifecycleState;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    User,
    Agent,
    System,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransitionRequest {
    pub asset_id: String,
    pub requested_by: String,
    pub trigger_type: TriggerType,
    pub target_state: LifecycleState,
    /// Obligatorio para transicionar a DISSOLVE: el llamador debe probar
    /// posesion de la clave de autorizacion de disolucion.
    pub dissolve_auth_key: Option<String>,
    pub burn_proof_hash: Option<String>,
    pub parent_material_batch: Option<String>,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LifecycleEvent {
    pub event_id: String,
    pub asset_id: String,
    pub from_state: Option<LifecycleState>,
    pub to_state: LifecycleState,
    pub triggered_by: String,
    pub trigger_type: TriggerType,
    pub dissolve_auth_verified: bool,
    pub burn_proof_hash: Option<String>,
    pub parent_material_batch: Option<String>,
    pub esg_delta: f64,
    pub carbon_saved_kg: f64,
    pub water_saved_liters: f64,
    pub occurred_at: DateTime<Utc>,
}

/// Resultado devuelto al llamador tras una transicion exitosa. El
/// evento ya contiene los deltas de ESG; este wrapper existe para dejar
/// espacio a metadatos especificos de la respuesta HTTP sin ensuciar el
/// evento persistido.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransitionResult {
    pub event: LifecycleEvent,
}
