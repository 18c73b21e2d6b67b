// [libs/infra/state-cache/src/document.rs]
//! Forma del documento wardrobe/cube: un documento por cubo, con un
//! mapa de caras que cada una lleva su propio `agentic_state` y un
//! bloque `biometric_sync` separado para la prioridad de render AR.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use spine_domain_models::Facet;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AgenticState {
    Idle,
    Processing,
    Modified,
    Syncing,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FaceEntry {
    pub visibility: String,
    pub data: serde_json::Value,
    pub pending_sync: bool,
    pub agentic_state: AgenticState,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct BiometricSync {
    pub active_facet: Option<Facet>,
    pub ar_priority: i64,
    pub render_hints: Vec<String>,
    pub gaze_duration_ms: i64,
    pub last_gaze_at: Option<DateTime<Utc>>,
}

/// Clave compuesta del documento: el wardrobe pertenece al dueño, el
/// cubo identifica el activo dentro de ese wardrobe.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CubeDocumentKey {
    pub owner_id: String,
    pub cube_id: String,
}

impl CubeDocumentKey {
    pub fn new(owner_id: impl Into<String>, cube_id: impl Into<String>) -> Self {
        Self { owner_id: owner_id.into(), cube_id: cube_id.into() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WardrobeCubeDocument {
    pub cube_id: String,
    pub owner_id: String,
    pub agentic_state: AgenticState,
    pub faces: BTreeMap<Facet, FaceEntry>,
    pub biometric_sync: BiometricSync,
}

impl WardrobeCubeDocument {
    pub fn new(owner_id: impl Into<String>, cube_id: impl Into<String>) -> Self {
        Self {
            cube_id: cube_id.into(),
            owner_id: owner_id.into(),
            agentic_state: AgenticState::Idle,
            faces: BTreeMap::new(),
            biometric_sync: BiometricSync::default(),
        }
    }
}
