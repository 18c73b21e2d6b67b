// [libs/domain/models/src/asset.rs]
/*!
 * Entidad Activo (Cube / Digital Product Passport).
 *
 * Invariante: `current_owner_id` debe coincidir siempre con el
 * `to_user_id` de la entrada de ProvenanceChain de mayor secuencia.
 * Ese invariante se aplica transaccionalmente en el repositorio de
 * provenance (spine-infra-db), no aqui: este modulo solo describe forma.
 */

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum LifecycleState {
    Produced,
    Active,
    Repair,
    Dissolve,
    Reprint,
}

impl LifecycleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleState::Produced => "PRODUCED",
            LifecycleState::Active => "ACTIVE",
            LifecycleState::Repair => "REPAIR",
            LifecycleState::Dissolve => "DISSOLVE",
            LifecycleState::Reprint => "REPRINT",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "PRODUCED" => Some(LifecycleState::Produced),
            "ACTIVE" => Some(LifecycleState::Active),
            "REPAIR" => Some(LifecycleState::Repair),
            "DISSOLVE" => Some(LifecycleState::Dissolve),
            "REPRINT" => Some(LifecycleState::Reprint),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Asset {
    pub asset_id: String,
    pub asset_type: String,
    pub display_name: String,
    pub creator_user_id: String,
    pub current_owner_id: String,
    pub authenticity_hash: String,
    pub lifecycle_state: LifecycleState,
    pub reprint_generation: u32,
    pub parent_asset_id: Option<String>,
    pub dissolve_auth_key_hash: Option<String>,
    pub ar_sync_latency_ms: Option<u32>,
    pub last_biometric_sync: Option<chrono::DateTime<chrono::Utc>>,
    /// Opcional: material de prueba-de-propiedad de conocimiento-cero,
    /// anclado junto con la mint o el ultimo transfer.
    pub proof_of_ownership: Option<ProofOfOwnership>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProofOfOwnership {
    pub commitment: String,
    pub nullifier: String,
    pub proof_blob_base64: String,
}
