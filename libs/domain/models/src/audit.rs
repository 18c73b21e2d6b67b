// [libs/domain/models/src/audit.rs]
//! Entradas de la bitacora de auditoria encadenada por hash y sus anclas
//! de doble-ledger (Cardano + Midnight).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditEntry {
    pub entry_id: String,
    /// El sujeto encadenado: un scan_id o un asset_id. La cadena de
    /// hashes esta acotada a este sujeto, no al log entero.
    pub subject_id: String,
    pub sequence_num: i64,
    pub actor_user_id: Option<String>,
    pub action: String,
    pub summary: String,
    pub detail: serde_json::Value,
    /// Hash de la entrada anterior en la cadena; `None` solo en la entrada genesis.
    pub prev_hash: Option<String>,
    pub entry_hash: String,
    pub mutation_id: Option<String>,
    pub risk_flagged: bool,
    pub escalated_to_human: bool,
    pub approver_user_id: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AnchorStatus {
    Pending,
    Partial,
    Anchored,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChainAnchor {
    pub anchor_id: String,
    pub subject_id: String,
    /// Secuencia de la ultima entrada de auditoria cubierta por este anclaje.
    pub up_to_sequence_num: i64,
    pub root_hash: String,
    pub cardano_tx_hash: Option<String>,
    pub midnight_tx_hash: Option<String>,
    pub status: AnchorStatus,
    pub anchored_at: Option<DateTime<Utc>>,
}
