// [libs/domain/models/src/mutation.rs]
//! Registro de mutaciones para idempotencia: toda escritura que atraviesa
//! el orquestador se indexa por un `mutation_id` deterministico derivado
//! de sus parametros ordenados, de modo que reintentos del mismo
//! llamador no dupliquen efectos.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MutationOutcome {
    InProgress,
    Committed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MutationLogRow {
    pub mutation_id: String,
    pub operation: String,
    pub requested_by: String,
    pub outcome: MutationOutcome,
    /// Resultado cacheado devuelto a reintentos una vez `outcome == Committed`.
    pub result: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}
