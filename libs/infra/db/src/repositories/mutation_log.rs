// [libs/infra/db/src/repositories/mutation_log.rs]
//! Registro de mutaciones para idempotencia. `mutation_id` se deriva
//! deterministicamente del nombre de la operacion y sus parametros
//! ordenados, de modo que un reintento del mismo llamador con los
//! mismos parametros produzca siempre el mismo id y encuentre la fila
//! ya comprometida en lugar de re-ejecutar el efecto.

use chrono::Utc;
use libsql::{params, Connection};
use sha2::{Digest, Sha256};
use spine_domain_models::{MutationLogRow, MutationOutcome};
use std::collections::BTreeMap;
use tracing::instrument;

use crate::errors::DbError;

/// `hex(SHA-256(op_name ‖ sorted_kv(params)))`, truncado a 32 caracteres.
pub fn compute_mutation_id(operation: &str, params: &BTreeMap<String, String>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(operation.as_bytes());
    for (key, value) in params {
        hasher.update(b"|");
        hasher.update(key.as_bytes());
        hasher.update(b"=");
        hasher.update(value.as_bytes());
    }
    let digest = hex::encode(hasher.finalize());
    digest[..32].to_string()
}

pub enum BeginOutcome {
    /// No existia registro previo: el llamador debe ejecutar la mutacion.
    Fresh,
    /// Ya existe un registro para este `mutation_id`; el llamador debe
    /// devolver el resultado cacheado (si `Committed`) o rechazar el
    /// reintento concurrente (si `InProgress`).
    Existing(MutationLogRow),
}

/// Horizonte de prescripcion para una fila `in_progress`: si `begin()`
/// encuentra una fila huerfana mas vieja que esto, asume que el proceso
/// que la abrio murio entre `begin()` y `complete()`/`fail()` (crash,
/// panic, conexion perdida con el ledger externo) y la reclama para
/// permitir un reintento fresco en vez de dejarla atascada para siempre.
fn stale_in_progress_horizon() -> chrono::Duration {
    chrono::Duration::minutes(5)
}

fn is_reclaimable(outcome: MutationOutcome, created_at: chrono::DateTime<Utc>, now: chrono::DateTime<Utc>) -> bool {
    outcome == MutationOutcome::InProgress && now.signed_duration_since(created_at) > stale_in_progress_horizon()
}

pub struct MutationLogRepository;

impl MutationLogRepository {
    #[instrument(skip(conn))]
    pub async fn begin(conn: &Connection, mutation_id: &str, operation: &str, requested_by: &str) -> Result<BeginOutcome, DbError> {
        if let Some(existing) = Self::get(conn, mutation_id).await? {
            if !is_reclaimable(existing.outcome, existing.created_at, Utc::now()) {
                return Ok(BeginOutcome::Existing(existing));
            }
            conn.execute(
                "DELETE FROM mutation_log WHERE mutation_id = ?1 AND outcome = 'in_progress'",
                params![mutation_id],
            )
            .await?;
        }

        let now = Utc::now();
        let inserted = conn
            .execute(
                "INSERT INTO mutation_log (mutation_id, operation, requested_by, outcome, created_at)
                 VALUES (?1, ?2, ?3, 'in_progress', ?4)
                 ON CONFLICT(mutation_id) DO NOTHING",
                params![mutation_id, operation, requested_by, now.to_rfc3339()],
            )
            .await?;

        if inserted == 0 {
            // Carrera perdida contra otro llamador concurrente: la fila ya existe ahora.
            let existing = Self::get(conn, mutation_id)
                .await?
                .ok_or_else(|| DbError::MutationIdConflict(mutation_id.to_string()))?;
            return Ok(BeginOutcome::Existing(existing));
        }

        Ok(BeginOutcome::Fresh)
    }

    #[instrument(skip(conn))]
    pub async fn get(conn: &Connection, mutation_id: &str) -> Result<Option<MutationLogRow>, DbError> {
        let mut rows = conn
            .query(
                "SELECT mutation_id, operation, requested_by, outcome, result_json, created_at, completed_at
                 FROM mutation_log WHERE mutation_id = ?1",
                params![mutation_id],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(map_row(&row)?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(conn, result))]
    pub async fn complete(conn: &Connection, mutation_id: &str, result: &serde_json::Value) -> Result<(), DbError> {
        let now = Utc::now().to_rfc3339();
        let result_json = serde_json::to_string(result).map_err(|e| DbError::MappingError(e.to_string()))?;
        conn.execute(
            "UPDATE mutation_log SET outcome = 'committed', result_json = ?1, completed_at = ?2 WHERE mutation_id = ?3",
            params![result_json, now, mutation_id],
        )
        .await?;
        Ok(())
    }

    #[instrument(skip(conn))]
    pub async fn fail(conn: &Connection, mutation_id: &str) -> Result<(), DbError> {
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "UPDATE mutation_log SET outcome = 'failed', completed_at = ?1 WHERE mutation_id = ?2",
            params![now, mutation_id],
        )
        .await?;
        Ok(())
    }

    /// Barrido periodico del sweeper de horizonte: borra en lotes las
    /// filas comprometidas o falladas mas viejas que `horizon`. Las
    /// filas `in_progress` nunca se tocan aqui, sin importar su edad.
    #[instrument(skip(conn))]
    pub async fn cleanup_older_than(conn: &Connection, horizon: chrono::Duration, batch_size: i64) -> Result<u64, DbError> {
        let cutoff = (Utc::now() - horizon).to_rfc3339();
        let deleted = conn
            .execute(
                "DELETE FROM mutation_log WHERE mutation_id IN (
                     SELECT mutation_id FROM mutation_log
                     WHERE outcome != 'in_progress' AND created_at < ?1
                     LIMIT ?2
                 )",
                params![cutoff, batch_size],
            )
            .await?;
        Ok(deleted)
    }
}

fn map_row(row: &libsql::Row) -> Result<MutationLogRow, DbError> {
    let outcome_raw = row.get::<String>(3).map_err(|e| DbError::MappingError(e.to_string()))?;
    let outcome = match outcome_raw.as_str() {
        "in_progress" => MutationOutcome::InProgress,
        "committed" => MutationOutcome::Committed,
        "failed" => MutationOutcome::Failed,
        other => return Err(DbError::MappingError(format!("unknown mutation outcome {other}"))),
    };

    let result_json: Option<String> = row.get(4).map_err(|e| DbError::MappingError(e.to_string()))?;
    let result = result_json
        .map(|raw| serde_json::from_str(&raw))
        .transpose()
        .map_err(|e| DbError::MappingError(e.to_string()))?;

    let completed_at: Option<String> = row.get(6).map_err(|e| DbError::MappingError(e.to_string()))?;
    let completed_at = completed_at.map(|raw| raw.parse()).transpose().map_err(|e: chrono::ParseError| DbError::MappingError(e.to_string()))?;

    Ok(MutationLogRow {
        mutation_id: row.get::<String>(0).map_err(|e| DbError::MappingError(e.to_string()))?,
        operation: row.get::<String>(1).map_err(|e| DbError::MappingError(e.to_string()))?,
        requested_by: row.get::<String>(2).map_err(|e| DbError::MappingError(e.to_string()))?,
        outcome,
        result,
        created_at: row
            .get::<String>(5)
            .map_err(|e| DbError::MappingError(e.to_string()))?
            .parse()
            .map_err(|e: chrono::ParseError| DbError::MappingError(e.to_string()))?,
        completed_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mutation_id_is_deterministic_and_order_independent() {
        let mut a = BTreeMap::new();
        a.insert("asset_id".to_string(), "a1".to_string());
        a.insert("to_user_id".to_string(), "u2".to_string());

        let mut b = BTreeMap::new();
        b.insert("to_user_id".to_string(), "u2".to_string());
        b.insert("asset_id".to_string(), "a1".to_string());

        assert_eq!(compute_mutation_id("transfer_ownership", &a), compute_mutation_id("transfer_ownership", &b));
    }

    #[test]
    fn mutation_id_changes_with_operation_name() {
        let params = BTreeMap::new();
        assert_ne!(compute_mutation_id("dissolve", &params), compute_mutation_id("reprint", &params));
    }

    #[test]
    fn recent_in_progress_row_is_not_reclaimable() {
        let created_at = Utc::now() - chrono::Duration::seconds(10);
        assert!(!is_reclaimable(MutationOutcome::InProgress, created_at, Utc::now()));
    }

    #[test]
    fn in_progress_row_past_horizon_is_reclaimable() {
        let created_at = Utc::now() - stale_in_progress_horizon() - chrono::Duration::seconds(1);
        assert!(is_reclaimable(MutationOutcome::InProgress, created_at, Utc::now()));
    }

    #[test]
    fn committed_row_is_never_reclaimable_regardless_of_age() {
        let created_at = Utc::now() - chrono::Duration::days(30);
        assert!(!is_reclaimable(MutationOutcome::Committed, created_at, Utc::now()));
    }
}
