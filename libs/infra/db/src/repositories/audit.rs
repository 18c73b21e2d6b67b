// [libs/infra/db/src/repositories/audit.rs]
//! Bitacora de auditoria encadenada por hash, una cadena por sujeto
//! (`scan_id` o `asset_id`). Cada entrada sella su `entry_hash` sobre
//! el hash de la entrada anterior para ese mismo sujeto, de modo que
//! alterar o reordenar una entrada pasada invalida visiblemente todo
//! el tramo posterior de la cadena de ese sujeto -- las cadenas de
//! otros sujetos no se ven afectadas.

use chrono::Utc;
use libsql::{params, Connection};
use sha2::{Digest, Sha256};
use spine_domain_models::AuditEntry;
use tracing::instrument;

use crate::errors::DbError;

pub struct AuditRepository;

/// Proyeccion de lista blanca para `/audit/{subject}/explain`. Nada
/// fuera de estos campos puede salir de la frontera, aunque
/// `decision_detail` cargue mas informacion internamente.
#[derive(Debug, Clone, serde::Serialize)]
pub struct AuditExplainView {
    pub subject_id: String,
    pub occurred_at: chrono::DateTime<Utc>,
    pub region_code: Option<String>,
    pub policy_version: Option<String>,
    pub resolved_scope: Option<String>,
    pub shown_facets_count: Option<i64>,
    pub cardano_tx_hash: Option<String>,
    pub midnight_tx_hash: Option<String>,
    pub crosschain_root_hash: Option<String>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct EscalationRow {
    pub subject_id: String,
    pub region_code: Option<String>,
    pub reason: String,
    pub created_at: chrono::DateTime<Utc>,
}

impl AuditRepository {
    #[instrument(skip(conn))]
    pub async fn latest(conn: &Connection, subject_id: &str) -> Result<Option<(i64, String)>, DbError> {
        let mut rows = conn
            .query(
                "SELECT sequence_num, entry_hash FROM audit_entry WHERE subject_id = ?1 ORDER BY sequence_num DESC LIMIT 1",
                params![subject_id],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some((
                row.get::<i64>(0).map_err(|e| DbError::MappingError(e.to_string()))?,
                row.get::<String>(1).map_err(|e| DbError::MappingError(e.to_string()))?,
            ))),
            None => Ok(None),
        }
    }

    /// Sella y persiste una nueva entrada. `entry_hash` se calcula aqui,
    /// nunca lo fija el llamador, para que sea imposible construir una
    /// entrada con un hash que no refleje su propio contenido.
    #[allow(clippy::too_many_arguments)]
    #[instrument(skip(conn, detail))]
    pub async fn append(
        conn: &Connection,
        entry_id: &str,
        subject_id: &str,
        actor_user_id: Option<&str>,
        action: &str,
        summary: &str,
        detail: &serde_json::Value,
        risk_flagged: bool,
        escalated_to_human: bool,
        approver_user_id: Option<&str>,
        mutation_id: Option<&str>,
    ) -> Result<AuditEntry, DbError> {
        let (prev_sequence, prev_hash) = match Self::latest(conn, subject_id).await? {
            Some((seq, hash)) => (seq, Some(hash)),
            None => (0, None),
        };
        let sequence_num = prev_sequence + 1;
        let recorded_at = Utc::now();

        let detail_json = serde_json::to_string(detail).map_err(|e| DbError::MappingError(e.to_string()))?;
        let entry_hash = seal_entry_hash(prev_hash.as_deref(), summary, &detail_json, recorded_at);

        conn.execute(
            "INSERT INTO audit_entry (entry_id, subject_id, sequence_num, actor_user_id, action, summary, detail_json,
                                       prev_hash, entry_hash, mutation_id, risk_flagged, escalated_to_human,
                                       approver_user_id, recorded_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                entry_id,
                subject_id,
                sequence_num,
                actor_user_id,
                action,
                summary,
                detail_json.as_str(),
                prev_hash.as_deref(),
                entry_hash.as_str(),
                mutation_id,
                risk_flagged as i64,
                escalated_to_human as i64,
                approver_user_id,
                recorded_at.to_rfc3339(),
            ],
        )
        .await?;

        Ok(AuditEntry {
            entry_id: entry_id.to_string(),
            subject_id: subject_id.to_string(),
            sequence_num,
            actor_user_id: actor_user_id.map(str::to_string),
            action: action.to_string(),
            summary: summary.to_string(),
            detail: detail.clone(),
            prev_hash,
            entry_hash,
            mutation_id: mutation_id.map(str::to_string),
            risk_flagged,
            escalated_to_human,
            approver_user_id: approver_user_id.map(str::to_string),
            recorded_at,
        })
    }

    #[instrument(skip(conn))]
    pub async fn range(conn: &Connection, subject_id: &str, from_sequence: i64, to_sequence: i64) -> Result<Vec<AuditEntry>, DbError> {
        let mut rows = conn
            .query(
                "SELECT entry_id, subject_id, sequence_num, actor_user_id, action, summary, detail_json, prev_hash,
                        entry_hash, mutation_id, risk_flagged, escalated_to_human, approver_user_id, recorded_at
                 FROM audit_entry WHERE subject_id = ?1 AND sequence_num BETWEEN ?2 AND ?3 ORDER BY sequence_num ASC",
                params![subject_id, from_sequence, to_sequence],
            )
            .await?;

        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(map_row(&row)?);
        }
        Ok(out)
    }

    /// Recorre toda la cadena de un sujeto y reverifica que cada entrada
    /// encadene correctamente con la anterior, recalculando su
    /// `entry_hash` desde su propio contenido. Retorna la primera
    /// secuencia rota, si existe.
    #[instrument(skip(conn))]
    pub async fn verify(conn: &Connection, subject_id: &str) -> Result<(bool, Option<i64>), DbError> {
        let (latest_seq, _) = match Self::latest(conn, subject_id).await? {
            Some(pair) => pair,
            None => return Ok((true, None)),
        };
        let entries = Self::range(conn, subject_id, 1, latest_seq).await?;

        let mut expected_prev: Option<String> = None;
        for entry in &entries {
            if entry.prev_hash != expected_prev {
                return Ok((false, Some(entry.sequence_num)));
            }
            let detail_json = serde_json::to_string(&entry.detail).map_err(|e| DbError::MappingError(e.to_string()))?;
            let recomputed = seal_entry_hash(entry.prev_hash.as_deref(), &entry.summary, &detail_json, entry.recorded_at);
            if recomputed != entry.entry_hash {
                return Ok((false, Some(entry.sequence_num)));
            }
            expected_prev = Some(entry.entry_hash.clone());
        }
        Ok((true, None))
    }

    /// Proyeccion de lista blanca: solo los campos nombrados en
    /// `AuditExplainView` salen de esta funcion, sin importar cuanto
    /// cargue `decision_detail` internamente.
    #[instrument(skip(conn))]
    pub async fn explain(conn: &Connection, subject_id: &str) -> Result<Option<AuditExplainView>, DbError> {
        let (latest_seq, _) = match Self::latest(conn, subject_id).await? {
            Some(pair) => pair,
            None => return Ok(None),
        };
        let entries = Self::range(conn, subject_id, latest_seq, latest_seq).await?;
        let Some(entry) = entries.into_iter().next() else { return Ok(None) };

        let detail = &entry.detail;
        let field = |name: &str| detail.get(name).and_then(|v| v.as_str()).map(str::to_string);
        let field_i64 = |name: &str| detail.get(name).and_then(|v| v.as_i64());

        Ok(Some(AuditExplainView {
            subject_id: entry.subject_id,
            occurred_at: entry.recorded_at,
            region_code: field("region_code"),
            policy_version: field("policy_version"),
            resolved_scope: field("resolved_scope"),
            shown_facets_count: field_i64("shown_facets_count"),
            cardano_tx_hash: field("cardano_tx_hash"),
            midnight_tx_hash: field("midnight_tx_hash"),
            crosschain_root_hash: field("crosschain_root_hash"),
        }))
    }

    /// Lista entradas pendientes de revision humana: `escalated_to_human=true`
    /// y `approver_user_id IS NULL`, en orden de llegada.
    #[instrument(skip(conn))]
    pub async fn list_pending_escalations(conn: &Connection) -> Result<Vec<EscalationRow>, DbError> {
        let mut rows = conn
            .query(
                "SELECT subject_id, detail_json, summary, recorded_at FROM audit_entry
                 WHERE escalated_to_human = 1 AND approver_user_id IS NULL
                 ORDER BY recorded_at ASC",
                (),
            )
            .await?;

        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            let subject_id: String = row.get(0).map_err(|e| DbError::MappingError(e.to_string()))?;
            let detail_json: String = row.get(1).map_err(|e| DbError::MappingError(e.to_string()))?;
            let summary: String = row.get(2).map_err(|e| DbError::MappingError(e.to_string()))?;
            let recorded_at: String = row.get(3).map_err(|e| DbError::MappingError(e.to_string()))?;
            let detail: serde_json::Value = serde_json::from_str(&detail_json).unwrap_or(serde_json::Value::Null);
            out.push(EscalationRow {
                subject_id,
                region_code: detail.get("region_code").and_then(|v| v.as_str()).map(str::to_string),
                reason: detail.get("reason").and_then(|v| v.as_str()).map(str::to_string).unwrap_or(summary),
                created_at: recorded_at.parse().map_err(|e: chrono::ParseError| DbError::MappingError(e.to_string()))?,
            });
        }
        Ok(out)
    }

    /// Resuelve la entrada pendiente mas reciente de un sujeto: fija el
    /// aprobador, muta el resumen a `.../human_decision`, inyecta
    /// `governance_note`/`governance_approved` en el detalle y limpia
    /// `escalated_to_human`.
    #[instrument(skip(conn))]
    pub async fn resolve_escalation(
        conn: &Connection,
        subject_id: &str,
        approved: bool,
        reviewer_user_id: &str,
        note: &str,
    ) -> Result<Option<AuditEntry>, DbError> {
        let mut rows = conn
            .query(
                "SELECT entry_id, detail_json, summary FROM audit_entry
                 WHERE subject_id = ?1 AND escalated_to_human = 1 AND approver_user_id IS NULL
                 ORDER BY sequence_num DESC LIMIT 1",
                params![subject_id],
            )
            .await?;

        let Some(row) = rows.next().await? else { return Ok(None) };
        let entry_id: String = row.get(0).map_err(|e| DbError::MappingError(e.to_string()))?;
        let detail_json: String = row.get(1).map_err(|e| DbError::MappingError(e.to_string()))?;
        let summary: String = row.get(2).map_err(|e| DbError::MappingError(e.to_string()))?;

        let mut detail: serde_json::Value = serde_json::from_str(&detail_json).unwrap_or(serde_json::Value::Null);
        if let Some(obj) = detail.as_object_mut() {
            obj.insert("governance_note".to_string(), serde_json::json!(note));
            obj.insert("governance_approved".to_string(), serde_json::json!(approved));
        }
        let new_detail_json = serde_json::to_string(&detail).map_err(|e| DbError::MappingError(e.to_string()))?;
        let new_summary = format!("{summary}/human_decision");

        conn.execute(
            "UPDATE audit_entry SET approver_user_id = ?1, summary = ?2, detail_json = ?3, escalated_to_human = 0
             WHERE entry_id = ?4",
            params![reviewer_user_id, new_summary.as_str(), new_detail_json.as_str(), entry_id.as_str()],
        )
        .await?;

        Self::range(conn, subject_id, 1, i64::MAX)
            .await
            .map(|entries| entries.into_iter().find(|e| e.entry_id == entry_id))
    }
}

fn seal_entry_hash(prev_hash: Option<&str>, summary: &str, detail_json: &str, recorded_at: chrono::DateTime<chrono::Utc>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(prev_hash.unwrap_or("").as_bytes());
    hasher.update(b"|");
    hasher.update(summary.as_bytes());
    hasher.update(b"|");
    hasher.update(detail_json.as_bytes());
    hasher.update(b"|");
    hasher.update(recorded_at.to_rfc3339().as_bytes());
    hex::encode(hasher.finalize())
}

fn map_row(row: &libsql::Row) -> Result<AuditEntry, DbError> {
    let detail_json = row.get::<String>(6).map_err(|e| DbError::MappingError(e.to_string()))?;
    let detail = serde_json::from_str(&detail_json).map_err(|e| DbError::MappingError(e.to_string()))?;

    Ok(AuditEntry {
        entry_id: row.get::<String>(0).map_err(|e| DbError::MappingError(e.to_string()))?,
        subject_id: row.get::<String>(1).map_err(|e| DbError::MappingError(e.to_string()))?,
        sequence_num: row.get::<i64>(2).map_err(|e| DbError::MappingError(e.to_string()))?,
        actor_user_id: row.get::<Option<String>>(3).map_err(|e| DbError::MappingError(e.to_string()))?,
        action: row.get::<String>(4).map_err(|e| DbError::MappingError(e.to_string()))?,
        summary: row.get::<String>(5).map_err(|e| DbError::MappingError(e.to_string()))?,
        detail,
        prev_hash: row.get::<Option<String>>(7).map_err(|e| DbError::MappingError(e.to_string()))?,
        entry_hash: row.get::<String>(8).map_err(|e| DbError::MappingError(e.to_string()))?,
        mutation_id: row.get::<Option<String>>(9).map_err(|e| DbError::MappingError(e.to_string()))?,
        risk_flagged: row.get::<i64>(10).map_err(|e| DbError::MappingError(e.to_string()))? != 0,
        escalated_to_human: row.get::<i64>(11).map_err(|e| DbError::MappingError(e.to_string()))? != 0,
        approver_user_id: row.get::<Option<String>>(12).map_err(|e| DbError::MappingError(e.to_string()))?,
        recorded_at: row
            .get::<String>(13)
            .map_err(|e| DbError::MappingError(e.to_string()))?
            .parse()
            .map_err(|e: chrono::ParseError| DbError::MappingError(e.to_string()))?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn seal_entry_hash_changes_with_any_field() {
        let at = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let base = seal_entry_hash(None, "summary", "{}", at);
        assert_ne!(base, seal_entry_hash(Some("abc"), "summary", "{}", at));
        assert_ne!(base, seal_entry_hash(None, "other", "{}", at));
        assert_ne!(base, seal_entry_hash(None, "summary", r#"{"k":1}"#, at));
    }
}
