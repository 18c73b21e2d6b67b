// [libs/infra/db/src/repositories/chain_anchor.rs]
//! Anclas de doble-ledger (Cardano + Midnight), una por sujeto de
//! auditoria (`scan_id`/`asset_id`). Un ancla nace `pending`, pasa a
//! `partial` si solo una de las dos cadenas confirma dentro del
//! presupuesto de reintentos, y a `anchored` cuando ambas lo hacen.

use chrono::Utc;
use libsql::{params, Connection};
use spine_domain_models::{AnchorStatus, ChainAnchor};
use tracing::instrument;

use crate::errors::DbError;

pub struct ChainAnchorRepository;

impl ChainAnchorRepository {
    #[instrument(skip(conn))]
    pub async fn create_pending(
        conn: &Connection,
        anchor_id: &str,
        subject_id: &str,
        up_to_sequence_num: i64,
        root_hash: &str,
    ) -> Result<ChainAnchor, DbError> {
        conn.execute(
            "INSERT INTO chain_anchor (anchor_id, subject_id, up_to_sequence_num, root_hash, status) VALUES (?1, ?2, ?3, ?4, 'pending')",
            params![anchor_id, subject_id, up_to_sequence_num, root_hash],
        )
        .await?;

        Ok(ChainAnchor {
            anchor_id: anchor_id.to_string(),
            subject_id: subject_id.to_string(),
            up_to_sequence_num,
            root_hash: root_hash.to_string(),
            cardano_tx_hash: None,
            midnight_tx_hash: None,
            status: AnchorStatus::Pending,
            anchored_at: None,
        })
    }

    #[instrument(skip(conn))]
    pub async fn record_cardano_tx(conn: &Connection, anchor_id: &str, tx_hash: &str) -> Result<(), DbError> {
        conn.execute("UPDATE chain_anchor SET cardano_tx_hash = ?1 WHERE anchor_id = ?2", params![tx_hash, anchor_id]).await?;
        Self::recompute_status(conn, anchor_id).await
    }

    #[instrument(skip(conn))]
    pub async fn record_midnight_tx(conn: &Connection, anchor_id: &str, tx_hash: &str) -> Result<(), DbError> {
        conn.execute("UPDATE chain_anchor SET midnight_tx_hash = ?1 WHERE anchor_id = ?2", params![tx_hash, anchor_id]).await?;
        Self::recompute_status(conn, anchor_id).await
    }

    #[instrument(skip(conn))]
    pub async fn mark_failed(conn: &Connection, anchor_id: &str) -> Result<(), DbError> {
        conn.execute("UPDATE chain_anchor SET status = 'failed' WHERE anchor_id = ?1", params![anchor_id]).await?;
        Ok(())
    }

    async fn recompute_status(conn: &Connection, anchor_id: &str) -> Result<(), DbError> {
        let mut rows = conn
            .query("SELECT cardano_tx_hash, midnight_tx_hash FROM chain_anchor WHERE anchor_id = ?1", params![anchor_id])
            .await?;
        let row = rows.next().await?.ok_or_else(|| DbError::MappingError(format!("anchor {anchor_id} not found")))?;
        let cardano: Option<String> = row.get(0).map_err(|e| DbError::MappingError(e.to_string()))?;
        let midnight: Option<String> = row.get(1).map_err(|e| DbError::MappingError(e.to_string()))?;

        let (status, anchored_at) = match (cardano.is_some(), midnight.is_some()) {
            (true, true) => ("anchored", Some(Utc::now().to_rfc3339())),
            (true, false) | (false, true) => ("partial", None),
            (false, false) => ("pending", None),
        };

        conn.execute(
            "UPDATE chain_anchor SET status = ?1, anchored_at = COALESCE(?2, anchored_at) WHERE anchor_id = ?3",
            params![status, anchored_at, anchor_id],
        )
        .await?;
        Ok(())
    }

    /// Ultimo ancla de un sujeto dado, la unica vista que le interesa al
    /// llamador: un sujeto puede, en teoria, acumular mas de una fila si
    /// se re-ancla, pero solo la mas reciente es relevante.
    #[instrument(skip(conn))]
    pub async fn latest_for_subject(conn: &Connection, subject_id: &str) -> Result<Option<ChainAnchor>, DbError> {
        let mut rows = conn
            .query(
                "SELECT anchor_id, subject_id, up_to_sequence_num, root_hash, cardano_tx_hash, midnight_tx_hash, status, anchored_at
                 FROM chain_anchor WHERE subject_id = ?1 ORDER BY up_to_sequence_num DESC LIMIT 1",
                params![subject_id],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(map_row(&row)?)),
            None => Ok(None),
        }
    }
}

fn map_row(row: &libsql::Row) -> Result<ChainAnchor, DbError> {
    let status_raw = row.get::<String>(6).map_err(|e| DbError::MappingError(e.to_string()))?;
    let status = match status_raw.as_str() {
        "pending" => AnchorStatus::Pending,
        "partial" => AnchorStatus::Partial,
        "anchored" => AnchorStatus::Anchored,
        "failed" => AnchorStatus::Failed,
        other => return Err(DbError::MappingError(format!("unknown anchor status {other}"))),
    };

    let anchored_at: Option<String> = row.get(7).map_err(|e| DbError::MappingError(e.to_string()))?;
    let anchored_at = anchored_at.map(|raw| raw.parse()).transpose().map_err(|e: chrono::ParseError| DbError::MappingError(e.to_string()))?;

    Ok(ChainAnchor {
        anchor_id: row.get::<String>(0).map_err(|e| DbError::MappingError(e.to_string()))?,
        subject_id: row.get::<String>(1).map_err(|e| DbError::MappingError(e.to_string()))?,
        up_to_sequence_num: row.get::<i64>(2).map_err(|e| DbError::MappingError(e.to_string()))?,
        root_hash: row.get::<String>(3).map_err(|e| DbError::MappingError(e.to_string()))?,
        cardano_tx_hash: row.get::<Option<String>>(4).map_err(|e| DbError::MappingError(e.to_string()))?,
        midnight_tx_hash: row.get::<Option<String>>(5).map_err(|e| DbError::MappingError(e.to_string()))?,
        status,
        anchored_at,
    })
}
