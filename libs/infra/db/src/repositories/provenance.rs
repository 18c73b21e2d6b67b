// [libs/infra/db/src/repositories/provenance.rs]
//! Repositorio de la cadena de provenance. `append_transfer` y
//! `mint_asset` son las unicas puertas de escritura: ambas, dentro de
//! una misma transaccion, asignan la siguiente secuencia sin huecos y
//! mantienen `assets.current_owner_id`/`owns.is_current` sincronizados
//! con la cabeza de la cadena. `verify_chain` es una lectura pura que
//! reconstruye tres invariantes: contiguidad de secuencia, enlace
//! from/to, y consistencia con el propietario actual.

use chrono::Utc;
use libsql::{params, Connection};
use spine_domain_models::{Asset, ChainVerification, ProvenanceEntry, TransferType};
use tracing::instrument;

use crate::errors::DbError;
use crate::repositories::assets::AssetRepository;

/// Vista agregada de provenance de un activo: creador, propietario
/// actual y la cadena completa. Usada por el endpoint de conveniencia
/// `GET /cubes/{id}/provenance`.
#[derive(Debug, Clone, serde::Serialize)]
pub struct AssetProvenance {
    pub asset_id: String,
    pub creator_user_id: String,
    pub current_owner_id: String,
    pub transfer_count: usize,
    pub chain: Vec<ProvenanceEntry>,
}

pub struct ProvenanceRepository;

impl ProvenanceRepository {
    #[instrument(skip(conn))]
    pub async fn list_for_asset(conn: &Connection, asset_id: &str) -> Result<Vec<ProvenanceEntry>, DbError> {
        let mut rows = conn
            .query(
                "SELECT provenance_id, asset_id, sequence_num, from_user_id, to_user_id, transfer_type, price, currency,
                        blockchain_tx_hash, midnight_proof_hash, transfer_at
                 FROM provenance_chain WHERE asset_id = ?1 ORDER BY sequence_num ASC",
                params![asset_id],
            )
            .await?;

        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(map_row(&row)?);
        }
        Ok(out)
    }

    /// Creador original de un activo, leido directamente de `assets`
    /// en lugar de recorrer la cadena (la fila `Created` es un reflejo
    /// de `creator_user_id`, nunca diverge de ella).
    #[instrument(skip(conn))]
    pub async fn get_creator(conn: &Connection, asset_id: &str) -> Result<String, DbError> {
        Ok(AssetRepository::get(conn, asset_id).await?.creator_user_id)
    }

    /// Vista agregada de provenance: creador, propietario actual y la
    /// cadena completa de transferencias ordenada por secuencia.
    #[instrument(skip(conn))]
    pub async fn get_asset_provenance(conn: &Connection, asset_id: &str) -> Result<AssetProvenance, DbError> {
        let asset = AssetRepository::get(conn, asset_id).await?;
        let chain = Self::list_for_asset(conn, asset_id).await?;
        Ok(AssetProvenance {
            asset_id: asset.asset_id,
            creator_user_id: asset.creator_user_id,
            current_owner_id: asset.current_owner_id,
            transfer_count: chain.len(),
            chain,
        })
    }

    #[instrument(skip(conn))]
    async fn next_sequence(conn: &libsql::Transaction, asset_id: &str) -> Result<i64, DbError> {
        let mut rows = conn
            .query("SELECT COALESCE(MAX(sequence_num), 0) FROM provenance_chain WHERE asset_id = ?1", params![asset_id])
            .await
            .map_err(|e| DbError::TransactionError(e.to_string()))?;
        let row = rows.next().await.map_err(|e| DbError::TransactionError(e.to_string()))?;
        let current = row
            .map(|r| r.get::<i64>(0))
            .transpose()
            .map_err(|e| DbError::MappingError(e.to_string()))?
            .unwrap_or(0);
        Ok(current + 1)
    }

    /// Registra una transferencia de propiedad. `provenance_id` y
    /// `event_at` se generan aguas arriba para que la entrada de
    /// auditoria derivada pueda reutilizar el mismo instante.
    #[allow(clippy::too_many_arguments)]
    #[instrument(skip(conn))]
    pub async fn append_transfer(
        conn: &Connection,
        provenance_id: &str,
        asset_id: &str,
        from_user_id: Option<&str>,
        to_user_id: &str,
        transfer_type: TransferType,
        price: Option<f64>,
        currency: Option<&str>,
        blockchain_tx_hash: Option<&str>,
        midnight_proof_hash: Option<&str>,
    ) -> Result<ProvenanceEntry, DbError> {
        let tx = conn.transaction().await.map_err(|e| DbError::TransactionError(e.to_string()))?;

        if let Some(expected_sender) = from_user_id {
            let current = AssetRepository::get(conn, asset_id).await?;
            if current.current_owner_id != expected_sender {
                return Err(DbError::ProvenanceSequenceViolation(format!(
                    "sender {expected_sender} is not current owner of {asset_id}"
                )));
            }
        }

        let sequence_num = Self::next_sequence(&tx, asset_id).await?;
        let transfer_at = Utc::now();

        tx.execute(
            "INSERT INTO provenance_chain (provenance_id, asset_id, sequence_num, from_user_id, to_user_id, transfer_type,
                                            price, currency, blockchain_tx_hash, midnight_proof_hash, transfer_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                provenance_id,
                asset_id,
                sequence_num,
                from_user_id,
                to_user_id,
                transfer_type.as_str(),
                price,
                currency,
                blockchain_tx_hash,
                midnight_proof_hash,
                transfer_at.to_rfc3339(),
            ],
        )
        .await
        .map_err(|e| DbError::TransactionError(e.to_string()))?;

        AssetRepository::reassign_owner(&tx, asset_id, to_user_id).await?;

        if let Some(prev_owner) = from_user_id {
            tx.execute(
                "UPDATE owns SET is_current = 0 WHERE asset_id = ?1 AND user_id = ?2",
                params![asset_id, prev_owner],
            )
            .await
            .map_err(|e| DbError::TransactionError(e.to_string()))?;
        }

        tx.execute(
            "INSERT INTO owns (asset_id, user_id, is_current, since) VALUES (?1, ?2, 1, ?3)
             ON CONFLICT(asset_id, user_id) DO UPDATE SET is_current = 1, since = excluded.since",
            params![asset_id, to_user_id, transfer_at.to_rfc3339()],
        )
        .await
        .map_err(|e| DbError::TransactionError(e.to_string()))?;

        tx.commit().await.map_err(|e| DbError::TransactionError(e.to_string()))?;

        Ok(ProvenanceEntry {
            provenance_id: provenance_id.to_string(),
            asset_id: asset_id.to_string(),
            sequence_num,
            from_user_id: from_user_id.map(str::to_string),
            to_user_id: to_user_id.to_string(),
            transfer_type,
            price,
            currency: currency.map(str::to_string),
            blockchain_tx_hash: blockchain_tx_hash.map(str::to_string),
            midnight_proof_hash: midnight_proof_hash.map(str::to_string),
            transfer_at,
        })
    }

    /// Acuna un activo nuevo: inserta `assets`, la fila `owns` inicial
    /// y la primera entrada de `provenance_chain` (sequence_num=1,
    /// transfer_type=mint, from_user_id=null) dentro de una unica
    /// transaccion.
    #[instrument(skip(conn, asset))]
    pub async fn mint_asset(
        conn: &Connection,
        asset: &Asset,
        provenance_id: &str,
        blockchain_mint_tx: Option<&str>,
    ) -> Result<ProvenanceEntry, DbError> {
        let tx = conn.transaction().await.map_err(|e| DbError::TransactionError(e.to_string()))?;

        AssetRepository::insert_new(&tx, asset).await?;

        let transfer_at = Utc::now();
        tx.execute(
            "INSERT INTO provenance_chain (provenance_id, asset_id, sequence_num, from_user_id, to_user_id, transfer_type,
                                            price, currency, blockchain_tx_hash, midnight_proof_hash, transfer_at)
             VALUES (?1, ?2, 1, NULL, ?3, 'mint', NULL, NULL, ?4, NULL, ?5)",
            params![provenance_id, asset.asset_id.as_str(), asset.current_owner_id.as_str(), blockchain_mint_tx, transfer_at.to_rfc3339()],
        )
        .await
        .map_err(|e| DbError::TransactionError(e.to_string()))?;

        tx.commit().await.map_err(|e| DbError::TransactionError(e.to_string()))?;

        Ok(ProvenanceEntry {
            provenance_id: provenance_id.to_string(),
            asset_id: asset.asset_id.clone(),
            sequence_num: 1,
            from_user_id: None,
            to_user_id: asset.current_owner_id.clone(),
            transfer_type: TransferType::Mint,
            price: None,
            currency: None,
            blockchain_tx_hash: blockchain_mint_tx.map(str::to_string),
            midnight_proof_hash: None,
            transfer_at,
        })
    }

    /// Reconstruye los tres invariantes de la cadena de provenance sin
    /// mutar estado: contiguidad de secuencia, enlace from/to entre
    /// entradas consecutivas, y consistencia de la cabeza con
    /// `assets.current_owner_id`. Un activo sin entradas es invalido
    /// (toda mint produce al menos una).
    #[instrument(skip(conn))]
    pub async fn verify_chain(conn: &Connection, asset_id: &str) -> Result<ChainVerification, DbError> {
        let chain = Self::list_for_asset(conn, asset_id).await?;
        let mut issues = chain_issues(asset_id, &chain);

        match AssetRepository::get(conn, asset_id).await {
            Ok(asset) => {
                if let Some(last) = chain.last() {
                    if asset.current_owner_id != last.to_user_id {
                        issues.push(format!(
                            "assets.current_owner_id {} does not match last provenance entry to_user_id {}",
                            asset.current_owner_id, last.to_user_id
                        ));
                    }
                }
            }
            Err(DbError::AssetNotFound) => issues.push(format!("asset {asset_id} not found")),
            Err(e) => return Err(e),
        }

        Ok(ChainVerification { valid: issues.is_empty(), issues })
    }
}

/// Invariantes de la cadena que no requieren acceso a `assets`:
/// contiguidad de secuencia, forma del mint inicial, enlace from/to
/// entre entradas consecutivas. Separado de `verify_chain` para poder
/// probarlo sin una conexion.
fn chain_issues(asset_id: &str, chain: &[ProvenanceEntry]) -> Vec<String> {
    let mut issues = Vec::new();

    let Some(first) = chain.first() else {
        issues.push(format!("asset {asset_id} has no provenance_chain entries"));
        return issues;
    };

    if first.sequence_num != 1 {
        issues.push(format!("first entry has sequence_num {}, expected 1", first.sequence_num));
    }
    if first.transfer_type != TransferType::Mint {
        issues.push("first entry is not a mint".to_string());
    }
    if first.from_user_id.is_some() {
        issues.push("mint entry has a non-null from_user_id".to_string());
    }

    for (idx, entry) in chain.iter().enumerate() {
        let expected_seq = (idx + 1) as i64;
        if entry.sequence_num != expected_seq {
            issues.push(format!("gap in sequence: entry at position {idx} has sequence_num {}, expected {expected_seq}", entry.sequence_num));
        }
        if idx > 0 {
            let prev = &chain[idx - 1];
            if entry.from_user_id.as_deref() != Some(prev.to_user_id.as_str()) {
                issues.push(format!(
                    "transfer continuity broken at sequence_num {}: from_user_id {:?} does not match prior to_user_id {}",
                    entry.sequence_num, entry.from_user_id, prev.to_user_id
                ));
            }
        }
    }

    issues
}

fn map_row(row: &libsql::Row) -> Result<ProvenanceEntry, DbError> {
    let transfer_raw = row.get::<String>(5).map_err(|e| DbError::MappingError(e.to_string()))?;
    let transfer_type =
        TransferType::parse(&transfer_raw).ok_or_else(|| DbError::MappingError(format!("unknown transfer_type {transfer_raw}")))?;

    Ok(ProvenanceEntry {
        provenance_id: row.get::<String>(0).map_err(|e| DbError::MappingError(e.to_string()))?,
        asset_id: row.get::<String>(1).map_err(|e| DbError::MappingError(e.to_string()))?,
        sequence_num: row.get::<i64>(2).map_err(|e| DbError::MappingError(e.to_string()))?,
        from_user_id: row.get::<Option<String>>(3).map_err(|e| DbError::MappingError(e.to_string()))?,
        to_user_id: row.get::<String>(4).map_err(|e| DbError::MappingError(e.to_string()))?,
        transfer_type,
        price: row.get::<Option<f64>>(6).map_err(|e| DbError::MappingError(e.to_string()))?,
        currency: row.get::<Option<String>>(7).map_err(|e| DbError::MappingError(e.to_string()))?,
        blockchain_tx_hash: row.get::<Option<String>>(8).map_err(|e| DbError::MappingError(e.to_string()))?,
        midnight_proof_hash: row.get::<Option<String>>(9).map_err(|e| DbError::MappingError(e.to_string()))?,
        transfer_at: row
            .get::<String>(10)
            .map_err(|e| DbError::MappingError(e.to_string()))?
            .parse()
            .map_err(|e: chrono::ParseError| DbError::MappingError(e.to_string()))?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn entry(seq: i64, from: Option<&str>, to: &str, transfer_type: TransferType) -> ProvenanceEntry {
        ProvenanceEntry {
            provenance_id: format!("prov-{seq}"),
            asset_id: "asset-1".to_string(),
            sequence_num: seq,
            from_user_id: from.map(str::to_string),
            to_user_id: to.to_string(),
            transfer_type,
            price: None,
            currency: None,
            blockchain_tx_hash: None,
            midnight_proof_hash: None,
            transfer_at: Utc::now(),
        }
    }

    #[test]
    fn empty_chain_is_invalid() {
        let issues = chain_issues("asset-1", &[]);
        assert_eq!(issues.len(), 1);
    }

    #[test]
    fn mint_then_transfers_is_valid() {
        let chain = vec![
            entry(1, None, "alice", TransferType::Mint),
            entry(2, Some("alice"), "bob", TransferType::Purchase),
            entry(3, Some("bob"), "carol", TransferType::Gift),
        ];
        assert!(chain_issues("asset-1", &chain).is_empty());
    }

    #[test]
    fn sequence_gap_is_flagged() {
        let chain = vec![entry(1, None, "alice", TransferType::Mint), entry(3, Some("alice"), "bob", TransferType::Purchase)];
        let issues = chain_issues("asset-1", &chain);
        assert!(issues.iter().any(|i| i.contains("gap in sequence")));
    }

    #[test]
    fn broken_transfer_link_is_flagged() {
        let chain = vec![entry(1, None, "alice", TransferType::Mint), entry(2, Some("mallory"), "bob", TransferType::Purchase)];
        let issues = chain_issues("asset-1", &chain);
        assert!(issues.iter().any(|i| i.contains("transfer continuity broken")));
    }

    #[test]
    fn non_mint_first_entry_is_flagged() {
        let chain = vec![entry(1, None, "alice", TransferType::Purchase)];
        let issues = chain_issues("asset-1", &chain);
        assert!(issues.iter().any(|i| i.contains("not a mint")));
    }
}
