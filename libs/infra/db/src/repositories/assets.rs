// [libs/infra/db/src/repositories/assets.rs]
//! Repositorio de activos (Digital Product Passports). La escritura de
//! `current_owner_id` y `lifecycle_state` fuera de las transacciones de
//! provenance/ciclo-de-vida esta deliberadamente ausente: ese invariante
//! solo se mantiene desde `ProvenanceRepository` y `LifecycleRepository`.

use libsql::{params, Connection};
use spine_domain_models::{Asset, LifecycleState, ProofOfOwnership};
use tracing::instrument;

use crate::errors::DbError;

pub struct AssetRepository;

impl AssetRepository {
    #[instrument(skip(conn))]
    pub async fn get(conn: &Connection, asset_id: &str) -> Result<Asset, DbError> {
        let mut rows = conn
            .query(
                "SELECT asset_id, asset_type, display_name, creator_user_id, current_owner_id, authenticity_hash,
                        lifecycle_state, reprint_generation, parent_asset_id, dissolve_auth_key_hash,
                        ar_sync_latency_ms, last_biometric_sync, proof_of_ownership_json
                 FROM assets WHERE asset_id = ?1",
                params![asset_id],
            )
            .await?;

        let row = rows.next().await?.ok_or(DbError::AssetNotFound)?;
        map_row(&row)
    }

    #[instrument(skip(conn))]
    pub async fn list_owned(conn: &Connection, user_id: &str) -> Result<Vec<Asset>, DbError> {
        let mut rows = conn
            .query(
                "SELECT a.asset_id, a.asset_type, a.display_name, a.creator_user_id, a.current_owner_id, a.authenticity_hash,
                        a.lifecycle_state, a.reprint_generation, a.parent_asset_id, a.dissolve_auth_key_hash,
                        a.ar_sync_latency_ms, a.last_biometric_sync, a.proof_of_ownership_json
                 FROM assets a
                 JOIN owns o ON o.asset_id = a.asset_id
                 WHERE o.user_id = ?1 AND o.is_current = 1",
                params![user_id],
            )
            .await?;

        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(map_row(&row)?);
        }
        Ok(out)
    }

    #[instrument(skip(conn, asset))]
    pub async fn create(conn: &Connection, asset: &Asset) -> Result<(), DbError> {
        let tx = conn.transaction().await.map_err(|e| DbError::TransactionError(e.to_string()))?;
        Self::insert_new(&tx, asset).await?;
        tx.commit().await.map_err(|e| DbError::TransactionError(e.to_string()))?;
        Ok(())
    }

    /// Inserta la fila `assets` y la fila `owns` inicial dentro de una
    /// transaccion ya abierta por el llamador. Usada por `create` (que
    /// abre su propia transaccion de alcance unico) y por
    /// `ProvenanceRepository::mint_asset` (que la comparte con la
    /// primera entrada de `provenance_chain`).
    pub(crate) async fn insert_new(tx: &libsql::Transaction, asset: &Asset) -> Result<(), DbError> {
        let proof_json = asset
            .proof_of_ownership
            .as_ref()
            .map(|p| serde_json::to_string(p))
            .transpose()
            .map_err(|e| DbError::MappingError(e.to_string()))?;

        tx.execute(
            "INSERT INTO assets (asset_id, asset_type, display_name, creator_user_id, current_owner_id, authenticity_hash,
                                  lifecycle_state, reprint_generation, parent_asset_id, dissolve_auth_key_hash,
                                  ar_sync_latency_ms, last_biometric_sync, proof_of_ownership_json)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                asset.asset_id.as_str(),
                asset.asset_type.as_str(),
                asset.display_name.as_str(),
                asset.creator_user_id.as_str(),
                asset.current_owner_id.as_str(),
                asset.authenticity_hash.as_str(),
                asset.lifecycle_state.as_str(),
                asset.reprint_generation as i64,
                asset.parent_asset_id.as_deref(),
                asset.dissolve_auth_key_hash.as_deref(),
                asset.ar_sync_latency_ms.map(|v| v as i64),
                asset.last_biometric_sync.map(|t| t.to_rfc3339()),
                proof_json,
            ],
        )
        .await
        .map_err(|e| DbError::TransactionError(e.to_string()))?;

        tx.execute(
            "INSERT INTO owns (asset_id, user_id, is_current) VALUES (?1, ?2, 1)",
            params![asset.asset_id.as_str(), asset.current_owner_id.as_str()],
        )
        .await
        .map_err(|e| DbError::TransactionError(e.to_string()))?;

        Ok(())
    }

    /// Aplica atomicamente una nueva fase de ciclo de vida a la fila de
    /// activo. Usada exclusivamente por `LifecycleRepository` dentro de
    /// la misma transaccion que inserta el `LifecycleEvent`.
    pub(crate) async fn apply_lifecycle_transition(
        tx: &libsql::Transaction,
        asset_id: &str,
        to_state: LifecycleState,
        reprint_generation_delta: u32,
    ) -> Result<(), DbError> {
        let affected = tx
            .execute(
                "UPDATE assets SET lifecycle_state = ?1, reprint_generation = reprint_generation + ?2 WHERE asset_id = ?3",
                params![to_state.as_str(), reprint_generation_delta as i64, asset_id],
            )
            .await
            .map_err(|e| DbError::TransactionError(e.to_string()))?;
        if affected == 0 {
            return Err(DbError::AssetNotFound);
        }
        Ok(())
    }

    /// Fija el hash de la llave de autorizacion de disolucion. La llave
    /// en claro se devuelve al propietario una unica vez, en la
    /// respuesta de `authorize_dissolve`; solo su hash persiste aqui.
    #[instrument(skip(conn, dissolve_auth_key_hash))]
    pub async fn set_dissolve_auth_key_hash(conn: &Connection, asset_id: &str, dissolve_auth_key_hash: &str) -> Result<(), DbError> {
        let affected = conn
            .execute(
                "UPDATE assets SET dissolve_auth_key_hash = ?1 WHERE asset_id = ?2",
                params![dissolve_auth_key_hash, asset_id],
            )
            .await?;
        if affected == 0 {
            return Err(DbError::AssetNotFound);
        }
        Ok(())
    }

    /// Reasigna el propietario actual. Usada exclusivamente por
    /// `ProvenanceRepository::append_transfer` dentro de su transaccion.
    pub(crate) async fn reassign_owner(tx: &libsql::Transaction, asset_id: &str, new_owner_id: &str) -> Result<(), DbError> {
        let affected = tx
            .execute("UPDATE assets SET current_owner_id = ?1 WHERE asset_id = ?2", params![new_owner_id, asset_id])
            .await
            .map_err(|e| DbError::TransactionError(e.to_string()))?;
        if affected == 0 {
            return Err(DbError::AssetNotFound);
        }
        Ok(())
    }
}

fn map_row(row: &libsql::Row) -> Result<Asset, DbError> {
    let lifecycle_raw = row.get::<String>(6).map_err(|e| DbError::MappingError(e.to_string()))?;
    let lifecycle_state = LifecycleState::parse(&lifecycle_raw)
        .ok_or_else(|| DbError::MappingError(format!("unknown lifecycle_state {lifecycle_raw}")))?;

    let proof_json: Option<String> = row.get(12).map_err(|e| DbError::MappingError(e.to_string()))?;
    let proof_of_ownership = proof_json
        .map(|raw| serde_json::from_str::<ProofOfOwnership>(&raw))
        .transpose()
        .map_err(|e| DbError::MappingError(e.to_string()))?;

    let last_biometric_sync: Option<String> = row.get(11).map_err(|e| DbError::MappingError(e.to_string()))?;
    let last_biometric_sync = last_biometric_sync
        .map(|raw| raw.parse::<chrono::DateTime<chrono::Utc>>())
        .transpose()
        .map_err(|e| DbError::MappingError(e.to_string()))?;

    Ok(Asset {
        asset_id: row.get::<String>(0).map_err(|e| DbError::MappingError(e.to_string()))?,
        asset_type: row.get::<String>(1).map_err(|e| DbError::MappingError(e.to_string()))?,
        display_name: row.get::<String>(2).map_err(|e| DbError::MappingError(e.to_string()))?,
        creator_user_id: row.get::<String>(3).map_err(|e| DbError::MappingError(e.to_string()))?,
        current_owner_id: row.get::<String>(4).map_err(|e| DbError::MappingError(e.to_string()))?,
        authenticity_hash: row.get::<String>(5).map_err(|e| DbError::MappingError(e.to_string()))?,
        lifecycle_state,
        reprint_generation: row.get::<i64>(7).map_err(|e| DbError::MappingError(e.to_string()))? as u32,
        parent_asset_id: row.get::<Option<String>>(8).map_err(|e| DbError::MappingError(e.to_string()))?,
        dissolve_auth_key_hash: row.get::<Option<String>>(9).map_err(|e| DbError::MappingError(e.to_string()))?,
        ar_sync_latency_ms: row.get::<Option<i64>>(10).map_err(|e| DbError::MappingError(e.to_string()))?.map(|v| v as u32),
        last_biometric_sync,
        proof_of_ownership,
    })
}
