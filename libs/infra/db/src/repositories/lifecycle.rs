// [libs/infra/db/src/repositories/lifecycle.rs]
//! Repositorio de eventos de ciclo de vida. `commit_transition` es la
//! unica puerta de escritura: persiste el `LifecycleEvent` ya validado
//! por `spine-domain-lifecycle::authorize_and_apply` y aplica el nuevo
//! estado (y el incremento de `reprint_generation`, si aplica) sobre la
//! fila de `assets` dentro de la misma transaccion.

use libsql::{params, Connection};
use spine_domain_lifecycle::reprint_generation_delta;
use spine_domain_models::{LifecycleEvent, LifecycleState, TransitionResult, TriggerType};
use tracing::instrument;

use crate::errors::DbError;
use crate::repositories::assets::AssetRepository;

pub struct LifecycleRepository;

impl LifecycleRepository {
    /// Estado actual y hash de la clave de autorizacion de disolucion,
    /// necesarios para que el llamador invoque `authorize_and_apply`.
    #[instrument(skip(conn))]
    pub async fn current_state(conn: &Connection, asset_id: &str) -> Result<(LifecycleState, Option<String>), DbError> {
        let asset = AssetRepository::get(conn, asset_id).await?;
        Ok((asset.lifecycle_state, asset.dissolve_auth_key_hash))
    }

    #[instrument(skip(conn, result))]
    pub async fn commit_transition(conn: &Connection, result: &TransitionResult) -> Result<(), DbError> {
        let event = &result.event;
        let from_state = event.from_state.ok_or_else(|| DbError::MappingError("lifecycle event missing from_state".into()))?;

        let tx = conn.transaction().await.map_err(|e| DbError::TransactionError(e.to_string()))?;

        tx.execute(
            "INSERT INTO lifecycle_event (event_id, asset_id, from_state, to_state, triggered_by, trigger_type,
                                           dissolve_auth_verified, burn_proof_hash, parent_material_batch,
                                           esg_delta, carbon_saved_kg, water_saved_liters, occurred_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                event.event_id.as_str(),
                event.asset_id.as_str(),
                from_state.as_str(),
                event.to_state.as_str(),
                event.triggered_by.as_str(),
                trigger_type_str(event.trigger_type),
                event.dissolve_auth_verified as i64,
                event.burn_proof_hash.as_deref(),
                event.parent_material_batch.as_deref(),
                event.esg_delta,
                event.carbon_saved_kg,
                event.water_saved_liters,
                event.occurred_at.to_rfc3339(),
            ],
        )
        .await
        .map_err(|e| DbError::TransactionError(e.to_string()))?;

        let delta = reprint_generation_delta(from_state, event.to_state);
        AssetRepository::apply_lifecycle_transition(&tx, &event.asset_id, event.to_state, delta).await?;

        tx.commit().await.map_err(|e| DbError::TransactionError(e.to_string()))?;
        Ok(())
    }

    #[instrument(skip(conn))]
    pub async fn history(conn: &Connection, asset_id: &str) -> Result<Vec<LifecycleEvent>, DbError> {
        let mut rows = conn
            .query(
                "SELECT event_id, asset_id, from_state, to_state, triggered_by, trigger_type, dissolve_auth_verified,
                        burn_proof_hash, parent_material_batch, esg_delta, carbon_saved_kg, water_saved_liters, occurred_at
                 FROM lifecycle_event WHERE asset_id = ?1 ORDER BY occurred_at ASC",
                params![asset_id],
            )
            .await?;

        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(map_row(&row)?);
        }
        Ok(out)
    }
}

fn trigger_type_str(trigger: TriggerType) -> &'static str {
    match trigger {
        TriggerType::User => "user",
        TriggerType::Agent => "agent",
        TriggerType::System => "system",
    }
}

fn parse_trigger_type(raw: &str) -> Result<TriggerType, DbError> {
    match raw {
        "user" => Ok(TriggerType::User),
        "agent" => Ok(TriggerType::Agent),
        "system" => Ok(TriggerType::System),
        other => Err(DbError::MappingError(format!("unknown trigger_type {other}"))),
    }
}

fn map_row(row: &libsql::Row) -> Result<LifecycleEvent, DbError> {
    let from_raw: Option<String> = row.get(2).map_err(|e| DbError::MappingError(e.to_string()))?;
    let from_state = from_raw.map(|raw| LifecycleState::parse(&raw).ok_or_else(|| DbError::MappingError(format!("unknown lifecycle_state {raw}")))).transpose()?;

    let to_raw = row.get::<String>(3).map_err(|e| DbError::MappingError(e.to_string()))?;
    let to_state = LifecycleState::parse(&to_raw).ok_or_else(|| DbError::MappingError(format!("unknown lifecycle_state {to_raw}")))?;

    let trigger_raw = row.get::<String>(5).map_err(|e| DbError::MappingError(e.to_string()))?;

    Ok(LifecycleEvent {
        event_id: row.get::<String>(0).map_err(|e| DbError::MappingError(e.to_string()))?,
        asset_id: row.get::<String>(1).map_err(|e| DbError::MappingError(e.to_string()))?,
        from_state,
        to_state,
        triggered_by: row.get::<String>(4).map_err(|e| DbError::MappingError(e.to_string()))?,
        trigger_type: parse_trigger_type(&trigger_raw)?,
        dissolve_auth_verified: row.get::<i64>(6).map_err(|e| DbError::MappingError(e.to_string()))? != 0,
        burn_proof_hash: row.get::<Option<String>>(7).map_err(|e| DbError::MappingError(e.to_string()))?,
        parent_material_batch: row.get::<Option<String>>(8).map_err(|e| DbError::MappingError(e.to_string()))?,
        esg_delta: row.get::<f64>(9).map_err(|e| DbError::MappingError(e.to_string()))?,
        carbon_saved_kg: row.get::<f64>(10).map_err(|e| DbError::MappingError(e.to_string()))?,
        water_saved_liters: row.get::<f64>(11).map_err(|e| DbError::MappingError(e.to_string()))?,
        occurred_at: row
            .get::<String>(12)
            .map_err(|e| DbError::MappingError(e.to_string()))?
            .parse()
            .map_err(|e: chrono::ParseError| DbError::MappingError(e.to_string()))?,
    })
}
