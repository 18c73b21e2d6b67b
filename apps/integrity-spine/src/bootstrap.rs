// [apps/integrity-spine/src/bootstrap.rs]
/*!
 * =================================================================
 * APARATO: ASYNC SYSTEM BOOTSTRAP (V1.0 - SPINE GENESIS)
 * CLASIFICACION: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: PRE-VUELO DE ESQUEMA/LEDGER Y BARRIDO DE HORIZONTE
 *
 * Dos daemons de fondo: la certificacion periodica de alcanzabilidad
 * de esquema/ledger que alterna `SystemMode`, y el barrido de
 * `mutation_log` que purga filas resueltas mas viejas que el horizonte
 * de retencion.
 * =================================================================
 */

use std::time::Duration;

use chrono::Duration as ChronoDuration;
use spine_infra_db::repositories::MutationLogRepository;
use tracing::{error, info, instrument, warn};

use crate::state::{AppState, SystemMode};

const CLEANUP_INTERVAL: Duration = Duration::from_secs(3600);
const CLEANUP_HORIZON_DAYS: i64 = 7;
const CLEANUP_BATCH_SIZE: i64 = 500;

pub struct Bootstrap;

impl Bootstrap {
    /// Lanza la secuencia de certificacion de integridad asincrona en
    /// un hilo de fondo, de modo que el servidor pueda responder al
    /// chequeo de salud inmediatamente aunque sea en modo
    /// `Maintenance` mientras termina.
    #[instrument(skip(application_shared_state))]
    pub fn spawn_diagnostics(application_shared_state: AppState) {
        tokio::spawn(async move {
            info!("🩺 [BOOTSTRAP]: Iniciando certificacion de integridad...");

            match Self::execute_integrity_certification(&application_shared_state).await {
                Ok(_) => {
                    info!("✅ [BOOTSTRAP]: Esquema y ledgers nivelados. Modo operativo autorizado.");
                    application_shared_state.set_mode(SystemMode::Operational);
                }
                Err(certification_fault) => {
                    let error_diagnostic_report = format!("CRITICAL_BOOT_FAULT: {}", certification_fault);
                    error!("❌ {}", error_diagnostic_report);
                    application_shared_state.set_mode(SystemMode::Maintenance(error_diagnostic_report));
                }
            }
        });

        Self::spawn_mutation_log_sweeper(application_shared_state);
    }

    /// Verifica que el enlace primario responda y que el ruptor de
    /// salud no este abierto de entrada; la certificacion del esquema
    /// ya ocurrio dentro de `SpineDbClient::connect`.
    async fn execute_integrity_certification(state: &AppState) -> anyhow::Result<()> {
        let conn = state.db.acquire_session().await.map_err(|e| anyhow::anyhow!("DATABASE_UPLINK_FAULT: {e}"))?;
        conn.query("SELECT 1", ()).await.map_err(|e| anyhow::anyhow!("SCHEMA_PROBE_FAULT: {e}"))?;

        if state.db.breaker.is_open().await {
            return Err(anyhow::anyhow!("HEALTH_BREAKER_OPEN_AT_BOOT"));
        }

        Ok(())
    }

    /// Daemon periodico que borra en lotes las filas de `mutation_log`
    /// mas viejas que el horizonte configurado, evitando que la tabla
    /// de idempotencia crezca sin cota.
    fn spawn_mutation_log_sweeper(state: AppState) {
        tokio::spawn(async move {
            let horizon = ChronoDuration::days(CLEANUP_HORIZON_DAYS);
            loop {
                tokio::time::sleep(CLEANUP_INTERVAL).await;
                match state.db.acquire_session().await {
                    Ok(conn) => match MutationLogRepository::cleanup_older_than(&conn, horizon, CLEANUP_BATCH_SIZE).await {
                        Ok(deleted) if deleted > 0 => info!(deleted, "🧹 [SWEEPER]: mutation_log horizon rows purged"),
                        Ok(_) => {}
                        Err(e) => warn!(error = %e, "sweeper could not purge mutation_log"),
                    },
                    Err(e) => warn!(error = %e, "sweeper could not acquire a session"),
                }
            }
        });
    }
}
