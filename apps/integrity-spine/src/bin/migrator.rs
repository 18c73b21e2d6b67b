// INICIO DEL ARCHIVO [apps/integrity-spine/src/bin/migrator.rs]
/**
 * =================================================================
 * APARATO: DB MIGRATOR CLI (V1.0 - SPINE GENESIS)
 * CLASIFICACION: OPS INFRASTRUCTURE (ESTRATO L6)
 * RESPONSABILIDAD: EJECUCION DE MANTENIMIENTO Y NIVELACION DE NUBE
 *
 * Dispara el bootstrap soberano del esquema (tablas, evolucion de
 * columnas, indices) contra la base configurada en DATABASE_URL, fuera
 * del ciclo de vida del servidor HTTP -- util para despliegues donde el
 * esquema debe nivelarse antes de levantar `spine`.
 * =================================================================
 */

use dotenvy::dotenv;
use spine_infra_db::schema::apply_full_sovereign_schema;
use spine_infra_db::SpineDbClient;
use spine_shared_telemetry::init_tracing;
use tracing::{error, info};

fn main() -> anyhow::Result<()> {
    dotenv().ok();
    init_tracing("spine_migrator");

    let runtime_orchestrator = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_stack_size(4 * 1024 * 1024)
        .build()?;

    runtime_orchestrator.block_on(async {
        info!("🚀 [MIGRATOR]: Initiating structural audit of Cloud Strata...");

        let database_url = std::env::var("DATABASE_URL")
            .expect("CRITICAL_FAULT: DATABASE_URL undefined in terminal context.");
        let database_token = std::env::var("TURSO_AUTH_TOKEN").ok();

        let database_client = match SpineDbClient::connect(&database_url, database_token).await {
            Ok(client) => client,
            Err(connection_error) => {
                error!("❌ [UPLINK_FAULT]: Failed to establish link to Turso: {}", connection_error);
                return Err(anyhow::anyhow!(connection_error));
            }
        };

        let database_connection = database_client
            .acquire_session()
            .await
            .map_err(|error| anyhow::anyhow!("POOL_EXHAUSTED: {}", error))?;

        match apply_full_sovereign_schema(&database_connection).await {
            Ok(_) => {
                info!("✨ [MIGRATOR_SUCCESS]: Tactical ledger schema is now Gold Master level.");
                Ok(())
            }
            Err(schema_fault) => {
                error!("💀 [SCHEMA_COLLAPSE]: Fatal structural error: {}", schema_fault);
                std::process::exit(1);
            }
        }
    })
}
// FIN DEL ARCHIVO [apps/integrity-spine/src/bin/migrator.rs]
