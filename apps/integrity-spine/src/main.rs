// [apps/integrity-spine/src/main.rs]
/*!
 * =================================================================
 * APARATO: INTEGRITY SPINE MAIN ENTRY POINT (V1.0 - SPINE GENESIS)
 * CLASIFICACION: APPLICATION SHELL (ESTRATO L3)
 * RESPONSABILIDAD: IGNICION DEL BINARIO DE SERVICIO
 * =================================================================
 */

use dotenvy::dotenv;
use integrity_spine::prelude::*;
use spine_shared_telemetry::init_tracing;
use tracing::info;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    init_tracing("integrity_spine");

    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;

    runtime.block_on(async {
        info!("🛰️  [COMMAND_CENTER]: Global ignition sequence starting...");

        let config = SpineConfig::from_env();
        let cors_origins = config.cors_origins.clone();

        let kernel_instance = SpineKernel::ignite(&config).await;

        info!("🚀 [SPINE_ONLINE]: System fully operational on port {}.", kernel_instance.server_network_port);
        kernel_instance.launch_sovereign_operations(&cors_origins).await;

        Ok(())
    })
}
