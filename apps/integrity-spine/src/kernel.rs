// [apps/integrity-spine/src/kernel.rs]
/*!
 * =================================================================
 * APARATO: INTEGRITY SPINE SOVEREIGN KERNEL (V1.0 - SPINE GENESIS)
 * CLASIFICACION: COMPOSITION ROOT (ESTRATO L3)
 * RESPONSABILIDAD: IGNICION DE INFRAESTRUCTURA Y ARRANQUE DEL SERVIDOR
 * =================================================================
 */

use std::net::{IpAddr, SocketAddr};

use tracing::{error, info, instrument};

use crate::bootstrap::Bootstrap;
use crate::config::SpineConfig;
use crate::routes::create_spine_router;
use crate::state::AppState;

pub struct SpineKernel {
    pub server_network_port: u16,
    pub application_state: AppState,
}

impl SpineKernel {
    #[instrument(skip(config))]
    pub async fn ignite(config: &SpineConfig) -> Self {
        let application_state = AppState::new(config).await.expect("FATAL: Database link collapse. Ignition aborted.");

        Self { server_network_port: config.listening_port, application_state }
    }

    pub async fn launch_sovereign_operations(self, cors_origins: &[String]) {
        let shared_application_state = self.application_state.clone();

        Bootstrap::spawn_diagnostics(shared_application_state.clone());

        let sovereign_router = create_spine_router(shared_application_state, cors_origins);

        let bind_address = SocketAddr::new("0.0.0.0".parse::<IpAddr>().unwrap(), self.server_network_port);

        info!("🚀 [KERNEL_ONLINE]: Integrity Spine listening at {}", bind_address);

        let tcp_listener = tokio::net::TcpListener::bind(bind_address).await.expect("CRITICAL_FAULT: Failed to bind network port.");

        if let Err(server_error) = axum::serve(tcp_listener, sovereign_router).await {
            error!("💀 [KERNEL_COLLAPSE]: Runtime failure: {}", server_error);
            std::process::exit(1);
        }
    }
}
