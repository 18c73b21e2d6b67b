// [apps/integrity-spine/src/state/mod.rs]
/*!
 * =================================================================
 * APARATO: INTEGRITY SPINE APPLICATION STATE (V1.0 - SPINE GENESIS)
 * CLASIFICACION: APPLICATION STATE (ESTRATO L3)
 * RESPONSABILIDAD: COMPOSICION DE DEPENDENCIAS COMPARTIDAS ENTRE HANDLERS
 *
 * Un unico cliente libSQL, el cache de estado por cubo, dos clientes de
 * ancla y los dos verificadores externos. `AppState::new` forja todo;
 * los handlers solo leen campos `Arc`-envueltos.
 * =================================================================
 */

use std::sync::{Arc, RwLock};

use spine_infra_db::repositories::DbVerifierCache;
use spine_infra_db::SpineDbClient;
use spine_infra_ledger::{AnchorClient, BurnProofVerifier, EsgVerifier, VerifierCache};
use spine_infra_state_cache::StateCacheStore;
use tracing::{info, instrument, warn};

use crate::config::SpineConfig;

/// Modos de salud del sistema para la interceptacion de middleware perimetral.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SystemMode {
    Operational,
    Maintenance(String),
}

#[derive(Clone)]
pub struct AppState {
    pub db: SpineDbClient,
    pub state_cache: Arc<StateCacheStore>,
    pub cardano_anchor: AnchorClient,
    pub midnight_anchor: AnchorClient,
    pub burn_proof_verifier: Arc<BurnProofVerifier>,
    pub esg_verifier: Arc<EsgVerifier>,
    pub region_default: String,
    pub current_system_mode: Arc<RwLock<SystemMode>>,
}

impl AppState {
    #[instrument(skip(config))]
    pub async fn new(config: &SpineConfig) -> Result<Self, spine_infra_db::errors::DbError> {
        info!("🧬 [APP_STATE]: Forjando estado compartido del Integrity Spine...");

        let db = SpineDbClient::connect(&config.database_url, config.database_auth_token.clone()).await?;
        let verifier_cache: Arc<dyn VerifierCache> = Arc::new(DbVerifierCache::new(db.clone()));

        let cardano_anchor = AnchorClient::cardano(config.cardano_ledger_url.clone(), config.ledger_timeout);
        let midnight_anchor = AnchorClient::midnight(config.midnight_ledger_url.clone(), config.ledger_timeout);

        let burn_proof_verifier = Arc::new(BurnProofVerifier::new(
            config.midnight_ledger_url.clone(),
            config.ledger_timeout,
            verifier_cache.clone(),
            config.require_ledger,
            config.allow_stub_fallback,
        ));
        let esg_verifier = Arc::new(EsgVerifier::new(
            config.cardano_ledger_url.clone(),
            config.ledger_timeout,
            verifier_cache,
            config.require_ledger,
            config.allow_stub_fallback,
        ));

        Ok(Self {
            db,
            state_cache: Arc::new(StateCacheStore::new()),
            cardano_anchor,
            midnight_anchor,
            burn_proof_verifier,
            esg_verifier,
            region_default: config.region_default.clone(),
            current_system_mode: Arc::new(RwLock::new(SystemMode::Operational)),
        })
    }

    #[instrument(skip(self, target_system_mode))]
    pub fn set_mode(&self, target_system_mode: SystemMode) {
        match self.current_system_mode.write() {
            Ok(mut mode_guard) => {
                info!("🔄 [STATE_SHIFT]: System transitioning to mode: {:?}", target_system_mode);
                *mode_guard = target_system_mode;
            }
            Err(lock_poison_fault) => {
                tracing::error!("💀 [KERNEL_CRASH]: System mode lock poisoned: {}", lock_poison_fault);
            }
        }
    }

    #[instrument(skip(self), level = "debug")]
    pub fn is_operational(&self) -> Result<(), String> {
        let mode_guard = self.current_system_mode.read().map_err(|e| format!("LOCK_POISON_FAULT: {}", e))?;
        match &*mode_guard {
            SystemMode::Operational => Ok(()),
            SystemMode::Maintenance(rejection_reason) => {
                warn!("⛔ [ACCESS_DENIED]: Strata maintenance active: {}", rejection_reason);
                Err(rejection_reason.clone())
            }
        }
    }
}
