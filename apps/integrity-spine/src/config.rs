// [apps/integrity-spine/src/config.rs]
/*!
 * =================================================================
 * APARATO: SPINE ENVIRONMENT CONFIGURATION (V1.0 - SPINE GENESIS)
 * CLASIFICACION: APPLICATION SHELL (ESTRATO L3)
 * RESPONSABILIDAD: CARGA Y VALIDACION DE LA LISTA BLANCA DE ENTORNO
 *
 * Variables desconocidas se ignoran; valores requeridos ausentes en
 * produccion abortan el arranque (exit != 0).
 * =================================================================
 */

use std::time::Duration;

/// Lista blanca de variables de entorno reconocidas por el proceso.
/// Cualquier otra variable presente en el entorno es ignorada.
pub struct SpineConfig {
    pub database_url: String,
    pub database_auth_token: Option<String>,
    pub state_cache_project: String,
    pub region_default: String,
    pub cardano_ledger_url: String,
    pub midnight_ledger_url: String,
    pub db_pool_min: u32,
    pub db_pool_max: u32,
    pub cors_origins: Vec<String>,
    pub log_level: Option<String>,
    pub listening_port: u16,
    pub require_ledger: bool,
    pub allow_stub_fallback: bool,
    pub ledger_timeout: Duration,
}

impl SpineConfig {
    /// Carga y valida el entorno del proceso. En produccion
    /// (`cfg!(debug_assertions) == false`) falla con `exit(1)` si falta
    /// un valor requerido; en desarrollo cae a valores por defecto
    /// locales para facilitar el arranque sin infraestructura externa.
    pub fn from_env() -> Self {
        let is_production = !cfg!(debug_assertions);

        let database_url = Self::required_in_production("DATABASE_URL", is_production, "libsql://127.0.0.1:8080?mode=memory");
        let database_auth_token = std::env::var("TURSO_AUTH_TOKEN").ok();
        let state_cache_project = std::env::var("STATE_CACHE_PROJECT").unwrap_or_else(|_| "integrity-spine".to_string());
        let region_default = std::env::var("REGION_DEFAULT").unwrap_or_else(|_| "US-CA".to_string());

        let cardano_ledger_url = Self::required_in_production("CARDANO_LEDGER_URL", is_production, "http://127.0.0.1:9001");
        let midnight_ledger_url = Self::required_in_production("MIDNIGHT_LEDGER_URL", is_production, "http://127.0.0.1:9002");

        let db_pool_min: u32 = std::env::var("DB_POOL_MIN").ok().and_then(|raw| raw.parse().ok()).unwrap_or(1);
        let db_pool_max: u32 = std::env::var("DB_POOL_MAX").ok().and_then(|raw| raw.parse().ok()).unwrap_or(32);

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let log_level = std::env::var("LOG_LEVEL").ok();

        let listening_port: u16 = std::env::var("PORT").ok().and_then(|raw| raw.parse().ok()).unwrap_or(3000);

        let require_ledger = std::env::var("REQUIRE_LEDGER").map(|raw| raw == "true" || raw == "1").unwrap_or(is_production);
        let allow_stub_fallback =
            std::env::var("ALLOW_STUB_FALLBACK").map(|raw| raw == "true" || raw == "1").unwrap_or(!is_production);

        let ledger_timeout_secs: u64 = std::env::var("LEDGER_TIMEOUT_SECS").ok().and_then(|raw| raw.parse().ok()).unwrap_or(10);

        Self {
            database_url,
            database_auth_token,
            state_cache_project,
            region_default,
            cardano_ledger_url,
            midnight_ledger_url,
            db_pool_min,
            db_pool_max,
            cors_origins,
            log_level,
            listening_port,
            require_ledger,
            allow_stub_fallback,
            ledger_timeout: Duration::from_secs(ledger_timeout_secs),
        }
    }

    fn required_in_production(key: &str, is_production: bool, dev_default: &str) -> String {
        match std::env::var(key) {
            Ok(value) if !value.is_empty() => value,
            _ if is_production => {
                eprintln!("CRITICAL_CONFIG_FAULT: {key} is required in production and was not set.");
                std::process::exit(1);
            }
            _ => dev_default.to_string(),
        }
    }
}
