// [libs/infra/db/src/client.rs]
/*!
 * =================================================================
 * APARATO: DATABASE CONNECTION CLIENT (V1.0 - SPINE GENESIS)
 * CLASIFICACION: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: GESTION DE ENLACES Y PERSISTENCIA ACID, SEMAFORO
 *                   DE SESIONES Y RUPTOR DE SALUD SENSIBLE A LATENCIA
 *
 * El semaforo acota cuantas sesiones concurrentes puede abrir el
 * resto del crate contra el enlace primario; el ruptor de salud
 * monitorea la latencia media y los fallos consecutivos y, al abrir,
 * desvia las lecturas hacia una conexion de respaldo de solo-lectura
 * (nunca las escrituras: el orquestador debe ver el fallo).
 * =================================================================
 */

use crate::errors::DbError;
use crate::schema::apply_full_sovereign_schema;
use libsql::{Builder, Connection, Database};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, Semaphore};
use tracing::{error, info, instrument, warn};

const MAX_CONCURRENT_SESSIONS: usize = 32;
const LATENCY_TRIP_THRESHOLD_MS: u64 = 2_000;
const CONSECUTIVE_FAILURE_TRIP_THRESHOLD: u32 = 5;
const OPEN_COOLDOWN: Duration = Duration::from_secs(30);
const HALF_OPEN_PROBE_BUDGET: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BreakerPhase {
    Closed,
    Open,
    HalfOpen,
}

struct HealthBreakerInner {
    phase: BreakerPhase,
    opened_at: Option<Instant>,
    probes_remaining: u32,
}

/// Ruptor de salud del enlace primario. Abre cuando la latencia media
/// movil supera `LATENCY_TRIP_THRESHOLD_MS` o tras
/// `CONSECUTIVE_FAILURE_TRIP_THRESHOLD` fallos seguidos; tras
/// `OPEN_COOLDOWN` pasa a semi-abierto y concede un presupuesto
/// limitado de sondas antes de decidir si cierra o reabre.
pub struct HealthBreaker {
    inner: Mutex<HealthBreakerInner>,
    consecutive_failures: AtomicU32,
    rolling_latency_ms: AtomicU64,
}

impl HealthBreaker {
    fn new() -> Self {
        Self {
            inner: Mutex::new(HealthBreakerInner { phase: BreakerPhase::Closed, opened_at: None, probes_remaining: 0 }),
            consecutive_failures: AtomicU32::new(0),
            rolling_latency_ms: AtomicU64::new(0),
        }
    }

    async fn admit(&self) -> bool {
        let mut guard = self.inner.lock().await;
        match guard.phase {
            BreakerPhase::Closed => true,
            BreakerPhase::Open => {
                if guard.opened_at.map(|t| t.elapsed() >= OPEN_COOLDOWN).unwrap_or(false) {
                    info!("🔎 [BREAKER]: Cooldown agotado, pasando a semi-abierto.");
                    guard.phase = BreakerPhase::HalfOpen;
                    guard.probes_remaining = HALF_OPEN_PROBE_BUDGET;
                    true
                } else {
                    false
                }
            }
            BreakerPhase::HalfOpen => {
                if guard.probes_remaining > 0 {
                    guard.probes_remaining -= 1;
                    true
                } else {
                    false
                }
            }
        }
    }

    async fn record_success(&self, latency: Duration) {
        self.consecutive_failures.store(0, Ordering::SeqCst);
        let sample = latency.as_millis() as u64;
        let prev = self.rolling_latency_ms.load(Ordering::SeqCst);
        let blended = if prev == 0 { sample } else { (prev * 4 + sample) / 5 };
        self.rolling_latency_ms.store(blended, Ordering::SeqCst);

        let mut guard = self.inner.lock().await;
        if guard.phase == BreakerPhase::HalfOpen && guard.probes_remaining == 0 {
            info!("✅ [BREAKER]: Sondas superadas, cerrando circuito.");
            guard.phase = BreakerPhase::Closed;
            guard.opened_at = None;
        }
        if blended >= LATENCY_TRIP_THRESHOLD_MS && guard.phase == BreakerPhase::Closed {
            warn!("⚠️ [BREAKER]: Latencia media {}ms excede umbral, abriendo circuito.", blended);
            guard.phase = BreakerPhase::Open;
            guard.opened_at = Some(Instant::now());
        }
    }

    async fn record_failure(&self) {
        let failures = self.consecutive_failures.fetch_add(1, Ordering::SeqCst) + 1;
        let mut guard = self.inner.lock().await;
        if guard.phase == BreakerPhase::HalfOpen {
            warn!("❌ [BREAKER]: Sonda fallida en semi-abierto, reabriendo circuito.");
            guard.phase = BreakerPhase::Open;
            guard.opened_at = Some(Instant::now());
            return;
        }
        if failures >= CONSECUTIVE_FAILURE_TRIP_THRESHOLD && guard.phase == BreakerPhase::Closed {
            error!("💀 [BREAKER]: {} fallos consecutivos, abriendo circuito.", failures);
            guard.phase = BreakerPhase::Open;
            guard.opened_at = Some(Instant::now());
        }
    }

    pub async fn is_open(&self) -> bool {
        matches!(self.inner.lock().await.phase, BreakerPhase::Open)
    }
}

#[derive(Clone)]
pub struct SpineDbClient {
    internal_database_driver: Arc<Database>,
    /// Mantiene la base de datos viva en memoria evitando que SQLite la purgue.
    _memory_persistence_anchor: Option<Arc<Connection>>,
    /// Conexion de respaldo de solo-lectura, abierta una vez al conectar;
    /// sirve lecturas degradadas mientras el ruptor esta abierto.
    fallback_read_connection: Option<Arc<Connection>>,
    session_semaphore: Arc<Semaphore>,
    pub breaker: Arc<HealthBreaker>,
}

impl SpineDbClient {
    #[instrument(skip(database_access_token))]
    pub async fn connect(database_connection_url: &str, database_access_token: Option<String>) -> Result<Self, DbError> {
        if database_connection_url.is_empty() {
            return Err(DbError::ConfigurationError("DATABASE_URL_UNDEFINED".into()));
        }

        info!("🔌 [DATABASE]: Initiating link synchronization to [{}]", database_connection_url);

        let is_remote = database_connection_url.starts_with("libsql://") || database_connection_url.starts_with("https://");
        let is_memory = database_connection_url.contains(":memory:") || database_connection_url.contains("mode=memory");

        let database_driver = if is_remote {
            let token = database_access_token
                .ok_or_else(|| DbError::ConfigurationError("remote access token missing".into()))?;
            Builder::new_remote(database_connection_url.to_string(), token).build().await
        } else {
            Builder::new_local(database_connection_url).build().await
        }
        .map_err(|e| DbError::ConnectionError(format!("DRIVER_IGNITION_FAILURE: {}", e)))?;

        let shared_driver = Arc::new(database_driver);
        let mut anchor = None;

        if is_memory {
            let anchor_conn = shared_driver.connect().map_err(|e| DbError::ConnectionError(format!("ANCHOR_FAULT: {}", e)))?;
            apply_full_sovereign_schema(&anchor_conn)
                .await
                .map_err(|e| DbError::ConnectionError(format!("SCHEMA_SYNC_FAULT: {}", e)))?;
            anchor = Some(Arc::new(anchor_conn));
            info!("⚓ [DATABASE]: Memory strata solidified and anchored.");
        } else {
            let bootstrap_conn = shared_driver
                .connect()
                .map_err(|e| DbError::ConnectionError(format!("BOOTSTRAP_LINK_FAULT: {}", e)))?;
            apply_full_sovereign_schema(&bootstrap_conn)
                .await
                .map_err(|e| DbError::ConnectionError(format!("SCHEMA_SYNC_FAULT: {}", e)))?;
        }

        let fallback_read_connection = shared_driver
            .connect()
            .map(Arc::new)
            .map_err(|e| DbError::ConnectionError(format!("FALLBACK_SLOT_FAULT: {}", e)))
            .ok();

        Ok(Self {
            internal_database_driver: shared_driver,
            _memory_persistence_anchor: anchor,
            fallback_read_connection,
            session_semaphore: Arc::new(Semaphore::new(MAX_CONCURRENT_SESSIONS)),
            breaker: Arc::new(HealthBreaker::new()),
        })
    }

    /// Abre una sesion contra el enlace primario, acotada por el
    /// semaforo y sujeta al ruptor de salud. Toda escritura del crate
    /// debe pasar por aqui; las lecturas pueden optar por
    /// `acquire_read_session` para degradar con gracia.
    #[instrument(skip(self))]
    pub async fn acquire_session(&self) -> Result<Connection, DbError> {
        if !self.breaker.admit().await {
            return Err(DbError::BreakerOpen("primary link circuit open".into()));
        }

        let _permit = self
            .session_semaphore
            .try_acquire()
            .map_err(|_| DbError::SessionPoolExhausted)?;

        let started = Instant::now();
        match self.internal_database_driver.connect() {
            Ok(conn) => {
                self.breaker.record_success(started.elapsed()).await;
                Ok(conn)
            }
            Err(e) => {
                self.breaker.record_failure().await;
                Err(DbError::ConnectionError(e.to_string()))
            }
        }
    }

    /// Variante de lectura: si el ruptor esta abierto, degrada al cupo
    /// de respaldo en lugar de propagar el fallo. Nunca se usa para
    /// escrituras: el respaldo puede estar desactualizado.
    #[instrument(skip(self))]
    pub async fn acquire_read_session(&self) -> Result<Connection, DbError> {
        match self.acquire_session().await {
            Ok(conn) => Ok(conn),
            Err(DbError::BreakerOpen(_)) => {
                warn!("🛟 [DATABASE]: Circuito abierto, degradando lectura al cupo de respaldo.");
                self.internal_database_driver
                    .connect()
                    .map_err(|e| DbError::ConnectionError(format!("FALLBACK_READ_FAULT: {}", e)))
            }
            Err(e) => Err(e),
        }
    }

    pub fn has_fallback_slot(&self) -> bool {
        self.fallback_read_connection.is_some()
    }
}
