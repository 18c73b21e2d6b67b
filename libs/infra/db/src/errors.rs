// [libs/infra/db/src/errors.rs]
/*!
 * =================================================================
 * APARATO: DATABASE ERROR CATALOG (V1.0 - SPINE GENESIS)
 * CLASIFICACION: INFRASTRUCTURE CORE (ESTRATO L3)
 * RESPONSABILIDAD: CATALOGACION SEMANTICA DE FALLOS DE PERSISTENCIA
 * =================================================================
 */

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    /// Error de enlace fisico o de red con el cluster libSQL.
    #[error("[L3_DB_NET_FAULT]: DATABASE_UPLINK_SEVERED -> {0}")]
    ConnectionError(String),

    /// Fallo en la configuracion del entorno (variables vacias o malformadas).
    #[error("[L3_DB_CONFIG_FAULT]: STRATEGIC_ENV_VOID -> {0}")]
    ConfigurationError(String),

    /// El ruptor de salud esta abierto: no se aceptan nuevas sesiones.
    #[error("[L3_DB_BREAKER_FAULT]: HEALTH_BREAKER_OPEN -> {0}")]
    BreakerOpen(String),

    /// El semaforo de sesiones no pudo otorgar un permiso a tiempo.
    #[error("[L3_DB_EXHAUSTION_FAULT]: SESSION_POOL_EXHAUSTED")]
    SessionPoolExhausted,

    /// Error de sintaxis o ejecucion devuelto por el motor libSQL.
    #[error("[L3_DB_QUERY_FAULT]: SQL_QUERY_REJECTED -> {0}")]
    QueryError(#[from] libsql::Error),

    /// Fallo en la transformacion de tipos entre SQLite y el dominio Rust.
    #[error("[L3_DB_MAPPING_FAULT]: DATA_MAPPING_VIOLATION -> {0}")]
    MappingError(String),

    /// Error al comprometer cambios en una secuencia multi-tabla.
    #[error("[L3_DB_FAULT]: TRANSACTION_COLLAPSE -> {0}")]
    TransactionError(String),

    // --- ESTRATO DE IDENTIDAD ---
    #[error("[L3_USER_FAULT]: IDENTIFIER_NOT_FOUND")]
    UserNotFound,

    // --- ESTRATO DE ACTIVOS / PROVENANCE ---
    #[error("[L3_ASSET_FAULT]: IDENTIFIER_NOT_FOUND")]
    AssetNotFound,

    /// La secuencia de provenance tiene un hueco o una colision de owner.
    #[error("[L3_PROVENANCE_FAULT]: CHAIN_SEQUENCE_VIOLATION -> {0}")]
    ProvenanceSequenceViolation(String),

    // --- ESTRATO DE CONSENTIMIENTO ---
    #[error("[L3_CONSENT_FAULT]: POLICY_NOT_FOUND")]
    ConsentPolicyNotFound,

    // --- ESTRATO DE IDEMPOTENCIA ---
    /// Existe ya un registro de mutacion con este id pero con una huella distinta.
    #[error("[L3_MUTATION_FAULT]: MUTATION_ID_CONFLICT -> {0}")]
    MutationIdConflict(String),

    // --- ESTRATO DE AUDITORIA ---
    #[error("[L3_AUDIT_FAULT]: CHAIN_INTEGRITY_BROKEN -> {0}")]
    AuditChainBroken(String),

    // --- ESTRATO DE CICLO DE VIDA ---
    #[error("[L3_LIFECYCLE_FAULT]: EVENT_NOT_FOUND")]
    LifecycleEventNotFound,

    // --- ESTRATO DE VERIFICADORES (CACHE) ---
    #[error("[L3_VERIFIER_FAULT]: CACHE_ENTRY_NOT_FOUND")]
    VerifierCacheMiss,
}
