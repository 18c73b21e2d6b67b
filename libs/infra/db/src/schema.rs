// [libs/infra/db/src/schema.rs]
/*!
 * =================================================================
 * APARATO: SPINE DATABASE SCHEMA (V1.0 - GENESIS)
 * CLASIFICACION: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: GOBERNANZA ESTRUCTURAL E IDEMPOTENCIA TOTAL
 *
 * Tres fases, aplicadas en orden y de forma idempotente en cada
 * arranque: solidificacion de tablas base, evolucion de columnas
 * sobre tablas preexistentes, y endurecimiento con indices de
 * aceleracion para las consultas de caliente (resolucion de
 * consentimiento, cadena de provenance, bitacora de auditoria).
 * =================================================================
 */

use anyhow::{Context, Result};
use libsql::Connection;
use tracing::{debug, info, instrument, warn};

/**
 * ESTRATO 1: SOLIDIFICACION (Genesis de Tablas)
 * Define las entidades base del Integrity Spine.
 */
const TACTICAL_TABLES: &[(&str, &str)] = &[
    ("TABLE_USERS", r#"
        CREATE TABLE IF NOT EXISTS users (
            user_id TEXT PRIMARY KEY,
            handle TEXT NOT NULL UNIQUE,
            display_name TEXT NOT NULL,
            region_code TEXT NOT NULL,
            trust_score REAL NOT NULL DEFAULT 0.5,
            consent_version TEXT NOT NULL DEFAULT 'v1',
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );
    "#),
    ("TABLE_ASSETS", r#"
        CREATE TABLE IF NOT EXISTS assets (
            asset_id TEXT PRIMARY KEY,
            asset_type TEXT NOT NULL,
            display_name TEXT NOT NULL,
            creator_user_id TEXT NOT NULL,
            current_owner_id TEXT NOT NULL,
            authenticity_hash TEXT NOT NULL,
            lifecycle_state TEXT NOT NULL DEFAULT 'PRODUCED',
            reprint_generation INTEGER NOT NULL DEFAULT 0,
            parent_asset_id TEXT,
            dissolve_auth_key_hash TEXT,
            ar_sync_latency_ms INTEGER,
            last_biometric_sync DATETIME,
            proof_of_ownership_json TEXT,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );
    "#),
    ("TABLE_PROVENANCE_CHAIN", r#"
        CREATE TABLE IF NOT EXISTS provenance_chain (
            provenance_id TEXT PRIMARY KEY,
            asset_id TEXT NOT NULL,
            sequence_num INTEGER NOT NULL,
            from_user_id TEXT,
            to_user_id TEXT NOT NULL,
            transfer_type TEXT NOT NULL,
            price REAL,
            currency TEXT,
            blockchain_tx_hash TEXT,
            midnight_proof_hash TEXT,
            transfer_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            UNIQUE(asset_id, sequence_num)
        );
    "#),
    ("TABLE_OWNS", r#"
        CREATE TABLE IF NOT EXISTS owns (
            asset_id TEXT NOT NULL,
            user_id TEXT NOT NULL,
            is_current INTEGER NOT NULL DEFAULT 1,
            since DATETIME DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (asset_id, user_id)
        );
    "#),
    ("TABLE_CONSENT_POLICY", r#"
        CREATE TABLE IF NOT EXISTS consent_policy (
            policy_id TEXT PRIMARY KEY,
            owner_user_id TEXT NOT NULL,
            scope_kind TEXT NOT NULL,
            scope_asset_id TEXT,
            scope_facet TEXT,
            scope_grantee_user_id TEXT,
            visibility TEXT NOT NULL,
            policy_version TEXT NOT NULL,
            is_revoked INTEGER NOT NULL DEFAULT 0,
            revoked_at DATETIME,
            revoke_reason TEXT,
            expires_at DATETIME,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );
    "#),
    ("TABLE_FRIENDS_WITH", r#"
        CREATE TABLE IF NOT EXISTS friends_with (
            friendship_id TEXT PRIMARY KEY,
            user_a_id TEXT NOT NULL,
            user_b_id TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'active',
            since DATETIME DEFAULT CURRENT_TIMESTAMP,
            UNIQUE(user_a_id, user_b_id)
        );
    "#),
    ("TABLE_MUTATION_LOG", r#"
        CREATE TABLE IF NOT EXISTS mutation_log (
            mutation_id TEXT PRIMARY KEY,
            operation TEXT NOT NULL,
            requested_by TEXT NOT NULL,
            outcome TEXT NOT NULL DEFAULT 'in_progress',
            result_json TEXT,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            completed_at DATETIME
        );
    "#),
    ("TABLE_AUDIT_ENTRY", r#"
        CREATE TABLE IF NOT EXISTS audit_entry (
            entry_id TEXT PRIMARY KEY,
            subject_id TEXT NOT NULL,
            sequence_num INTEGER NOT NULL,
            actor_user_id TEXT,
            action TEXT NOT NULL,
            summary TEXT NOT NULL,
            detail_json TEXT NOT NULL,
            prev_hash TEXT,
            entry_hash TEXT NOT NULL,
            mutation_id TEXT,
            risk_flagged INTEGER NOT NULL DEFAULT 0,
            escalated_to_human INTEGER NOT NULL DEFAULT 0,
            approver_user_id TEXT,
            recorded_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            UNIQUE(subject_id, sequence_num)
        );
    "#),
    ("TABLE_CHAIN_ANCHOR", r#"
        CREATE TABLE IF NOT EXISTS chain_anchor (
            anchor_id TEXT PRIMARY KEY,
            subject_id TEXT NOT NULL,
            up_to_sequence_num INTEGER NOT NULL,
            root_hash TEXT NOT NULL,
            cardano_tx_hash TEXT,
            midnight_tx_hash TEXT,
            status TEXT NOT NULL DEFAULT 'pending',
            anchored_at DATETIME
        );
    "#),
    ("TABLE_LIFECYCLE_EVENT", r#"
        CREATE TABLE IF NOT EXISTS lifecycle_event (
            event_id TEXT PRIMARY KEY,
            asset_id TEXT NOT NULL,
            from_state TEXT,
            to_state TEXT NOT NULL,
            triggered_by TEXT NOT NULL,
            trigger_type TEXT NOT NULL,
            dissolve_auth_verified INTEGER NOT NULL DEFAULT 0,
            burn_proof_hash TEXT,
            parent_material_batch TEXT,
            esg_delta REAL NOT NULL DEFAULT 0.0,
            carbon_saved_kg REAL NOT NULL DEFAULT 0.0,
            water_saved_liters REAL NOT NULL DEFAULT 0.0,
            occurred_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );
    "#),
    ("TABLE_BURN_PROOF_CACHE", r#"
        CREATE TABLE IF NOT EXISTS burn_proof_cache (
            burn_proof_hash TEXT PRIMARY KEY,
            valid INTEGER NOT NULL,
            verified_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );
    "#),
    ("TABLE_MATERIAL_ESG_CACHE", r#"
        CREATE TABLE IF NOT EXISTS material_esg_cache (
            cache_key TEXT PRIMARY KEY,
            transaction_type TEXT NOT NULL,
            score REAL NOT NULL,
            threshold REAL NOT NULL,
            verified_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );
    "#),
    ("TABLE_SYSTEM_STATE", r#"
        CREATE TABLE IF NOT EXISTS system_state (
            key TEXT PRIMARY KEY,
            value_text TEXT,
            value_int INTEGER,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );
    "#),
];

/**
 * ESTRATO 2: EVOLUCION (Mutaciones de Columna)
 * Reservado para columnas anadidas a tablas preexistentes en
 * despliegues posteriores al genesis. Vacio en V1.0: no hay
 * despliegue previo que migrar.
 */
const EVOLUTIONARY_STRATA: &[(&str, &str)] = &[];

/**
 * ESTRATO 3: ENDURECIMIENTO (Indices de Aceleracion)
 * Optimiza las consultas de caliente: resolucion de consentimiento,
 * recorrido de la cadena de provenance y lectura de la bitacora.
 */
const ACCELERATION_INDEXES: &[(&str, &str)] = &[
    ("IDX_PROVENANCE_ASSET", "CREATE INDEX IF NOT EXISTS idx_provenance_asset ON provenance_chain(asset_id, sequence_num);"),
    ("IDX_OWNS_USER", "CREATE INDEX IF NOT EXISTS idx_owns_user ON owns(user_id, is_current);"),
    ("IDX_CONSENT_OWNER", "CREATE INDEX IF NOT EXISTS idx_consent_owner ON consent_policy(owner_user_id, scope_kind);"),
    ("IDX_CONSENT_ASSET", "CREATE INDEX IF NOT EXISTS idx_consent_asset ON consent_policy(scope_asset_id);"),
    ("IDX_FRIENDS_A", "CREATE INDEX IF NOT EXISTS idx_friends_a ON friends_with(user_a_id, status);"),
    ("IDX_FRIENDS_B", "CREATE INDEX IF NOT EXISTS idx_friends_b ON friends_with(user_b_id, status);"),
    ("IDX_AUDIT_SEQUENCE", "CREATE INDEX IF NOT EXISTS idx_audit_sequence ON audit_entry(subject_id, sequence_num);"),
    ("IDX_AUDIT_ESCALATED", "CREATE INDEX IF NOT EXISTS idx_audit_escalated ON audit_entry(escalated_to_human, approver_user_id, recorded_at);"),
    ("IDX_LIFECYCLE_ASSET", "CREATE INDEX IF NOT EXISTS idx_lifecycle_asset ON lifecycle_event(asset_id, occurred_at);"),
    ("IDX_CHAIN_ANCHOR_SUBJECT", "CREATE INDEX IF NOT EXISTS idx_chain_anchor_subject ON chain_anchor(subject_id, up_to_sequence_num);"),
];

/**
 * Ejecuta la secuencia maestra de sincronizacion del esquema estructural.
 *
 * # Errors:
 * Retorna error si alguna tabla base falla en solidificarse, indicando
 * un colapso en el enlace con el motor libSQL.
 */
#[instrument(skip(database_connection))]
pub async fn apply_full_sovereign_schema(database_connection: &Connection) -> Result<()> {
    info!("🏗️ [SCHEMA_ENGINE]: Initiating structural synchronization V1.0...");

    solidify_base_strata(database_connection).await?;
    execute_evolutionary_repair(database_connection).await?;
    harden_access_layer(database_connection).await?;

    info!("✅ [SCHEMA_ENGINE]: Integrity Spine schema level and certified.");
    Ok(())
}

async fn solidify_base_strata(db: &Connection) -> Result<()> {
    for (identifier, sql) in TACTICAL_TABLES {
        debug!("  ↳ Solidifying: {}", identifier);
        db.execute(*sql, ())
            .await
            .with_context(|| format!("CRITICAL_SOLIDIFICATION_FAULT: {}", identifier))?;
    }
    Ok(())
}

async fn execute_evolutionary_repair(db: &Connection) -> Result<()> {
    for (identifier, sql) in EVOLUTIONARY_STRATA {
        match db.execute(*sql, ()).await {
            Ok(_) => info!("  🟢 [REPAIR_OK]: Applied evolutionary stratum {}", identifier),
            Err(e) => {
                let message = e.to_string();
                if message.contains("duplicate column name") {
                    debug!("  ⚪ [REPAIR_SKIP]: {} already level.", identifier);
                } else {
                    warn!("  ⚠️ [REPAIR_BYPASS]: {} check incomplete: {}", identifier, message);
                }
            }
        }
    }
    Ok(())
}

async fn harden_access_layer(db: &Connection) -> Result<()> {
    for (identifier, sql) in ACCELERATION_INDEXES {
        debug!("  ↳ Hardening: {}", identifier);
        db.execute(*sql, ())
            .await
            .with_context(|| format!("CRITICAL_HARDENING_FAULT: {}", identifier))?;
    }
    Ok(())
}
