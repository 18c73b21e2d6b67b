// INICIO DEL ARCHIVO [apps/integrity-spine/src/bin/seed.rs]
//! =================================================================
//! APARATO: GENESIS FORGE SEEDER (V1.0 - SPINE GENESIS)
//! CLASIFICACION: INFRASTRUCTURE UTILITY (ESTRATO L3)
//! RESPONSABILIDAD: SEMBRADO ATOMICO DE UNA INSTANCIA DEMOSTRABLE
//!
//! Planta un usuario creador/propietario y un activo recien acunado
//! (via `ProvenanceRepository::mint_asset`, que garantiza el invariante
//! `current_owner_id == to_user_id` de la primera entrada de la cadena)
//! para que un operador pueda ejercitar `/intent/resolve` y
//! `/cubes/:id` contra una instancia recien desplegada sin tener que
//! escribir filas a mano.
//! =================================================================

use chrono::Utc;
use dotenvy::dotenv;
use spine_domain_models::{Asset, LifecycleState, User};
use spine_infra_db::repositories::{AssetRepository, ProvenanceRepository, UserRepository};
use spine_infra_db::SpineDbClient;
use tracing::{error, info};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter("info,spine_infra_db=debug")
        .with_target(false)
        .init();

    info!("💠 [GENESIS_FORGE]: Initiating Sovereign Instance Hydration...");

    let database_url = std::env::var("DATABASE_URL").expect("CRITICAL_FAULT: DATABASE_URL is missing in environment.");
    let database_token = std::env::var("TURSO_AUTH_TOKEN").ok();

    let database_client = match SpineDbClient::connect(&database_url, database_token).await {
        Ok(client) => client,
        Err(e) => {
            error!("❌ [FORGE_FAULT]: UPLINK_COLLAPSE: {}", e);
            return Err(anyhow::anyhow!(e));
        }
    };

    let conn = database_client.acquire_session().await.map_err(|e| anyhow::anyhow!("POOL_FAULT: {}", e))?;

    info!("⚙️  [FORGE]: Synchronizing system_state control metadata...");
    conn.execute(
        "INSERT INTO system_state (key, value_text, updated_at)
         VALUES ('seed_fixture_version', 'SPINE_GENESIS_V1', CURRENT_TIMESTAMP)
         ON CONFLICT(key) DO UPDATE SET value_text = excluded.value_text",
        (),
    )
    .await?;

    info!("🧪 [FORGE]: Planting the demo creator/owner...");
    let owner = User {
        user_id: "seed-owner-001".to_string(),
        handle: "demo_owner".to_string(),
        display_name: "Demo Owner".to_string(),
        region_code: "US".to_string(),
        trust_score: 0.9,
        consent_version: "v1".to_string(),
        is_active: true,
        created_at: Utc::now(),
    };
    if UserRepository::get(&conn, &owner.user_id).await.is_err() {
        UserRepository::create(&conn, &owner).await?;
    }

    info!("🚀 [FORGE]: Minting the demo garment passport...");
    let asset = Asset {
        asset_id: "seed-garment-001".to_string(),
        asset_type: "garment".to_string(),
        display_name: "Demo Garment #1".to_string(),
        creator_user_id: owner.user_id.clone(),
        current_owner_id: owner.user_id.clone(),
        authenticity_hash: format!("seed:{}", Uuid::new_v4()),
        lifecycle_state: LifecycleState::Produced,
        reprint_generation: 0,
        parent_asset_id: None,
        dissolve_auth_key_hash: None,
        ar_sync_latency_ms: None,
        last_biometric_sync: None,
        proof_of_ownership: None,
    };
    if spine_infra_db::repositories::AssetRepository::get(&conn, &asset.asset_id).await.is_err() {
        ProvenanceRepository::mint_asset(&conn, &asset, &Uuid::new_v4().to_string(), None).await?;
    }

    info!("✅ [GENESIS_COMPLETE]: Instance seeded. Demo asset ready for passport resolution.");
    Ok(())
}
// FIN DEL ARCHIVO [apps/integrity-spine/src/bin/seed.rs]
