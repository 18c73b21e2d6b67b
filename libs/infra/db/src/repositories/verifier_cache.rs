// [libs/infra/db/src/repositories/verifier_cache.rs]
//! Implementacion persistente de `spine_infra_ledger::VerifierCache`
//! sobre `burn_proof_cache` / `material_esg_cache`. Horizonte de 24h:
//! una fila mas vieja que eso se trata como ausente, no se borra aqui
//! (el barrido pertenece a un sweeper periodico, no a la ruta de
//! lectura caliente).

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use libsql::params;
use spine_domain_models::EsgScore;
use spine_infra_ledger::VerifierCache;
use tracing::instrument;

use crate::client::SpineDbClient;

const CACHE_HORIZON_HOURS: i64 = 24;

pub struct DbVerifierCache {
    db: SpineDbClient,
}

impl DbVerifierCache {
    pub fn new(db: SpineDbClient) -> Self {
        Self { db }
    }
}

#[async_trait]
impl VerifierCache for DbVerifierCache {
    #[instrument(skip(self))]
    async fn get_burn_proof(&self, proof_hash: &str) -> Option<bool> {
        let conn = self.db.acquire_read_session().await.ok()?;
        let mut rows = conn
            .query("SELECT valid, verified_at FROM burn_proof_cache WHERE burn_proof_hash = ?1", params![proof_hash])
            .await
            .ok()?;
        let row = rows.next().await.ok()??;
        let valid: i64 = row.get(0).ok()?;
        let verified_at: String = row.get(1).ok()?;
        let verified_at: chrono::DateTime<Utc> = verified_at.parse().ok()?;
        if Utc::now() - verified_at > ChronoDuration::hours(CACHE_HORIZON_HOURS) {
            return None;
        }
        Some(valid != 0)
    }

    #[instrument(skip(self))]
    async fn put_burn_proof(&self, proof_hash: &str, valid: bool) {
        let Ok(conn) = self.db.acquire_session().await else { return };
        let now = Utc::now().to_rfc3339();
        let _ = conn
            .execute(
                "INSERT INTO burn_proof_cache (burn_proof_hash, valid, verified_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(burn_proof_hash) DO UPDATE SET valid = excluded.valid, verified_at = excluded.verified_at",
                params![proof_hash, valid as i64, now],
            )
            .await;
    }

    #[instrument(skip(self))]
    async fn get_esg(&self, cache_key: &str) -> Option<EsgScore> {
        let conn = self.db.acquire_read_session().await.ok()?;
        let mut rows = conn
            .query(
                "SELECT transaction_type, score, threshold, verified_at FROM material_esg_cache WHERE cache_key = ?1",
                params![cache_key],
            )
            .await
            .ok()?;
        let row = rows.next().await.ok()??;
        let transaction_type: String = row.get(0).ok()?;
        let score: f64 = row.get(1).ok()?;
        let threshold: f64 = row.get(2).ok()?;
        let verified_at: String = row.get(3).ok()?;
        let verified_at: chrono::DateTime<Utc> = verified_at.parse().ok()?;
        if Utc::now() - verified_at > ChronoDuration::hours(CACHE_HORIZON_HOURS) {
            return None;
        }
        Some(EsgScore { transaction_type, score, threshold })
    }

    #[instrument(skip(self, score))]
    async fn put_esg(&self, cache_key: &str, score: &EsgScore) {
        let Ok(conn) = self.db.acquire_session().await else { return };
        let now = Utc::now().to_rfc3339();
        let _ = conn
            .execute(
                "INSERT INTO material_esg_cache (cache_key, transaction_type, score, threshold, verified_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(cache_key) DO UPDATE SET transaction_type = excluded.transaction_type,
                     score = excluded.score, threshold = excluded.threshold, verified_at = excluded.verified_at",
                params![cache_key, score.transaction_type.as_str(), score.score, score.threshold, now],
            )
            .await;
    }
}
