// [libs/infra/ledger/src/cache.rs]
//! Puerto de cache para verificaciones externas. Implementado por
//! `spine-infra-db` (tablas `burn_proof_cache` / `material_esg_cache`
//! con un horizonte de 24h); definido aqui porque es el verificador
//! quien decide cuando consultarlo y cuando escribirlo.

use async_trait::async_trait;
use spine_domain_models::EsgScore;

#[async_trait]
pub trait VerifierCache: Send + Sync {
    async fn get_burn_proof(&self, proof_hash: &str) -> Option<bool>;
    async fn put_burn_proof(&self, proof_hash: &str, valid: bool);

    async fn get_esg(&self, cache_key: &str) -> Option<EsgScore>;
    async fn put_esg(&self, cache_key: &str, score: &EsgScore);
}

/// Cache nulo: siempre falla la consulta y descarta la escritura. Util
/// para arranques sin persistencia de verificadores (pruebas, dev).
pub struct NoopVerifierCache;

#[async_trait]
impl VerifierCache for NoopVerifierCache {
    async fn get_burn_proof(&self, _proof_hash: &str) -> Option<bool> {
        None
    }
    async fn put_burn_proof(&self, _proof_hash: &str, _valid: bool) {}

    async fn get_esg(&self, _cache_key: &str) -> Option<EsgScore> {
        None
    }
    async fn put_esg(&self, _cache_key: &str, _score: &EsgScore) {}
}
