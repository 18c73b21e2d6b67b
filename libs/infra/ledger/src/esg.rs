// [libs/infra/ledger/src/esg.rs]
//! Verificador de ESG contra el oraculo Cardano: cuatro umbrales fijos
//! por tipo de transaccion, combinados por maximo con el minimo
//! configurado por el agente que solicita la accion.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use spine_domain_models::{EsgScore, VerifierResult};
use tracing::{instrument, warn};

use crate::cache::VerifierCache;

/// Umbrales por tipo de transaccion; identicos al original python.
pub fn threshold_for(transaction_type: &str) -> f64 {
    match transaction_type {
        "rental" => 0.5,
        "resale" => 0.6,
        "dissolve" => 0.4,
        "reprint" => 0.7,
        _ => 0.5,
    }
}

/// El umbral efectivo es el mayor entre la tabla estatica y el minimo
/// configurado por el agente solicitante, nunca el menor: un agente no
/// puede relajar el piso de la plataforma, solo endurecerlo.
pub fn effective_threshold(transaction_type: &str, agent_minimum: Option<f64>) -> f64 {
    let table_threshold = threshold_for(transaction_type);
    match agent_minimum {
        Some(min) => table_threshold.max(min),
        None => table_threshold,
    }
}

#[derive(Debug, Deserialize)]
struct EsgRpcResponse {
    score: f64,
}

pub struct EsgVerifier {
    cardano_node_url: String,
    http: Client,
    cache: Arc<dyn VerifierCache>,
    require_ledger: bool,
    allow_stub_fallback: bool,
}

impl EsgVerifier {
    pub fn new(
        cardano_node_url: impl Into<String>,
        timeout: Duration,
        cache: Arc<dyn VerifierCache>,
        require_ledger: bool,
        allow_stub_fallback: bool,
    ) -> Self {
        Self {
            cardano_node_url: cardano_node_url.into(),
            http: Client::builder().timeout(timeout).build().expect("reqwest client build must not fail"),
            cache,
            require_ledger,
            allow_stub_fallback,
        }
    }

    #[instrument(skip(self))]
    pub async fn verify(&self, asset_id: &str, transaction_type: &str, agent_minimum: Option<f64>) -> VerifierResult<EsgScore> {
        let threshold = effective_threshold(transaction_type, agent_minimum);
        let cache_key = format!("{asset_id}:{transaction_type}");
        let url = format!("{}/v1/esg-score/{asset_id}", self.cardano_node_url.trim_end_matches('/'));

        match self.http.get(&url).send().await {
            Ok(resp) if resp.status().is_success() => match resp.json::<EsgRpcResponse>().await {
                Ok(decoded) => {
                    let score = EsgScore { transaction_type: transaction_type.to_string(), score: decoded.score, threshold };
                    self.cache.put_esg(&cache_key, &score).await;
                    if score.passes() {
                        VerifierResult::Valid(score)
                    } else {
                        VerifierResult::Invalid { reason: format!("esg_score_below_threshold:{}", score.score) }
                    }
                }
                Err(e) => VerifierResult::Invalid { reason: format!("malformed_response:{e}") },
            },
            Ok(resp) => VerifierResult::Invalid { reason: format!("oracle_status:{}", resp.status()) },
            Err(e) => {
                warn!(error = %e, "cardano oracle unavailable, consulting cache");
                self.fall_back(&cache_key, transaction_type, threshold).await
            }
        }
    }

    async fn fall_back(&self, cache_key: &str, transaction_type: &str, threshold: f64) -> VerifierResult<EsgScore> {
        if let Some(cached) = self.cache.get_esg(cache_key).await {
            return if cached.passes() {
                VerifierResult::Valid(cached)
            } else {
                VerifierResult::Invalid { reason: format!("cached_below_threshold:{}", cached.score) }
            };
        }

        if self.require_ledger {
            return VerifierResult::Unavailable { reason: "ledger_unavailable".to_string() };
        }

        if self.allow_stub_fallback {
            // Stub: asume el umbral exacto, ni mas ni menos -- nunca mejora
            // la probabilidad de pasar respecto a la verificacion real.
            let stub_score = EsgScore { transaction_type: transaction_type.to_string(), score: threshold, threshold };
            return VerifierResult::Valid(stub_score);
        }

        VerifierResult::Unavailable { reason: "ledger_unavailable".to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_match_static_table() {
        assert_eq!(threshold_for("rental"), 0.5);
        assert_eq!(threshold_for("resale"), 0.6);
        assert_eq!(threshold_for("dissolve"), 0.4);
        assert_eq!(threshold_for("reprint"), 0.7);
        assert_eq!(threshold_for("unknown"), 0.5);
    }

    #[test]
    fn effective_threshold_takes_the_max() {
        assert_eq!(effective_threshold("dissolve", Some(0.9)), 0.9);
        assert_eq!(effective_threshold("dissolve", Some(0.1)), 0.4);
        assert_eq!(effective_threshold("dissolve", None), 0.4);
    }
}
