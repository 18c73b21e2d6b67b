// [libs/infra/ledger/src/anchor.rs]
//! Clientes de ancla para las dos cadenas externas (Cardano, Midnight).
//! Cada envio tiene su propio presupuesto de reintento (backoff
//! exponencial con jitter, maximo 5 intentos); un 4xx del adaptador se
//! trata como rechazo permanente y nunca se reintenta. El llamador
//! (orquestador) dispara ambos envios en paralelo y decide si el
//! resultado es `Anchored` o `Partial`.

use std::time::Duration;

use rand::Rng;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{instrument, warn};

use crate::errors::LedgerError;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(120);

#[derive(Debug, Clone, Serialize)]
pub struct AnchorSubmission<'a> {
    pub subject_id: &'a str,
    pub root_hash: &'a str,
}

#[derive(Debug, Deserialize)]
struct AnchorSubmissionResponse {
    tx_hash: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerName {
    Cardano,
    Midnight,
}

impl LedgerName {
    fn as_str(&self) -> &'static str {
        match self {
            LedgerName::Cardano => "cardano",
            LedgerName::Midnight => "midnight",
        }
    }
}

/// Cliente de envio de ancla contra un unico ledger. Sin estado
/// compartido entre envios: cada llamada a `submit` gestiona su propio
/// reintento de principio a fin.
#[derive(Clone)]
pub struct AnchorClient {
    name: LedgerName,
    endpoint: String,
    http: Client,
    max_attempts: u32,
    base_delay: Duration,
}

impl AnchorClient {
    pub fn new(name: LedgerName, endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            name,
            endpoint: endpoint.into(),
            http: Client::builder().timeout(timeout).build().expect("reqwest client build must not fail"),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }

    pub fn cardano(endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self::new(LedgerName::Cardano, endpoint, timeout)
    }

    pub fn midnight(endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self::new(LedgerName::Midnight, endpoint, timeout)
    }

    /// Override del presupuesto de reintento; usado por pruebas para no
    /// esperar minutos de backoff real.
    pub fn with_retry_budget(mut self, max_attempts: u32, base_delay: Duration) -> Self {
        self.max_attempts = max_attempts;
        self.base_delay = base_delay;
        self
    }

    #[instrument(skip(self), fields(ledger = self.name.as_str()))]
    pub async fn submit(&self, submission: &AnchorSubmission<'_>) -> Result<String, LedgerError> {
        let url = format!("{}/v1/anchor", self.endpoint.trim_end_matches('/'));
        let mut last_err = LedgerError::Unreachable(format!("{}: no attempt made", self.name.as_str()));

        for attempt in 0..self.max_attempts {
            let response = self.http.post(&url).json(submission).send().await;

            match response {
                Ok(resp) if resp.status().is_success() => {
                    let decoded: AnchorSubmissionResponse = resp
                        .json()
                        .await
                        .map_err(|e| LedgerError::DecodeError(e.to_string()))?;
                    return Ok(decoded.tx_hash);
                }
                Ok(resp) if resp.status().is_client_error() => {
                    return Err(LedgerError::PermanentRejection(format!(
                        "{} rejected anchor submission with {}",
                        self.name.as_str(),
                        resp.status()
                    )));
                }
                Ok(resp) => {
                    last_err = LedgerError::Unreachable(format!("{} returned {}", self.name.as_str(), resp.status()));
                }
                Err(e) if e.status().map(StatusCode::is_client_error).unwrap_or(false) => {
                    return Err(LedgerError::PermanentRejection(e.to_string()));
                }
                Err(e) => {
                    last_err = LedgerError::Unreachable(e.to_string());
                }
            }

            if attempt + 1 < self.max_attempts {
                let delay = backoff_with_jitter(self.base_delay, attempt);
                warn!(ledger = self.name.as_str(), attempt, delay_ms = delay.as_millis() as u64, "anchor submission retrying");
                tokio::time::sleep(delay).await;
            }
        }

        Err(last_err)
    }
}

/// `base * 2^attempt`, con jitter uniforme en [0, base) superpuesto
/// para evitar que reintentos simultaneos converjan en el mismo
/// instante (thundering herd).
fn backoff_with_jitter(base: Duration, attempt: u32) -> Duration {
    let exponent = base.saturating_mul(1u32.checked_shl(attempt).unwrap_or(u32::MAX));
    let jitter_ms = rand::thread_rng().gen_range(0..=base.as_millis().max(1) as u64);
    exponent.saturating_add(Duration::from_millis(jitter_ms))
}

/// `H(cardano_tx ‖ midnight_tx ‖ scan_id)`, el hash raiz cruzado que
/// enlaza ambas cadenas a un mismo sujeto de auditoria.
pub fn cross_chain_root(cardano_tx: &str, midnight_tx: &str, subject_id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(cardano_tx.as_bytes());
    hasher.update(b"|");
    hasher.update(midnight_tx.as_bytes());
    hasher.update(b"|");
    hasher.update(subject_id.as_bytes());
    hex::encode(hasher.finalize())
}

#[derive(Debug, Clone, Default)]
pub struct DualAnchorOutcome {
    pub cardano_tx_hash: Option<String>,
    pub midnight_tx_hash: Option<String>,
    pub cardano_error: Option<String>,
    pub midnight_error: Option<String>,
}

impl DualAnchorOutcome {
    pub fn is_fully_anchored(&self) -> bool {
        self.cardano_tx_hash.is_some() && self.midnight_tx_hash.is_some()
    }

    pub fn is_partial(&self) -> bool {
        self.cardano_tx_hash.is_some() ^ self.midnight_tx_hash.is_some()
    }
}

/// Envia a ambos ledgers en paralelo (fan-out/fan-in); ninguno de los
/// dos bloquea al otro, y un fallo de uno no cancela al otro.
#[instrument(skip(cardano, midnight, submission))]
pub async fn anchor_both(cardano: &AnchorClient, midnight: &AnchorClient, submission: &AnchorSubmission<'_>) -> DualAnchorOutcome {
    let (cardano_result, midnight_result) = tokio::join!(cardano.submit(submission), midnight.submit(submission));

    let mut outcome = DualAnchorOutcome::default();
    match cardano_result {
        Ok(tx) => outcome.cardano_tx_hash = Some(tx),
        Err(e) => outcome.cardano_error = Some(e.to_string()),
    }
    match midnight_result {
        Ok(tx) => outcome.midnight_tx_hash = Some(tx),
        Err(e) => outcome.midnight_error = Some(e.to_string()),
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cross_chain_root_is_deterministic() {
        let a = cross_chain_root("c1", "m1", "scan-1");
        let b = cross_chain_root("c1", "m1", "scan-1");
        assert_eq!(a, b);
        assert_ne!(a, cross_chain_root("c2", "m1", "scan-1"));
    }

    #[test]
    fn dual_anchor_outcome_partial_detection() {
        let partial = DualAnchorOutcome { cardano_tx_hash: Some("tx".into()), midnight_tx_hash: None, ..Default::default() };
        assert!(partial.is_partial());
        assert!(!partial.is_fully_anchored());

        let full = DualAnchorOutcome { cardano_tx_hash: Some("tx1".into()), midnight_tx_hash: Some("tx2".into()), ..Default::default() };
        assert!(full.is_fully_anchored());
        assert!(!full.is_partial());
    }

    #[test]
    fn backoff_grows_with_attempt_and_stays_above_base_exponent() {
        let base = Duration::from_millis(10);
        let first = backoff_with_jitter(base, 0);
        let second = backoff_with_jitter(base, 2);
        assert!(first.as_millis() >= 10);
        assert!(second.as_millis() >= 40);
    }
}
