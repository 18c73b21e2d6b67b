// [libs/domain/models/src/provenance.rs]
//! Cadena de provenance: secuencia sin huecos de transferencias de
//! propiedad por activo. Ver spine-infra-db::repositories::provenance
//! para la logica transaccional que preserva el invariante de secuencia.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TransferType {
    Mint,
    Purchase,
    Gift,
    Trade,
    Inheritance,
    Return,
}

impl TransferType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferType::Mint => "mint",
            TransferType::Purchase => "purchase",
            TransferType::Gift => "gift",
            TransferType::Trade => "trade",
            TransferType::Inheritance => "inheritance",
            TransferType::Return => "return",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "mint" => Some(TransferType::Mint),
            "purchase" => Some(TransferType::Purchase),
            "gift" => Some(TransferType::Gift),
            "trade" => Some(TransferType::Trade),
            "inheritance" => Some(TransferType::Inheritance),
            "return" => Some(TransferType::Return),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProvenanceEntry {
    pub provenance_id: String,
    pub asset_id: String,
    /// 1-indexado, sin huecos, asignado dentro de la transaccion de transferencia.
    pub sequence_num: i64,
    pub from_user_id: Option<String>,
    pub to_user_id: String,
    pub transfer_type: TransferType,
    pub price: Option<f64>,
    pub currency: Option<String>,
    pub blockchain_tx_hash: Option<String>,
    pub midnight_proof_hash: Option<String>,
    pub transfer_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChainVerification {
    pub valid: bool,
    pub issues: Vec<String>,
}
