// [libs/domain/models/src/cube.rs]
//! El "cubo": documento compuesto en tiempo real que agrega el estado
//! visible de un activo para un solicitante dado, cara por cara.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Las siete facetas de un Digital Product Passport. El orden no importa
/// para la resolucion de consentimiento; se fija aqui solo para serializacion
/// estable.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Facet {
    MaterialComposition,
    OwnershipHistory,
    CareInstructions,
    SustainabilityMetrics,
    AuthenticityProof,
    MolecularData,
    RepairLog,
}

impl Facet {
    pub const ALL: [Facet; 7] = [
        Facet::MaterialComposition,
        Facet::OwnershipHistory,
        Facet::CareInstructions,
        Facet::SustainabilityMetrics,
        Facet::AuthenticityProof,
        Facet::MolecularData,
        Facet::RepairLog,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Facet::MaterialComposition => "material_composition",
            Facet::OwnershipHistory => "ownership_history",
            Facet::CareInstructions => "care_instructions",
            Facet::SustainabilityMetrics => "sustainability_metrics",
            Facet::AuthenticityProof => "authenticity_proof",
            Facet::MolecularData => "molecular_data",
            Facet::RepairLog => "repair_log",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Facet::ALL.into_iter().find(|f| f.as_str() == raw)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FaceState {
    Visible,
    Redacted,
    Escalated,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CubeDocument {
    pub asset_id: String,
    pub requested_by: Option<String>,
    /// Una entrada por faceta presente en el activo; ausentes si el
    /// activo nunca publico esa faceta.
    pub faces: BTreeMap<Facet, FaceState>,
    pub payload: serde_json::Value,
    pub generated_at: DateTime<Utc>,
}
