// [libs/domain/models/src/verifier.rs]
//! Resultados de verificadores externos (ESG, burn-proof). Modelado como
//! un enum etiquetado en lugar de despacho dinamico: un verificador
//! puede responder con un veredicto, rechazar la entrada, o estar
//! simplemente inalcanzable, y cada caso se trata distinto aguas abajo.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EsgScore {
    pub transaction_type: String,
    pub score: f64,
    pub threshold: f64,
}

impl EsgScore {
    pub fn passes(&self) -> bool {
        self.score >= self.threshold
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum VerifierResult<T> {
    Valid(T),
    Invalid { reason: String },
    Unavailable { reason: String },
}

impl<T> VerifierResult<T> {
    pub fn is_valid(&self) -> bool {
        matches!(self, VerifierResult::Valid(_))
    }
}
