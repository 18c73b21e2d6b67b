// [libs/domain/models/src/user.rs]
//! Entidad de Usuario. Nunca se elimina; solo se desactiva.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub user_id: String,
    pub handle: String,
    pub display_name: String,
    pub region_code: String,
    /// Puntuacion de confianza del operador, siempre en [0,1].
    pub trust_score: f64,
    pub consent_version: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn clamp_trust_score(raw: f64) -> f64 {
        raw.clamp(0.0, 1.0)
    }
}
