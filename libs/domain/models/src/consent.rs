// [libs/domain/models/src/consent.rs]
//! Modelo de consentimiento: politicas otorgadas por un usuario sobre
//! sus activos/facetas, resueltas por especificidad decreciente
//! (grantee > facet > asset > global > default por amistad).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    FriendsOnly,
    Private,
    /// Visible solo al `grantee_user_id` fijado en el scope de la politica.
    Custom,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::FriendsOnly => "friends_only",
            Visibility::Private => "private",
            Visibility::Custom => "custom",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "public" => Some(Visibility::Public),
            "friends_only" => Some(Visibility::FriendsOnly),
            "private" => Some(Visibility::Private),
            "custom" => Some(Visibility::Custom),
            _ => None,
        }
    }
}

/// Ambito sobre el que aplica una fila de `ConsentPolicy`. Cuanto mas
/// campos fijos, mas especifico: `grantee_user_id` > `facet` > `asset_id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ConsentScope {
    pub asset_id: Option<String>,
    pub facet: Option<String>,
    pub grantee_user_id: Option<String>,
}

impl ConsentScope {
    /// Cuenta de dimensiones fijadas; usada como orden de especificidad
    /// cuando varias filas de politica coinciden con una misma consulta.
    pub fn specificity(&self) -> u8 {
        self.asset_id.is_some() as u8 + self.facet.is_some() as u8 + self.grantee_user_id.is_some() as u8
    }
}

/// Etiqueta de ambito persistida junto a la politica; se deriva de
/// `ConsentScope` al construirla pero se guarda explicita porque el
/// dato original tambien la persiste como columna independiente.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConsentScopeKind {
    Global,
    AssetSpecific,
    FacetSpecific,
    GranteeSpecific,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConsentPolicy {
    pub policy_id: String,
    pub owner_user_id: String,
    pub scope_kind: ConsentScopeKind,
    pub scope: ConsentScope,
    pub visibility: Visibility,
    pub policy_version: String,
    pub is_revoked: bool,
    pub revoked_at: Option<DateTime<Utc>>,
    pub revoke_reason: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConsentDecision {
    Allow,
    Deny,
    Escalate,
}
