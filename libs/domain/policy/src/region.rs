// [libs/domain/policy/src/region.rs]
//! Reglas de region cargadas una sola vez en arranque, como tablas
//! estaticas de Rust en lugar de documentos leidos del disco: no hay
//! mutacion posterior, asi que no hace falta ni IO ni un lock.

use spine_domain_models::ConsentDecision;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionRule {
    pub region_code: &'static str,
    pub embargo: bool,
    pub requires_human_review: bool,
    pub gdpr_applies: bool,
    pub ccpa_applies: bool,
}

/// Tabla estatica de reglas por region: cuatro flags por region.
pub static REGION_RULES: &[RegionRule] = &[
    RegionRule { region_code: "US-CA", embargo: false, requires_human_review: false, gdpr_applies: false, ccpa_applies: true },
    RegionRule { region_code: "us-east1", embargo: false, requires_human_review: false, gdpr_applies: false, ccpa_applies: false },
    RegionRule { region_code: "eu-west1", embargo: false, requires_human_review: false, gdpr_applies: true, ccpa_applies: false },
    RegionRule { region_code: "EU", embargo: false, requires_human_review: false, gdpr_applies: true, ccpa_applies: false },
    RegionRule { region_code: "UK", embargo: false, requires_human_review: false, gdpr_applies: true, ccpa_applies: false },
    RegionRule { region_code: "KP", embargo: true, requires_human_review: true, gdpr_applies: false, ccpa_applies: false },
    RegionRule { region_code: "IR", embargo: true, requires_human_review: true, gdpr_applies: false, ccpa_applies: false },
    RegionRule { region_code: "SY", embargo: true, requires_human_review: true, gdpr_applies: false, ccpa_applies: false },
    RegionRule { region_code: "RU", embargo: false, requires_human_review: true, gdpr_applies: false, ccpa_applies: false },
];

pub fn lookup(region_code: &str) -> Option<&'static RegionRule> {
    REGION_RULES.iter().find(|r| r.region_code == region_code)
}

/// Aplica la regla de region sobre un ambito de visibilidad ya resuelto
/// por consentimiento. Un codigo de region desconocido cae al default,
/// que escala el ambito privado (paridad con el comportamiento del
/// consentimiento base, que tambien es conservador ante lo desconocido).
pub fn apply(region_code: &str, visibility_is_private: bool) -> ConsentDecision {
    match lookup(region_code) {
        Some(rule) if rule.embargo => ConsentDecision::Deny,
        Some(rule) if rule.requires_human_review => ConsentDecision::Escalate,
        Some(rule) if (rule.gdpr_applies || rule.ccpa_applies) && visibility_is_private => {
            ConsentDecision::Escalate
        }
        Some(_) => ConsentDecision::Allow,
        None if visibility_is_private => ConsentDecision::Escalate,
        None => ConsentDecision::Allow,
    }
}
