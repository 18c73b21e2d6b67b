// [libs/domain/policy/src/engine.rs]
//! Composicion final: consentimiento + reglas de region + (para
//! acciones transaccionales) verificadores ESG/burn-proof. Pura: el
//! llamador trae todos los insumos ya resueltos.

use spine_domain_models::ConsentDecision;

use crate::consent::{ConsentCheck, MatchedScope};
use crate::region;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    ViewFacet,
    TransferOwnership,
    Dissolve,
    Reprint,
}

impl ActionKind {
    /// Acciones que deben consultar verificadores externos antes de
    /// poder resolver en `Allow`.
    pub fn is_transactional(&self) -> bool {
        !matches!(self, ActionKind::ViewFacet)
    }
}

/// Resultado binario de un verificador externo, ya colapsado desde
/// `spine_domain_models::VerifierResult<T>` por el llamador:
/// `Some(true)` = valido, `Some(false)` = invalido, `None` = inalcanzable.
pub type VerifierOutcome = Option<bool>;

#[derive(Debug, Clone, PartialEq)]
pub struct PolicyOutcome {
    pub decision: ConsentDecision,
    pub policy_version: String,
    pub reason: String,
}

/// Numero de esquema de composicion de politica embebido en
/// `fingerprint`. `consent_policy_version` values without a
/// recognizable `v<N>` shape (ej. "default", un UUID de politica
/// puntual) caen a este esquema base; solo versiones de consentimiento
/// explicitamente numeradas avanzan el fingerprint.
const BASE_SCHEMA: u32 = 1;

fn schema_number(consent_policy_version: &str) -> u32 {
    consent_policy_version.strip_prefix('v').and_then(|rest| rest.parse::<u32>().ok()).unwrap_or(BASE_SCHEMA)
}

/// Identificador legible de la version de politica aplicada a una
/// decision: `policy_v{n}_{region_code}`. No es un hash -- es la
/// etiqueta que un humano (o un log de auditoria) lee para saber que
/// esquema de consentimiento y que tabla de reglas regionales
/// produjeron la decision.
pub fn fingerprint(consent_policy_version: &str, region_code: &str) -> String {
    format!("policy_v{}_{}", schema_number(consent_policy_version), region_code)
}

pub fn evaluate(
    consent: &ConsentCheck,
    region_code: &str,
    action: ActionKind,
    verifier_outcomes: &[VerifierOutcome],
) -> PolicyOutcome {
    let version = fingerprint(&consent.policy_version, region_code);

    // La regla regional se evalua antes que el veredicto de consentimiento:
    // un embargo o una revision humana obligatoria por region no puede
    // quedar enmascarado por un `Deny` de consentimiento que de otro modo
    // habria cortado la evaluacion primero (ej. una politica global privada
    // denegada a un extrano en una region con revision humana obligatoria
    // debe escalar, no aparecer como un simple deny de consentimiento).
    let is_private = consent.scope == MatchedScope::Owner || matches!(consent.visibility, spine_domain_models::Visibility::Private);
    let region_decision = region::apply(region_code, is_private);
    if region_decision != ConsentDecision::Allow {
        return PolicyOutcome {
            decision: region_decision,
            policy_version: version,
            reason: format!("region_rule:{}", region_code),
        };
    }

    if !consent.allowed {
        return PolicyOutcome { decision: ConsentDecision::Deny, policy_version: version, reason: consent.reason.clone() };
    }

    if action.is_transactional() {
        for outcome in verifier_outcomes {
            match outcome {
                Some(true) => continue,
                Some(false) => {
                    return PolicyOutcome {
                        decision: ConsentDecision::Deny,
                        policy_version: version,
                        reason: "verifier_invalid".to_string(),
                    }
                }
                None => {
                    return PolicyOutcome {
                        decision: ConsentDecision::Escalate,
                        policy_version: version,
                        reason: "verifier_unavailable".to_string(),
                    }
                }
            }
        }
    }

    PolicyOutcome { decision: ConsentDecision::Allow, policy_version: version, reason: consent.reason.clone() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consent::MatchedScope;

    fn allowed_public() -> ConsentCheck {
        ConsentCheck {
            allowed: true,
            visibility: spine_domain_models::Visibility::Public,
            scope: MatchedScope::DefaultPublic,
            policy_version: "v1".to_string(),
            reason: "default_public".to_string(),
        }
    }

    #[test]
    fn denied_consent_short_circuits_before_region() {
        let denied = ConsentCheck { allowed: false, ..allowed_public() };
        let outcome = evaluate(&denied, "EU", ActionKind::ViewFacet, &[]);
        assert_eq!(outcome.decision, ConsentDecision::Deny);
    }

    #[test]
    fn gdpr_region_escalates_private_scope() {
        let private = ConsentCheck {
            visibility: spine_domain_models::Visibility::Private,
            scope: MatchedScope::Owner,
            ..allowed_public()
        };
        let outcome = evaluate(&private, "EU", ActionKind::ViewFacet, &[]);
        assert_eq!(outcome.decision, ConsentDecision::Escalate);
    }

    #[test]
    fn embargoed_region_denies_regardless_of_consent() {
        let outcome = evaluate(&allowed_public(), "KP", ActionKind::ViewFacet, &[]);
        assert_eq!(outcome.decision, ConsentDecision::Deny);
    }

    #[test]
    fn transactional_action_escalates_on_unavailable_verifier() {
        let outcome = evaluate(&allowed_public(), "US-CA", ActionKind::TransferOwnership, &[None]);
        assert_eq!(outcome.decision, ConsentDecision::Escalate);
    }

    #[test]
    fn transactional_action_denies_on_invalid_verifier() {
        let outcome = evaluate(&allowed_public(), "US-CA", ActionKind::TransferOwnership, &[Some(false)]);
        assert_eq!(outcome.decision, ConsentDecision::Deny);
    }

    #[test]
    fn transactional_action_allows_when_all_verifiers_pass() {
        let outcome = evaluate(&allowed_public(), "US-CA", ActionKind::Dissolve, &[Some(true), Some(true)]);
        assert_eq!(outcome.decision, ConsentDecision::Allow);
    }

    #[test]
    fn fingerprint_is_deterministic() {
        let a = fingerprint("v1", "EU");
        let b = fingerprint("v1", "EU");
        assert_eq!(a, b);
    }

    #[test]
    fn fingerprint_matches_documented_scenario_strings() {
        assert_eq!(fingerprint("default", "us-east1"), "policy_v1_us-east1");
        assert_eq!(fingerprint("some-policy-id", "eu-west1"), "policy_v1_eu-west1");
    }

    #[test]
    fn scenario_allowed_scan_in_us_east1() {
        let outcome = evaluate(&allowed_public(), "us-east1", ActionKind::ViewFacet, &[]);
        assert_eq!(outcome.decision, ConsentDecision::Allow);
        assert_eq!(outcome.policy_version, "policy_v1_us-east1");
    }

    #[test]
    fn scenario_private_global_denial_escalates_in_eu_west1() {
        let denied_private = ConsentCheck {
            allowed: false,
            visibility: spine_domain_models::Visibility::Private,
            scope: MatchedScope::Global,
            policy_version: "some-policy-id".to_string(),
            reason: "visibility_private".to_string(),
        };
        let outcome = evaluate(&denied_private, "eu-west1", ActionKind::ViewFacet, &[]);
        assert_eq!(outcome.decision, ConsentDecision::Escalate);
        assert_eq!(outcome.policy_version, "policy_v1_eu-west1");
    }
}
