// [libs/domain/lifecycle/src/esg_impact.rs]
//! Tabla estatica de impacto ESG por transicion. Solo DISSOLVE->REPRINT
//! tiene impacto no-cero: es la unica transicion que efectivamente
//! recicla material.

use spine_domain_models::LifecycleState;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EsgImpact {
    pub esg_delta: f64,
    pub carbon_saved_kg: f64,
    pub water_saved_liters: f64,
}

const ZERO_IMPACT: EsgImpact = EsgImpact { esg_delta: 0.0, carbon_saved_kg: 0.0, water_saved_liters: 0.0 };

const DISSOLVE_TO_REPRINT: EsgImpact = EsgImpact { esg_delta: 0.3, carbon_saved_kg: 8.0, water_saved_liters: 200.0 };

pub fn impact_for(from: LifecycleState, to: LifecycleState) -> EsgImpact {
    match (from, to) {
        (LifecycleState::Dissolve, LifecycleState::Reprint) => DISSOLVE_TO_REPRINT,
        _ => ZERO_IMPACT,
    }
}
