// ==========================================
// SNT Planner - Configuration Layer
// ==========================================
// Engine parameters: cost catalog, efficacy catalog, DALY weights,
// uncertainty envelope, plan policy. All overridable at construction;
// defaults follow WHO-aligned planning assumptions.
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::types::{CostRecurrence, InterventionCode};

// ==========================================
// CostProfile - per-intervention pricing
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostProfile {
    /// USD per person covered (per year when recurring).
    pub unit_cost: f64,
    pub cost_category: String,
    pub recurrence: CostRecurrence,
    /// Proxy cases averted per person covered, used only to rank
    /// candidates during budget optimization.
    pub effect_rate: f64,
}

// ==========================================
// EfficacyProfile - per-intervention impact coefficients
// ==========================================
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EfficacyProfile {
    /// Proportional reduction in cases at full coverage, 0..=1.
    pub cases_reduction: f64,
    /// Proportional reduction in deaths at full coverage, 0..=1.
    pub deaths_reduction: f64,
}

// ==========================================
// PlanPolicy - eligibility enforcement at plan creation
// ==========================================
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PlanPolicy {
    /// When true, creating a plan for an intervention the decision
    /// engine marks ineligible is rejected with the engine's reasons.
    pub enforce_eligibility: bool,
}

impl Default for PlanPolicy {
    fn default() -> Self {
        Self {
            enforce_eligibility: true,
        }
    }
}

// ==========================================
// EngineSettings
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSettings {
    pub cost_catalog: BTreeMap<InterventionCode, CostProfile>,
    pub efficacy_catalog: BTreeMap<InterventionCode, EfficacyProfile>,
    /// DALYs per death averted.
    pub daly_per_death: f64,
    /// DALYs per case averted.
    pub daly_per_case: f64,
    /// Symmetric multiplicative uncertainty envelope, e.g. 0.2 = +/-20%.
    pub uncertainty_envelope: f64,
    pub plan_policy: PlanPolicy,
}

impl EngineSettings {
    pub fn cost_profile(&self, code: InterventionCode) -> Option<&CostProfile> {
        self.cost_catalog.get(&code)
    }

    pub fn efficacy(&self, code: InterventionCode) -> Option<EfficacyProfile> {
        self.efficacy_catalog.get(&code).copied()
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        let mut cost_catalog = BTreeMap::new();
        let mut put = |code: InterventionCode,
                       unit_cost: f64,
                       cost_category: &str,
                       recurrence: CostRecurrence,
                       effect_rate: f64| {
            cost_catalog.insert(
                code,
                CostProfile {
                    unit_cost,
                    cost_category: cost_category.to_string(),
                    recurrence,
                    effect_rate,
                },
            );
        };

        // Default unit costs (USD per person covered), overridable per
        // country program.
        put(InterventionCode::Itn, 2.00, "vector_control", CostRecurrence::Recurring, 0.05);
        put(InterventionCode::Irs, 1.90, "vector_control", CostRecurrence::Recurring, 0.04);
        put(InterventionCode::Smc, 1.05, "chemoprevention", CostRecurrence::Recurring, 0.06);
        put(InterventionCode::Pmc, 0.45, "chemoprevention", CostRecurrence::Recurring, 0.015);
        put(InterventionCode::Iptp, 0.65, "chemoprevention", CostRecurrence::Recurring, 0.01);
        put(InterventionCode::Vaccine, 4.20, "immunization", CostRecurrence::OneTime, 0.02);
        put(InterventionCode::Cm, 0.85, "case_management", CostRecurrence::Recurring, 0.03);
        put(InterventionCode::Lsm, 0.40, "vector_control", CostRecurrence::Recurring, 0.005);

        let mut efficacy_catalog = BTreeMap::new();
        let mut eff = |code: InterventionCode, cases: f64, deaths: f64| {
            efficacy_catalog.insert(
                code,
                EfficacyProfile {
                    cases_reduction: cases,
                    deaths_reduction: deaths,
                },
            );
        };

        eff(InterventionCode::Itn, 0.50, 0.55);
        eff(InterventionCode::Irs, 0.45, 0.50);
        eff(InterventionCode::Smc, 0.75, 0.75);
        eff(InterventionCode::Iptp, 0.10, 0.15);
        eff(InterventionCode::Vaccine, 0.40, 0.45);
        eff(InterventionCode::Cm, 0.20, 0.60);
        eff(InterventionCode::Pmc, 0.30, 0.35);
        eff(InterventionCode::Lsm, 0.10, 0.08);

        Self {
            cost_catalog,
            efficacy_catalog,
            daly_per_death: 30.0,
            daly_per_case: 0.02,
            uncertainty_envelope: 0.2,
            plan_policy: PlanPolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalogs_cover_all_interventions() {
        let settings = EngineSettings::default();
        for code in InterventionCode::ALL {
            assert!(settings.cost_profile(code).is_some(), "no cost for {}", code);
            assert!(settings.efficacy(code).is_some(), "no efficacy for {}", code);
        }
    }

    #[test]
    fn test_efficacy_coefficients_in_unit_interval() {
        let settings = EngineSettings::default();
        for (_, e) in &settings.efficacy_catalog {
            assert!((0.0..=1.0).contains(&e.cases_reduction));
            assert!((0.0..=1.0).contains(&e.deaths_reduction));
        }
    }

    #[test]
    fn test_plan_policy_defaults_to_enforcement() {
        assert!(PlanPolicy::default().enforce_eligibility);
    }
}
