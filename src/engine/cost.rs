// ==========================================
// SNT Planner - Cost Model Engine
// ==========================================
// Prices scenario intervention assignments and optimizes the package
// selection under a budget constraint.
// Input: scenario assignments + population data + coverage targets
// Output: cost items (wholesale snapshot), summary, optimized mix
// Rule: stateless; cost items are never partially updated.
// ==========================================

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::EngineSettings;
use crate::domain::scenario::{
    Scenario, ScenarioComparison, ScenarioComparisonRow, ScenarioCostItem, ScenarioCostSummary,
};
use crate::domain::types::{CostRecurrence, InterventionCode};

// ==========================================
// Inputs
// ==========================================

/// Population record for one admin unit, supplied by the data store
/// collaborator.
#[derive(Debug, Clone)]
pub struct PopulationRecord {
    pub admin_unit_code: String,
    pub admin_unit_name: String,
    pub population: u64,
}

/// Coverage targets in percent, keyed by (admin_unit_code,
/// intervention). Pairs without a target cost at full population.
pub type CoverageTargets = BTreeMap<(String, InterventionCode), f64>;

/// Result of a budget optimization run.
#[derive(Debug, Clone)]
pub struct OptimizationOutcome {
    /// Selected intervention mix, admin_unit_code -> codes.
    pub interventions: BTreeMap<String, Vec<InterventionCode>>,
    /// Summed cost of the selection; never exceeds the budget.
    pub total_cost: f64,
    pub candidates_considered: usize,
    pub candidates_admitted: usize,
}

// ==========================================
// CostModel
// ==========================================
pub struct CostModel {
    settings: Arc<EngineSettings>,
}

impl CostModel {
    pub fn new(settings: Arc<EngineSettings>) -> Self {
        Self { settings }
    }

    // ==========================================
    // Pricing
    // ==========================================

    /// Price every (unit, intervention) assignment of a scenario.
    ///
    /// quantity = population * coverage_target/100 when a target is
    /// set, else raw population. Item total = unit_cost * quantity *
    /// (years when recurring, 1 otherwise).
    pub fn price(
        &self,
        scenario: &Scenario,
        population_data: &[PopulationRecord],
        coverage_targets: &CoverageTargets,
        years: u32,
    ) -> (Vec<ScenarioCostItem>, ScenarioCostSummary) {
        let pop_map: BTreeMap<&str, &PopulationRecord> = population_data
            .iter()
            .map(|p| (p.admin_unit_code.as_str(), p))
            .collect();

        let mut items = Vec::new();
        let mut total_cost = 0.0;
        let mut total_population = 0u64;
        let mut cost_by_intervention: BTreeMap<InterventionCode, f64> = BTreeMap::new();
        let mut cost_by_unit: BTreeMap<String, f64> = BTreeMap::new();

        for (unit_code, codes) in &scenario.interventions {
            let record = pop_map.get(unit_code.as_str());
            if record.is_none() {
                warn!(unit = %unit_code, "no population record for unit, costing at zero");
            }
            let population = record.map(|r| r.population).unwrap_or(0);
            let unit_name = record
                .map(|r| r.admin_unit_name.clone())
                .unwrap_or_else(|| unit_code.clone());
            total_population += population;

            let mut unit_total = 0.0;
            for code in codes {
                let item = self.price_item(
                    &scenario.scenario_id,
                    unit_code,
                    &unit_name,
                    *code,
                    population,
                    coverage_targets
                        .get(&(unit_code.clone(), *code))
                        .copied(),
                    years,
                );
                total_cost += item.total_cost;
                unit_total += item.total_cost;
                *cost_by_intervention.entry(*code).or_insert(0.0) += item.total_cost;
                items.push(item);
            }
            cost_by_unit.insert(unit_code.clone(), unit_total);
        }

        debug!(
            scenario_id = %scenario.scenario_id,
            items = items.len(),
            total_cost,
            "scenario priced"
        );

        let summary = ScenarioCostSummary {
            scenario_id: scenario.scenario_id.clone(),
            scenario_name: scenario.name.clone(),
            total_cost,
            cost_by_intervention,
            cost_by_unit,
            cost_per_capita: if total_population > 0 {
                Some(total_cost / total_population as f64)
            } else {
                None
            },
            total_population,
        };

        (items, summary)
    }

    fn price_item(
        &self,
        scenario_id: &str,
        unit_code: &str,
        unit_name: &str,
        code: InterventionCode,
        population: u64,
        coverage_target: Option<f64>,
        years: u32,
    ) -> ScenarioCostItem {
        // Interventions missing from the catalog cost nothing; the
        // default catalog covers all eight.
        let (unit_cost, cost_category, recurrence) = match self.settings.cost_profile(code) {
            Some(p) => (p.unit_cost, p.cost_category.clone(), p.recurrence),
            None => {
                warn!(intervention = %code, "no cost profile, costing at zero");
                (0.0, "uncatalogued".to_string(), CostRecurrence::OneTime)
            }
        };

        let quantity = match coverage_target {
            Some(target) => population as f64 * target / 100.0,
            None => population as f64,
        };
        let year_factor = match recurrence {
            CostRecurrence::Recurring => years as f64,
            CostRecurrence::OneTime => 1.0,
        };

        ScenarioCostItem {
            scenario_id: scenario_id.to_string(),
            admin_unit_name: unit_name.to_string(),
            admin_unit_code: unit_code.to_string(),
            intervention_code: code,
            unit_cost,
            quantity,
            total_cost: unit_cost * quantity * year_factor,
            cost_category,
            recurrence,
            years,
        }
    }

    // ==========================================
    // Budget optimization (greedy by ICER)
    // ==========================================

    /// Greedy approximate selection under a budget constraint.
    ///
    /// Candidates are every (unit, intervention) pair of the scenario,
    /// ranked by ICER = cost / proxy cases averted ascending, ties
    /// broken by higher population covered. Pairs are admitted in that
    /// order while cumulative cost stays within budget; items are
    /// indivisible. An approximation, not an exact knapsack optimum.
    pub fn optimize(
        &self,
        scenario: &Scenario,
        budget_constraint: f64,
        population_data: &[PopulationRecord],
        coverage_targets: &CoverageTargets,
        years: u32,
    ) -> OptimizationOutcome {
        struct Candidate {
            unit_code: String,
            code: InterventionCode,
            cost: f64,
            population: u64,
            icer: f64,
        }

        let pop_map: BTreeMap<&str, &PopulationRecord> = population_data
            .iter()
            .map(|p| (p.admin_unit_code.as_str(), p))
            .collect();

        let mut candidates = Vec::new();
        for (unit_code, codes) in &scenario.interventions {
            let record = pop_map.get(unit_code.as_str());
            let population = record.map(|r| r.population).unwrap_or(0);
            let unit_name = record
                .map(|r| r.admin_unit_name.as_str())
                .unwrap_or(unit_code.as_str());

            for code in codes {
                let item = self.price_item(
                    &scenario.scenario_id,
                    unit_code,
                    unit_name,
                    *code,
                    population,
                    coverage_targets
                        .get(&(unit_code.clone(), *code))
                        .copied(),
                    years,
                );
                let effect = self.proxy_effect(*code, population);
                let icer = if effect > 0.0 {
                    item.total_cost / effect
                } else {
                    f64::INFINITY
                };
                candidates.push(Candidate {
                    unit_code: unit_code.clone(),
                    code: *code,
                    cost: item.total_cost,
                    population,
                    icer,
                });
            }
        }

        // Most cost-effective first; ties go to the pair covering more
        // people.
        candidates.sort_by(|a, b| {
            a.icer
                .partial_cmp(&b.icer)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(b.population.cmp(&a.population))
        });

        let considered = candidates.len();
        let mut interventions: BTreeMap<String, Vec<InterventionCode>> = BTreeMap::new();
        let mut running_cost = 0.0;
        let mut admitted = 0;

        for c in candidates {
            if running_cost + c.cost <= budget_constraint {
                interventions.entry(c.unit_code).or_default().push(c.code);
                running_cost += c.cost;
                admitted += 1;
            }
        }

        debug!(
            scenario_id = %scenario.scenario_id,
            budget = budget_constraint,
            admitted,
            considered,
            total_cost = running_cost,
            "budget optimization finished"
        );

        OptimizationOutcome {
            interventions,
            total_cost: running_cost,
            candidates_considered: considered,
            candidates_admitted: admitted,
        }
    }

    /// Proxy expected cases averted, used only to rank candidates.
    fn proxy_effect(&self, code: InterventionCode, population: u64) -> f64 {
        let rate = self
            .settings
            .cost_profile(code)
            .map(|p| p.effect_rate)
            .unwrap_or(0.0);
        population as f64 * rate
    }

    // ==========================================
    // Scenario comparison
    // ==========================================

    /// Comparison table across a project's scenarios. Scenarios with
    /// no computed total_cost are listed but excluded from cost
    /// ranking.
    pub fn compare(&self, project_id: &str, scenarios: &[Scenario]) -> ScenarioComparison {
        let mut ranked: Vec<(usize, f64)> = scenarios
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.total_cost.map(|c| (i, c)))
            .collect();
        ranked.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

        let mut rank_of: BTreeMap<usize, usize> = BTreeMap::new();
        for (rank, (idx, _)) in ranked.iter().enumerate() {
            rank_of.insert(*idx, rank + 1);
        }

        let rows = scenarios
            .iter()
            .enumerate()
            .map(|(i, s)| ScenarioComparisonRow {
                scenario_id: s.scenario_id.clone(),
                name: s.name.clone(),
                scenario_type: s.scenario_type,
                is_selected: s.is_selected,
                total_cost: s.total_cost,
                population_covered: s.population_covered,
                cases_averted: s.estimated_cases_averted,
                deaths_averted: s.estimated_deaths_averted,
                cost_per_case_averted: match (s.total_cost, s.estimated_cases_averted) {
                    (Some(cost), Some(averted)) if averted > 0.0 => Some(cost / averted),
                    _ => None,
                },
                cost_rank: rank_of.get(&i).copied(),
            })
            .collect();

        ScenarioComparison {
            project_id: project_id.to_string(),
            scenarios: rows,
        }
    }
}
