// ==========================================
// SNT Planner - Scenario API
// ==========================================
// Responsibility: scenario lifecycle, costing, budget optimization and
// comparison. Coverage targets for costing come from the project's
// saved intervention plans; population comes from the loaded admin
// units.
// ==========================================

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::api::error::{ApiError, ApiResult};
use crate::config::EngineSettings;
use crate::domain::scenario::{
    Scenario, ScenarioComparison, ScenarioCostItem, ScenarioCostSummary, ScenarioCreate,
    ScenarioUpdate,
};
use crate::domain::forecast::ForecastResult;
use crate::engine::{CostModel, CoverageTargets, PopulationRecord};
use crate::store::ProjectStore;

/// Scenario with its dependent records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioDetail {
    pub scenario: Scenario,
    pub cost_items: Vec<ScenarioCostItem>,
    pub forecasts: Vec<ForecastResult>,
}

/// Result of a budget optimization run: the updated scenario plus
/// selection statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizedScenario {
    pub scenario: Scenario,
    pub budget_constraint: f64,
    pub candidates_considered: usize,
    pub candidates_admitted: usize,
}

pub struct ScenarioApi {
    store: Arc<ProjectStore>,
    cost_model: CostModel,
}

impl ScenarioApi {
    pub fn new(store: Arc<ProjectStore>, settings: Arc<EngineSettings>) -> Self {
        Self {
            store,
            cost_model: CostModel::new(settings),
        }
    }

    // ==========================================
    // Lifecycle
    // ==========================================

    pub fn create(&self, project_id: &str, create: ScenarioCreate) -> ApiResult<Scenario> {
        if create.interventions.is_empty() {
            return Err(ApiError::InvalidInput(
                "scenario has no intervention assignments".to_string(),
            ));
        }
        let scenario = Scenario {
            scenario_id: Uuid::new_v4().to_string(),
            project_id: project_id.to_string(),
            name: create.name,
            description: create.description,
            scenario_type: create.scenario_type,
            interventions: create.interventions,
            is_selected: false,
            total_cost: None,
            population_covered: None,
            estimated_cases_averted: None,
            estimated_deaths_averted: None,
            created_at: Utc::now().naive_utc(),
        };
        self.store.save_scenario(scenario.clone())?;
        info!(project_id, scenario_id = %scenario.scenario_id, "scenario created");
        Ok(scenario)
    }

    pub fn list(&self, project_id: &str) -> ApiResult<Vec<Scenario>> {
        Ok(self.store.list_scenarios(project_id)?)
    }

    pub fn get_detail(&self, project_id: &str, scenario_id: &str) -> ApiResult<ScenarioDetail> {
        let scenario = self.store.get_scenario(project_id, scenario_id)?;
        let cost_items = self.store.cost_items(project_id, scenario_id)?;
        let forecasts = self.store.forecasts_for_scenario(project_id, scenario_id)?;
        Ok(ScenarioDetail {
            scenario,
            cost_items,
            forecasts,
        })
    }

    /// Partial update. Changing the intervention assignments drops the
    /// derived cost fields; they no longer describe the scenario.
    pub fn update(
        &self,
        project_id: &str,
        scenario_id: &str,
        update: ScenarioUpdate,
    ) -> ApiResult<Scenario> {
        let mut scenario = self.store.get_scenario(project_id, scenario_id)?;
        if let Some(name) = update.name {
            scenario.name = name;
        }
        if let Some(description) = update.description {
            scenario.description = Some(description);
        }
        if let Some(interventions) = update.interventions {
            scenario.interventions = interventions;
            scenario.total_cost = None;
            scenario.population_covered = None;
            scenario.estimated_cases_averted = None;
            scenario.estimated_deaths_averted = None;
            self.store
                .replace_cost_items(project_id, scenario_id, Vec::new())?;
        }
        self.store.save_scenario(scenario.clone())?;
        Ok(scenario)
    }

    pub fn delete(&self, project_id: &str, scenario_id: &str) -> ApiResult<()> {
        self.store.delete_scenario(project_id, scenario_id)?;
        info!(project_id, scenario_id, "scenario deleted");
        Ok(())
    }

    /// Mark a scenario as the selected one; at most one per project.
    pub fn select(&self, project_id: &str, scenario_id: &str) -> ApiResult<Scenario> {
        let scenario = self.store.select_scenario(project_id, scenario_id)?;
        info!(project_id, scenario_id, "scenario selected");
        Ok(scenario)
    }

    // ==========================================
    // Costing
    // ==========================================

    /// Price a scenario over the planning horizon. Cost items are
    /// wholesale replaced and the derived fields written back to the
    /// scenario.
    pub fn calculate_cost(
        &self,
        project_id: &str,
        scenario_id: &str,
        years: u32,
    ) -> ApiResult<ScenarioCostSummary> {
        if years == 0 {
            return Err(ApiError::InvalidInput(
                "planning horizon must be at least one year".to_string(),
            ));
        }
        let mut scenario = self.store.get_scenario(project_id, scenario_id)?;
        let population = self.population_records(project_id)?;
        let coverage = self.coverage_targets(project_id)?;

        let (items, summary) = self
            .cost_model
            .price(&scenario, &population, &coverage, years);
        self.store
            .replace_cost_items(project_id, scenario_id, items)?;

        scenario.total_cost = Some(summary.total_cost);
        scenario.population_covered = Some(summary.total_population);
        self.store.save_scenario(scenario)?;

        info!(
            project_id,
            scenario_id,
            total_cost = summary.total_cost,
            "scenario costed"
        );
        Ok(summary)
    }

    /// Budget-constrained selection over the scenario's assignments.
    /// The scenario is mutated in place: its assignments shrink to the
    /// admitted (unit, intervention) pairs and its cost fields are
    /// recomputed for the reduced mix.
    pub fn optimize(
        &self,
        project_id: &str,
        scenario_id: &str,
        budget_constraint: f64,
        years: u32,
    ) -> ApiResult<OptimizedScenario> {
        if budget_constraint < 0.0 {
            return Err(ApiError::InvalidInput(format!(
                "budget must be non-negative (got {})",
                budget_constraint
            )));
        }
        if years == 0 {
            return Err(ApiError::InvalidInput(
                "planning horizon must be at least one year".to_string(),
            ));
        }

        let mut scenario = self.store.get_scenario(project_id, scenario_id)?;
        let population = self.population_records(project_id)?;
        let coverage = self.coverage_targets(project_id)?;

        let outcome =
            self.cost_model
                .optimize(&scenario, budget_constraint, &population, &coverage, years);

        scenario.interventions = outcome.interventions;
        scenario.total_cost = Some(outcome.total_cost);
        // Impact estimates described the old assignment.
        scenario.estimated_cases_averted = None;
        scenario.estimated_deaths_averted = None;
        self.store.save_scenario(scenario)?;
        // Cost items and population coverage come from a full costing
        // pass over the reduced assignment.
        self.calculate_cost(project_id, scenario_id, years)?;
        let scenario = self.store.get_scenario(project_id, scenario_id)?;

        info!(
            project_id,
            scenario_id,
            budget = budget_constraint,
            admitted = outcome.candidates_admitted,
            considered = outcome.candidates_considered,
            "budget optimization applied"
        );
        Ok(OptimizedScenario {
            scenario,
            budget_constraint,
            candidates_considered: outcome.candidates_considered,
            candidates_admitted: outcome.candidates_admitted,
        })
    }

    /// Comparison table over all of the project's scenarios.
    pub fn compare(&self, project_id: &str) -> ApiResult<ScenarioComparison> {
        let scenarios = self.store.list_scenarios(project_id)?;
        Ok(self.cost_model.compare(project_id, &scenarios))
    }

    // ==========================================
    // Store joins
    // ==========================================

    fn population_records(&self, project_id: &str) -> ApiResult<Vec<PopulationRecord>> {
        Ok(self
            .store
            .admin_units(project_id)?
            .into_iter()
            .map(|u| PopulationRecord {
                admin_unit_code: u.admin_unit_code,
                admin_unit_name: u.admin_unit_name,
                population: u.population,
            })
            .collect())
    }

    /// Coverage targets from saved intervention plans.
    fn coverage_targets(&self, project_id: &str) -> ApiResult<CoverageTargets> {
        let mut targets = CoverageTargets::new();
        for plan in self.store.list_plans(project_id)? {
            if let Some(coverage) = plan.coverage_target {
                targets.insert((plan.admin_unit_code, plan.intervention_code), coverage);
            }
        }
        Ok(targets)
    }
}
