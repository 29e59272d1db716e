// ==========================================
// SNT Planner - Project Store
// ==========================================
// Responsibility: data access for projects and everything hanging off
// them. In-memory stand-in for the external data collaborator; the api
// layer never touches the maps directly.
// Constraint: no business rules here, only storage invariants
// (id uniqueness, single selected scenario, wholesale result swaps).
// ==========================================

pub mod error;

pub use error::{StoreError, StoreResult};

use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::forecast::{BaselineData, ForecastResult};
use crate::domain::intervention::InterventionPlan;
use crate::domain::scenario::{Scenario, ScenarioCostItem};
use crate::domain::stratification::{StratificationConfig, StratificationResult};
use crate::domain::workflow::WorkflowStepState;
use crate::domain::types::StepKey;
use crate::engine::StepMap;

// ==========================================
// Stored records
// ==========================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub project_id: String,
    pub name: String,
    pub country: Option<String>,
    pub created_at: NaiveDateTime,
}

/// Population, geometry and baseline burden per admin unit, as loaded
/// from the national data source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminUnitRecord {
    pub admin_unit_code: String,
    pub admin_unit_name: String,
    pub population: u64,
    #[serde(default)]
    pub geometry: Option<Value>,
    #[serde(default)]
    pub cases_annual: Option<u64>,
    #[serde(default)]
    pub deaths_annual: Option<u64>,
}

#[derive(Debug, Default)]
struct ProjectData {
    project: Option<Project>,
    steps: StepMap,
    admin_units: BTreeMap<String, AdminUnitRecord>,
    baseline: Option<BaselineData>,
    configs: BTreeMap<String, StratificationConfig>,
    /// config_id -> result set (wholesale replaced on recalculation).
    results: BTreeMap<String, Vec<StratificationResult>>,
    plans: BTreeMap<String, InterventionPlan>,
    scenarios: BTreeMap<String, Scenario>,
    /// scenario_id -> cost items (wholesale replaced per costing).
    cost_items: BTreeMap<String, Vec<ScenarioCostItem>>,
    /// scenario_id -> forecast history, append-only, newest last.
    forecasts: BTreeMap<String, Vec<ForecastResult>>,
}

// ==========================================
// ProjectStore
// ==========================================
pub struct ProjectStore {
    inner: RwLock<HashMap<String, ProjectData>>,
}

impl ProjectStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, HashMap<String, ProjectData>>> {
        self.inner
            .read()
            .map_err(|e| StoreError::LockError(e.to_string()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, HashMap<String, ProjectData>>> {
        self.inner
            .write()
            .map_err(|e| StoreError::LockError(e.to_string()))
    }

    // ==========================================
    // Projects
    // ==========================================

    /// Create a project with all 10 workflow steps NotStarted.
    pub fn create_project(&self, name: &str, country: Option<&str>) -> StoreResult<Project> {
        let project = Project {
            project_id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            country: country.map(str::to_string),
            created_at: Utc::now().naive_utc(),
        };

        let mut data = ProjectData::default();
        data.steps = StepKey::ORDER
            .iter()
            .map(|k| (*k, WorkflowStepState::new(*k)))
            .collect();
        data.project = Some(project.clone());

        let mut guard = self.write()?;
        guard.insert(project.project_id.clone(), data);

        info!(project_id = %project.project_id, name = %project.name, "project created");
        Ok(project)
    }

    pub fn get_project(&self, project_id: &str) -> StoreResult<Project> {
        let guard = self.read()?;
        guard
            .get(project_id)
            .and_then(|d| d.project.clone())
            .ok_or_else(|| StoreError::not_found("project", project_id))
    }

    pub fn list_projects(&self) -> StoreResult<Vec<Project>> {
        let guard = self.read()?;
        let mut projects: Vec<Project> =
            guard.values().filter_map(|d| d.project.clone()).collect();
        projects.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(projects)
    }

    pub fn delete_project(&self, project_id: &str) -> StoreResult<()> {
        let mut guard = self.write()?;
        guard
            .remove(project_id)
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found("project", project_id))
    }

    // ==========================================
    // Admin units and baseline
    // ==========================================

    /// Replace a project's admin unit records wholesale.
    pub fn load_admin_units(
        &self,
        project_id: &str,
        units: Vec<AdminUnitRecord>,
    ) -> StoreResult<usize> {
        let mut guard = self.write()?;
        let data = guard
            .get_mut(project_id)
            .ok_or_else(|| StoreError::not_found("project", project_id))?;
        data.admin_units = units
            .into_iter()
            .map(|u| (u.admin_unit_code.clone(), u))
            .collect();
        debug!(project_id, count = data.admin_units.len(), "admin units loaded");
        Ok(data.admin_units.len())
    }

    pub fn admin_units(&self, project_id: &str) -> StoreResult<Vec<AdminUnitRecord>> {
        let guard = self.read()?;
        let data = guard
            .get(project_id)
            .ok_or_else(|| StoreError::not_found("project", project_id))?;
        Ok(data.admin_units.values().cloned().collect())
    }

    pub fn set_baseline(&self, project_id: &str, baseline: BaselineData) -> StoreResult<()> {
        let mut guard = self.write()?;
        let data = guard
            .get_mut(project_id)
            .ok_or_else(|| StoreError::not_found("project", project_id))?;
        data.baseline = Some(baseline);
        Ok(())
    }

    pub fn baseline(&self, project_id: &str) -> StoreResult<Option<BaselineData>> {
        let guard = self.read()?;
        let data = guard
            .get(project_id)
            .ok_or_else(|| StoreError::not_found("project", project_id))?;
        Ok(data.baseline.clone())
    }

    // ==========================================
    // Workflow steps
    // ==========================================

    pub fn steps(&self, project_id: &str) -> StoreResult<StepMap> {
        let guard = self.read()?;
        let data = guard
            .get(project_id)
            .ok_or_else(|| StoreError::not_found("project", project_id))?;
        Ok(data.steps.clone())
    }

    pub fn save_steps(&self, project_id: &str, steps: StepMap) -> StoreResult<()> {
        let mut guard = self.write()?;
        let data = guard
            .get_mut(project_id)
            .ok_or_else(|| StoreError::not_found("project", project_id))?;
        data.steps = steps;
        Ok(())
    }

    // ==========================================
    // Stratification configs and results
    // ==========================================

    /// Insert a config. When the config is active, any previously
    /// active config for the project is deactivated.
    pub fn save_config(&self, config: StratificationConfig) -> StoreResult<()> {
        let mut guard = self.write()?;
        let data = guard
            .get_mut(&config.project_id)
            .ok_or_else(|| StoreError::not_found("project", &config.project_id))?;
        if config.is_active {
            for existing in data.configs.values_mut() {
                existing.is_active = false;
            }
        }
        data.configs.insert(config.config_id.clone(), config);
        Ok(())
    }

    pub fn get_config(
        &self,
        project_id: &str,
        config_id: &str,
    ) -> StoreResult<StratificationConfig> {
        let guard = self.read()?;
        let data = guard
            .get(project_id)
            .ok_or_else(|| StoreError::not_found("project", project_id))?;
        data.configs
            .get(config_id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("stratification_config", config_id))
    }

    pub fn list_configs(&self, project_id: &str) -> StoreResult<Vec<StratificationConfig>> {
        let guard = self.read()?;
        let data = guard
            .get(project_id)
            .ok_or_else(|| StoreError::not_found("project", project_id))?;
        Ok(data.configs.values().cloned().collect())
    }

    pub fn active_config(&self, project_id: &str) -> StoreResult<Option<StratificationConfig>> {
        let guard = self.read()?;
        let data = guard
            .get(project_id)
            .ok_or_else(|| StoreError::not_found("project", project_id))?;
        Ok(data.configs.values().find(|c| c.is_active).cloned())
    }

    /// Replace the result set of a config wholesale.
    pub fn replace_results(
        &self,
        project_id: &str,
        config_id: &str,
        results: Vec<StratificationResult>,
    ) -> StoreResult<()> {
        let mut guard = self.write()?;
        let data = guard
            .get_mut(project_id)
            .ok_or_else(|| StoreError::not_found("project", project_id))?;
        if !data.configs.contains_key(config_id) {
            return Err(StoreError::not_found("stratification_config", config_id));
        }
        data.results.insert(config_id.to_string(), results);
        Ok(())
    }

    pub fn results(
        &self,
        project_id: &str,
        config_id: &str,
    ) -> StoreResult<Vec<StratificationResult>> {
        let guard = self.read()?;
        let data = guard
            .get(project_id)
            .ok_or_else(|| StoreError::not_found("project", project_id))?;
        Ok(data.results.get(config_id).cloned().unwrap_or_default())
    }

    // ==========================================
    // Intervention plans
    // ==========================================

    pub fn insert_plan(&self, plan: InterventionPlan) -> StoreResult<()> {
        let mut guard = self.write()?;
        let data = guard
            .get_mut(&plan.project_id)
            .ok_or_else(|| StoreError::not_found("project", &plan.project_id))?;
        if data.plans.contains_key(&plan.plan_id) {
            return Err(StoreError::duplicate("intervention_plan", &plan.plan_id));
        }
        data.plans.insert(plan.plan_id.clone(), plan);
        Ok(())
    }

    pub fn list_plans(&self, project_id: &str) -> StoreResult<Vec<InterventionPlan>> {
        let guard = self.read()?;
        let data = guard
            .get(project_id)
            .ok_or_else(|| StoreError::not_found("project", project_id))?;
        Ok(data.plans.values().cloned().collect())
    }

    pub fn delete_plan(&self, project_id: &str, plan_id: &str) -> StoreResult<()> {
        let mut guard = self.write()?;
        let data = guard
            .get_mut(project_id)
            .ok_or_else(|| StoreError::not_found("project", project_id))?;
        data.plans
            .remove(plan_id)
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found("intervention_plan", plan_id))
    }

    // ==========================================
    // Scenarios, cost items, forecasts
    // ==========================================

    /// Insert or update a scenario.
    pub fn save_scenario(&self, scenario: Scenario) -> StoreResult<()> {
        let mut guard = self.write()?;
        let data = guard
            .get_mut(&scenario.project_id)
            .ok_or_else(|| StoreError::not_found("project", &scenario.project_id))?;
        data.scenarios.insert(scenario.scenario_id.clone(), scenario);
        Ok(())
    }

    pub fn get_scenario(&self, project_id: &str, scenario_id: &str) -> StoreResult<Scenario> {
        let guard = self.read()?;
        let data = guard
            .get(project_id)
            .ok_or_else(|| StoreError::not_found("project", project_id))?;
        data.scenarios
            .get(scenario_id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("scenario", scenario_id))
    }

    pub fn list_scenarios(&self, project_id: &str) -> StoreResult<Vec<Scenario>> {
        let guard = self.read()?;
        let data = guard
            .get(project_id)
            .ok_or_else(|| StoreError::not_found("project", project_id))?;
        let mut scenarios: Vec<Scenario> = data.scenarios.values().cloned().collect();
        scenarios.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(scenarios)
    }

    /// Delete a scenario together with its cost items and forecast
    /// history.
    pub fn delete_scenario(&self, project_id: &str, scenario_id: &str) -> StoreResult<()> {
        let mut guard = self.write()?;
        let data = guard
            .get_mut(project_id)
            .ok_or_else(|| StoreError::not_found("project", project_id))?;
        data.scenarios
            .remove(scenario_id)
            .ok_or_else(|| StoreError::not_found("scenario", scenario_id))?;
        data.cost_items.remove(scenario_id);
        data.forecasts.remove(scenario_id);
        Ok(())
    }

    /// Atomically mark one scenario selected and clear the flag on all
    /// others in the project.
    pub fn select_scenario(&self, project_id: &str, scenario_id: &str) -> StoreResult<Scenario> {
        let mut guard = self.write()?;
        let data = guard
            .get_mut(project_id)
            .ok_or_else(|| StoreError::not_found("project", project_id))?;
        if !data.scenarios.contains_key(scenario_id) {
            return Err(StoreError::not_found("scenario", scenario_id));
        }
        for (id, scenario) in data.scenarios.iter_mut() {
            scenario.is_selected = id == scenario_id;
        }
        // contains_key checked above.
        Ok(data.scenarios[scenario_id].clone())
    }

    pub fn replace_cost_items(
        &self,
        project_id: &str,
        scenario_id: &str,
        items: Vec<ScenarioCostItem>,
    ) -> StoreResult<()> {
        let mut guard = self.write()?;
        let data = guard
            .get_mut(project_id)
            .ok_or_else(|| StoreError::not_found("project", project_id))?;
        if !data.scenarios.contains_key(scenario_id) {
            return Err(StoreError::not_found("scenario", scenario_id));
        }
        data.cost_items.insert(scenario_id.to_string(), items);
        Ok(())
    }

    pub fn cost_items(
        &self,
        project_id: &str,
        scenario_id: &str,
    ) -> StoreResult<Vec<ScenarioCostItem>> {
        let guard = self.read()?;
        let data = guard
            .get(project_id)
            .ok_or_else(|| StoreError::not_found("project", project_id))?;
        Ok(data.cost_items.get(scenario_id).cloned().unwrap_or_default())
    }

    /// Append a forecast run to the scenario's history (failed runs
    /// included).
    pub fn push_forecast(&self, project_id: &str, forecast: ForecastResult) -> StoreResult<()> {
        let mut guard = self.write()?;
        let data = guard
            .get_mut(project_id)
            .ok_or_else(|| StoreError::not_found("project", project_id))?;
        if !data.scenarios.contains_key(&forecast.scenario_id) {
            return Err(StoreError::not_found("scenario", &forecast.scenario_id));
        }
        data.forecasts
            .entry(forecast.scenario_id.clone())
            .or_default()
            .push(forecast);
        Ok(())
    }

    pub fn forecasts_for_scenario(
        &self,
        project_id: &str,
        scenario_id: &str,
    ) -> StoreResult<Vec<ForecastResult>> {
        let guard = self.read()?;
        let data = guard
            .get(project_id)
            .ok_or_else(|| StoreError::not_found("project", project_id))?;
        Ok(data.forecasts.get(scenario_id).cloned().unwrap_or_default())
    }

    pub fn get_forecast(&self, project_id: &str, forecast_id: &str) -> StoreResult<ForecastResult> {
        let guard = self.read()?;
        let data = guard
            .get(project_id)
            .ok_or_else(|| StoreError::not_found("project", project_id))?;
        data.forecasts
            .values()
            .flatten()
            .find(|f| f.forecast_id == forecast_id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("forecast", forecast_id))
    }
}

impl Default for ProjectStore {
    fn default() -> Self {
        Self::new()
    }
}
