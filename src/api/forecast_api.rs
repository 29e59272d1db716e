// ==========================================
// SNT Planner - Forecast API
// ==========================================
// Responsibility: forecast runs, history and cross-scenario impact
// comparison. Failed runs are kept in history with their reason and
// surfaced as model errors.
// ==========================================

use std::sync::Arc;

use tracing::info;

use crate::api::error::{ApiError, ApiResult};
use crate::config::EngineSettings;
use crate::domain::forecast::{ForecastComparison, ForecastRequest, ForecastResult};
use crate::domain::types::ForecastStatus;
use crate::engine::ForecastEngine;
use crate::store::ProjectStore;

pub struct ForecastApi {
    store: Arc<ProjectStore>,
    engine: ForecastEngine,
}

impl ForecastApi {
    pub fn new(store: Arc<ProjectStore>, settings: Arc<EngineSettings>) -> Self {
        Self {
            store,
            engine: ForecastEngine::new(settings),
        }
    }

    /// Run a forecast for a scenario against the project baseline.
    ///
    /// Every run is appended to the scenario's history, failed runs
    /// included; a failed run is then surfaced as a model error. On a
    /// completed run the scenario's estimated impact fields are
    /// written back.
    pub fn run(
        &self,
        project_id: &str,
        scenario_id: &str,
        request: &ForecastRequest,
    ) -> ApiResult<ForecastResult> {
        let mut scenario = self.store.get_scenario(project_id, scenario_id)?;
        let baseline = self.store.baseline(project_id)?;

        let result = self.engine.run(&scenario, baseline.as_ref(), request);
        self.store.push_forecast(project_id, result.clone())?;

        match result.status {
            ForecastStatus::Failed => {
                let reason = result
                    .failure_reason
                    .clone()
                    .unwrap_or_else(|| "forecast failed".to_string());
                Err(ApiError::Model(reason))
            }
            ForecastStatus::Completed => {
                scenario.estimated_cases_averted = result.cases_averted;
                scenario.estimated_deaths_averted = result.deaths_averted;
                self.store.save_scenario(scenario)?;
                info!(
                    project_id,
                    scenario_id,
                    forecast_id = %result.forecast_id,
                    "forecast stored"
                );
                Ok(result)
            }
            // External model runs stay pending until the collaborator
            // reports back.
            _ => Ok(result),
        }
    }

    pub fn get(&self, project_id: &str, forecast_id: &str) -> ApiResult<ForecastResult> {
        Ok(self.store.get_forecast(project_id, forecast_id)?)
    }

    pub fn list_for_scenario(
        &self,
        project_id: &str,
        scenario_id: &str,
    ) -> ApiResult<Vec<ForecastResult>> {
        // Surface a missing scenario rather than an empty history.
        self.store.get_scenario(project_id, scenario_id)?;
        Ok(self.store.forecasts_for_scenario(project_id, scenario_id)?)
    }

    /// Compare the latest completed forecast of every scenario in the
    /// project.
    pub fn compare(&self, project_id: &str) -> ApiResult<ForecastComparison> {
        let scenarios = self.store.list_scenarios(project_id)?;
        let mut latest = Vec::with_capacity(scenarios.len());
        for scenario in &scenarios {
            let history = self
                .store
                .forecasts_for_scenario(project_id, &scenario.scenario_id)?;
            latest.push(
                history
                    .into_iter()
                    .rev()
                    .find(|f| f.status == ForecastStatus::Completed),
            );
        }

        let entries: Vec<_> = scenarios
            .iter()
            .zip(latest.iter())
            .map(|(s, f)| (s, f.as_ref()))
            .collect();
        Ok(self.engine.compare(project_id, &entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::forecast::BaselineData;
    use crate::domain::scenario::ScenarioCreate;
    use crate::domain::types::{InterventionCode, ScenarioType};
    use crate::engine::MODEL_SIMPLE;
    use std::collections::BTreeMap;

    fn setup() -> (ForecastApi, Arc<ProjectStore>, String, String) {
        let store = Arc::new(ProjectStore::new());
        let project = store.create_project("test", None).unwrap();
        let settings = Arc::new(EngineSettings::default());

        let scenario_api =
            crate::api::scenario_api::ScenarioApi::new(store.clone(), settings.clone());
        let mut interventions = BTreeMap::new();
        interventions.insert("ND".to_string(), vec![InterventionCode::Itn]);
        let scenario = scenario_api
            .create(
                &project.project_id,
                ScenarioCreate {
                    name: "ITN only".to_string(),
                    description: None,
                    scenario_type: ScenarioType::Ideal,
                    interventions,
                },
            )
            .unwrap();

        (
            ForecastApi::new(store.clone(), settings),
            store,
            project.project_id,
            scenario.scenario_id,
        )
    }

    fn request() -> ForecastRequest {
        ForecastRequest {
            model_type: MODEL_SIMPLE.to_string(),
            projection_years: 3,
            coverage: BTreeMap::new(),
        }
    }

    fn baseline() -> BaselineData {
        BaselineData {
            baseline_cases: 100_000.0,
            baseline_deaths: 500.0,
            baseline_prevalence: 15.0,
            population: 1_000_000,
        }
    }

    #[test]
    fn test_missing_baseline_is_model_error_kept_in_history() {
        let (api, _store, project_id, scenario_id) = setup();
        let err = api.run(&project_id, &scenario_id, &request()).unwrap_err();
        assert!(matches!(err, ApiError::Model(_)));

        let history = api.list_for_scenario(&project_id, &scenario_id).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].status, ForecastStatus::Failed);
        assert!(history[0].failure_reason.is_some());
    }

    #[test]
    fn test_run_writes_back_scenario_estimates() {
        let (api, store, project_id, scenario_id) = setup();
        store.set_baseline(&project_id, baseline()).unwrap();

        let result = api.run(&project_id, &scenario_id, &request()).unwrap();
        assert_eq!(result.status, ForecastStatus::Completed);

        let scenario = store.get_scenario(&project_id, &scenario_id).unwrap();
        assert_eq!(scenario.estimated_cases_averted, result.cases_averted);
        assert_eq!(scenario.estimated_deaths_averted, result.deaths_averted);
    }

    #[test]
    fn test_history_accumulates_per_scenario() {
        let (api, store, project_id, scenario_id) = setup();
        store.set_baseline(&project_id, baseline()).unwrap();

        api.run(&project_id, &scenario_id, &request()).unwrap();
        api.run(&project_id, &scenario_id, &request()).unwrap();

        let history = api.list_for_scenario(&project_id, &scenario_id).unwrap();
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_get_by_forecast_id() {
        let (api, store, project_id, scenario_id) = setup();
        store.set_baseline(&project_id, baseline()).unwrap();
        let result = api.run(&project_id, &scenario_id, &request()).unwrap();

        let fetched = api.get(&project_id, &result.forecast_id).unwrap();
        assert_eq!(fetched.forecast_id, result.forecast_id);

        let err = api.get(&project_id, "nope").unwrap_err();
        assert!(matches!(err, ApiError::NotFound { .. }));
    }

    #[test]
    fn test_compare_uses_latest_completed_run() {
        let (api, store, project_id, scenario_id) = setup();
        store.set_baseline(&project_id, baseline()).unwrap();
        api.run(&project_id, &scenario_id, &request()).unwrap();

        let cmp = api.compare(&project_id).unwrap();
        assert_eq!(cmp.scenarios.len(), 1);
        assert_eq!(cmp.best_by_cases_averted, Some(scenario_id));
    }
}
