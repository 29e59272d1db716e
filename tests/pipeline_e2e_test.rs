// ==========================================
// End-to-end planning pipeline test
// ==========================================
// Walks one project from creation through workflow gating,
// stratification, plan creation, scenario costing, budget optimization
// and forecasting, asserting the cross-layer invariants.
// ==========================================

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::json;

use snt_planner::api::stratification_api::ConfigCreate;
use snt_planner::domain::intervention::InterventionPlanCreate;
use snt_planner::domain::stratification::{AdminUnitRow, ThresholdMap, ThresholdRange};
use snt_planner::engine::{StepUpdate, MODEL_SIMPLE};
use snt_planner::{
    AdminUnitRecord, ApiError, BaselineData, EngineSettings, ForecastApi, ForecastRequest,
    ForecastStatus, InterventionApi, InterventionCode, InterventionDecisionEngine, ProjectApi,
    ProjectStore, RiskLevel, ScenarioApi, ScenarioCreate, ScenarioType, StepKey, StepStatus,
    StratificationApi, StratificationMetric, WorkflowApi,
};

struct Apis {
    projects: ProjectApi,
    workflow: WorkflowApi,
    stratification: StratificationApi,
    interventions: InterventionApi,
    scenarios: ScenarioApi,
    forecasts: ForecastApi,
}

fn apis() -> Apis {
    snt_planner::logging::init_test();
    let store = Arc::new(ProjectStore::new());
    let settings = Arc::new(EngineSettings::default());
    let decision_engine = Arc::new(InterventionDecisionEngine::new());
    Apis {
        projects: ProjectApi::new(store.clone()),
        workflow: WorkflowApi::new(store.clone()),
        stratification: StratificationApi::new(store.clone(), decision_engine.clone()),
        interventions: InterventionApi::new(store.clone(), decision_engine, settings.clone()),
        scenarios: ScenarioApi::new(store.clone(), settings.clone()),
        forecasts: ForecastApi::new(store, settings),
    }
}

fn thresholds() -> ThresholdMap {
    let mut t = ThresholdMap::new();
    t.insert(RiskLevel::VeryLow, ThresholdRange::new(0.0, 1.0));
    t.insert(RiskLevel::Low, ThresholdRange::new(1.0, 5.0));
    t.insert(RiskLevel::Moderate, ThresholdRange::new(5.0, 25.0));
    t.insert(RiskLevel::High, ThresholdRange::new(25.0, 100.0));
    t
}

fn seed_project(a: &Apis) -> String {
    let project = a.projects.create_project("E2E SNT", Some("XX")).unwrap();
    a.projects
        .load_admin_units(
            &project.project_id,
            vec![
                AdminUnitRecord {
                    admin_unit_code: "ND".to_string(),
                    admin_unit_name: "North District".to_string(),
                    population: 200_000,
                    geometry: Some(json!({"type": "Point", "coordinates": [8.5, 12.0]})),
                    cases_annual: Some(13_000),
                    deaths_annual: Some(65),
                },
                AdminUnitRecord {
                    admin_unit_code: "SD".to_string(),
                    admin_unit_name: "South District".to_string(),
                    population: 100_000,
                    geometry: Some(json!({"type": "Point", "coordinates": [8.1, 10.3]})),
                    cases_annual: Some(600),
                    deaths_annual: Some(2),
                },
            ],
        )
        .unwrap();
    a.projects
        .set_baseline(
            &project.project_id,
            BaselineData {
                baseline_cases: 13_600.0,
                baseline_deaths: 67.0,
                baseline_prevalence: 9.5,
                population: 300_000,
            },
        )
        .unwrap();
    project.project_id
}

/// Completes the first three steps with valid data.
fn advance_to_stratification(a: &Apis, project_id: &str) {
    a.workflow
        .update_step(
            project_id,
            StepKey::PlanningPreparedness,
            &StepUpdate {
                data: Some(json!({
                    "scope_of_work": "district tailoring",
                    "operational_unit": "district",
                    "timeline": "2026-2028",
                })),
                ..Default::default()
            },
        )
        .unwrap();
    a.workflow
        .complete_step(project_id, StepKey::PlanningPreparedness)
        .unwrap();

    a.workflow
        .update_step(
            project_id,
            StepKey::DataAssembly,
            &StepUpdate {
                data: Some(json!({
                    "source_types": ["epidemiological", "demographic"],
                })),
                ..Default::default()
            },
        )
        .unwrap();
    a.workflow
        .complete_step(project_id, StepKey::DataAssembly)
        .unwrap();

    a.workflow
        .update_step(
            project_id,
            StepKey::SituationAnalysis,
            &StepUpdate {
                data: Some(json!({"analysis_completed": true})),
                ..Default::default()
            },
        )
        .unwrap();
    a.workflow
        .complete_step(project_id, StepKey::SituationAnalysis)
        .unwrap();
}

#[test]
fn test_full_pipeline_from_project_to_forecast() {
    let a = apis();
    let project_id = seed_project(&a);

    // Gating: stratification cannot complete before its chain.
    let err = a
        .workflow
        .complete_step(&project_id, StepKey::Stratification)
        .unwrap_err();
    assert!(matches!(err, ApiError::PrerequisiteNotMet { .. }));

    advance_to_stratification(&a, &project_id);

    // Stratification step still blocked until a config with results
    // exists.
    let err = a
        .workflow
        .complete_step(&project_id, StepKey::Stratification)
        .unwrap_err();
    assert!(matches!(err, ApiError::Validation { .. }));

    let config = a
        .stratification
        .create_config(
            &project_id,
            ConfigCreate {
                name: "PfPR".to_string(),
                metric: StratificationMetric::Pfpr,
                thresholds: thresholds(),
                is_active: true,
            },
        )
        .unwrap();
    let results = a
        .stratification
        .calculate(
            &project_id,
            &config.config_id,
            &[
                AdminUnitRow {
                    admin_unit_name: "North District".to_string(),
                    admin_unit_code: "ND".to_string(),
                    metric_value: 31.0,
                    population: Some(200_000),
                    cases_annual: Some(13_000),
                    deaths_annual: Some(65),
                },
                AdminUnitRow {
                    admin_unit_name: "South District".to_string(),
                    admin_unit_code: "SD".to_string(),
                    metric_value: 2.0,
                    population: Some(100_000),
                    cases_annual: Some(600),
                    deaths_annual: Some(2),
                },
            ],
        )
        .unwrap();
    assert_eq!(results[0].risk_level, RiskLevel::High);
    assert_eq!(results[1].risk_level, RiskLevel::Low);

    a.workflow
        .complete_step(&project_id, StepKey::Stratification)
        .unwrap();

    // GeoJSON export joins stored geometry for both units.
    let geojson = a
        .stratification
        .get_geojson(&project_id, &config.config_id)
        .unwrap();
    assert_eq!(geojson.features.len(), 2);

    // Eligible plan with a coverage target feeding the costing below.
    a.interventions
        .create_plan(
            &project_id,
            InterventionPlanCreate {
                admin_unit_name: "North District".to_string(),
                admin_unit_code: "ND".to_string(),
                intervention_code: InterventionCode::Itn,
                tailoring_decisions: Some(json!({"itn_type": "pbo_llin"})),
                coverage_target: Some(80.0),
                target_population: Some(200_000),
                notes: None,
                risk_level: Some(RiskLevel::High),
                context: BTreeMap::new(),
            },
        )
        .unwrap();

    // Ineligible plan is rejected with the engine's reasons.
    let err = a
        .interventions
        .create_plan(
            &project_id,
            InterventionPlanCreate {
                admin_unit_name: "South District".to_string(),
                admin_unit_code: "SD".to_string(),
                intervention_code: InterventionCode::Irs,
                tailoring_decisions: None,
                coverage_target: None,
                target_population: None,
                notes: None,
                risk_level: Some(RiskLevel::Low),
                context: BTreeMap::new(),
            },
        )
        .unwrap_err();
    assert!(matches!(err, ApiError::Validation { .. }));

    // Scenario costing uses the plan's 80% ITN coverage in ND.
    let mut assignments = BTreeMap::new();
    assignments.insert(
        "ND".to_string(),
        vec![InterventionCode::Itn, InterventionCode::Cm],
    );
    assignments.insert("SD".to_string(), vec![InterventionCode::Cm]);
    let scenario = a
        .scenarios
        .create(
            &project_id,
            ScenarioCreate {
                name: "Ideal".to_string(),
                description: None,
                scenario_type: ScenarioType::Ideal,
                interventions: assignments,
            },
        )
        .unwrap();

    let summary = a
        .scenarios
        .calculate_cost(&project_id, &scenario.scenario_id, 3)
        .unwrap();
    // ITN: 2.0 * 160,000 * 3 = 960,000; CM ND: 0.85 * 200,000 * 3 =
    // 510,000; CM SD: 0.85 * 100,000 * 3 = 255,000.
    assert!((summary.total_cost - 1_725_000.0).abs() < 1e-6);
    assert_eq!(summary.total_population, 300_000);

    // Budget optimization mutates the scenario in place: the ITN
    // candidate (960,000 at 80% coverage) no longer fits, CM in both
    // districts (510,000 + 255,000) does.
    let optimized = a
        .scenarios
        .optimize(&project_id, &scenario.scenario_id, 800_000.0, 3)
        .unwrap();
    assert_eq!(optimized.scenario.scenario_id, scenario.scenario_id);
    assert!((optimized.scenario.total_cost.unwrap() - 765_000.0).abs() < 1e-6);
    assert_eq!(
        optimized.scenario.interventions["ND"],
        vec![InterventionCode::Cm]
    );
    assert_eq!(a.scenarios.list(&project_id).unwrap().len(), 1);

    // Forecast the optimized scenario and compare.
    let forecast = a
        .forecasts
        .run(
            &project_id,
            &scenario.scenario_id,
            &ForecastRequest {
                model_type: MODEL_SIMPLE.to_string(),
                projection_years: 3,
                coverage: BTreeMap::new(),
            },
        )
        .unwrap();
    assert_eq!(forecast.status, ForecastStatus::Completed);
    assert!(forecast.cases_averted.unwrap() > 0.0);
    assert!(forecast.cost_per_case_averted.is_some());

    let comparison = a.forecasts.compare(&project_id).unwrap();
    assert_eq!(
        comparison.best_by_cases_averted,
        Some(scenario.scenario_id.clone())
    );

    // Selection is exclusive across scenarios.
    let spare = a
        .scenarios
        .create(
            &project_id,
            ScenarioCreate {
                name: "Case management only".to_string(),
                description: None,
                scenario_type: ScenarioType::Custom,
                interventions: {
                    let mut m = BTreeMap::new();
                    m.insert("SD".to_string(), vec![InterventionCode::Cm]);
                    m
                },
            },
        )
        .unwrap();
    a.scenarios.select(&project_id, &spare.scenario_id).unwrap();
    a.scenarios.select(&project_id, &scenario.scenario_id).unwrap();
    let selected: Vec<String> = a
        .scenarios
        .list(&project_id)
        .unwrap()
        .into_iter()
        .filter(|s| s.is_selected)
        .map(|s| s.scenario_id)
        .collect();
    assert_eq!(selected, vec![scenario.scenario_id.clone()]);

    // Reopening data assembly revokes downstream accessibility but
    // keeps downstream statuses.
    a.workflow
        .reopen_step(&project_id, StepKey::DataAssembly)
        .unwrap();
    let state = a.workflow.get_state(&project_id).unwrap();
    let by_key = |k: StepKey| state.steps.iter().find(|s| s.step == k).unwrap();
    assert_eq!(by_key(StepKey::DataAssembly).status, StepStatus::InProgress);
    assert_eq!(
        by_key(StepKey::SituationAnalysis).status,
        StepStatus::Completed
    );
    assert!(!by_key(StepKey::SituationAnalysis).is_accessible);
}

#[test]
fn test_invalid_threshold_config_is_rejected_atomically() {
    let a = apis();
    let project_id = seed_project(&a);

    let mut bad = thresholds();
    bad.insert(RiskLevel::Low, ThresholdRange::new(2.0, 5.0));
    let err = a
        .stratification
        .create_config(
            &project_id,
            ConfigCreate {
                name: "bad".to_string(),
                metric: StratificationMetric::Incidence,
                thresholds: bad,
                is_active: true,
            },
        )
        .unwrap_err();
    match err {
        ApiError::Validation { reasons } => assert!(!reasons.is_empty()),
        other => panic!("expected Validation, got {:?}", other),
    }
    assert!(a.stratification.list_configs(&project_id).unwrap().is_empty());
}

#[test]
fn test_failed_forecast_is_recorded_in_history() {
    let a = apis();
    let project = a.projects.create_project("no baseline", None).unwrap();
    let mut assignments = BTreeMap::new();
    assignments.insert("U1".to_string(), vec![InterventionCode::Itn]);
    let scenario = a
        .scenarios
        .create(
            &project.project_id,
            ScenarioCreate {
                name: "s".to_string(),
                description: None,
                scenario_type: ScenarioType::Custom,
                interventions: assignments,
            },
        )
        .unwrap();

    let err = a
        .forecasts
        .run(
            &project.project_id,
            &scenario.scenario_id,
            &ForecastRequest {
                model_type: MODEL_SIMPLE.to_string(),
                projection_years: 5,
                coverage: BTreeMap::new(),
            },
        )
        .unwrap_err();
    assert!(matches!(err, ApiError::Model(_)));

    let history = a
        .forecasts
        .list_for_scenario(&project.project_id, &scenario.scenario_id)
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].status, ForecastStatus::Failed);
}
