// ==========================================
// SNT Planner - Demo Entry Point
// ==========================================
// Seeds a small planning project and walks the full pipeline:
// workflow -> stratification -> recommendations -> scenario costing ->
// budget optimization -> impact forecast.
// ==========================================

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::json;
use tracing::info;

use snt_planner::api::stratification_api::ConfigCreate;
use snt_planner::domain::stratification::{AdminUnitRow, ThresholdMap, ThresholdRange};
use snt_planner::engine::{StepUpdate, MODEL_SIMPLE};
use snt_planner::{
    AdminUnitRecord, BaselineData, EngineSettings, ForecastApi, ForecastRequest,
    InterventionApi, InterventionCode, InterventionDecisionEngine, ProjectApi, ProjectStore,
    RiskLevel, ScenarioApi, ScenarioCreate, ScenarioType, StepKey, StratificationApi,
    StratificationMetric, WorkflowApi,
};

fn main() -> anyhow::Result<()> {
    snt_planner::logging::init();

    info!("==================================================");
    info!("{} - decision support for SNT", snt_planner::APP_NAME);
    info!("version: {}", snt_planner::VERSION);
    info!("==================================================");

    let store = Arc::new(ProjectStore::new());
    let settings = Arc::new(EngineSettings::default());
    let decision_engine = Arc::new(InterventionDecisionEngine::new());

    let projects = ProjectApi::new(store.clone());
    let workflow = WorkflowApi::new(store.clone());
    let stratification = StratificationApi::new(store.clone(), decision_engine.clone());
    let interventions = InterventionApi::new(store.clone(), decision_engine, settings.clone());
    let scenarios = ScenarioApi::new(store.clone(), settings.clone());
    let forecasts = ForecastApi::new(store, settings);

    // ==========================================
    // Project and national data
    // ==========================================
    let project = projects.create_project("Demo SNT 2026", Some("XX"))?;
    let project_id = project.project_id.as_str();

    projects.load_admin_units(
        project_id,
        vec![
            unit("ND", "North District", 220_000, 14_000, 70),
            unit("CD", "Central District", 150_000, 4_500, 12),
            unit("SD", "South District", 90_000, 400, 1),
        ],
    )?;
    projects.set_baseline(
        project_id,
        BaselineData {
            baseline_cases: 18_900.0,
            baseline_deaths: 83.0,
            baseline_prevalence: 11.0,
            population: 460_000,
        },
    )?;

    // ==========================================
    // Workflow: planning through stratification
    // ==========================================
    workflow.update_step(
        project_id,
        StepKey::PlanningPreparedness,
        &StepUpdate {
            data: Some(json!({
                "scope_of_work": "district-level tailoring",
                "operational_unit": "district",
                "timeline": "2026-2028",
            })),
            ..Default::default()
        },
    )?;
    workflow.complete_step(project_id, StepKey::PlanningPreparedness)?;

    workflow.update_step(
        project_id,
        StepKey::DataAssembly,
        &StepUpdate {
            data: Some(json!({
                "source_types": ["epidemiological", "demographic", "entomological"],
                "quality_scores": {"routine_surveillance": 0.8, "survey": 0.9},
            })),
            ..Default::default()
        },
    )?;
    workflow.complete_step(project_id, StepKey::DataAssembly)?;

    workflow.update_step(
        project_id,
        StepKey::SituationAnalysis,
        &StepUpdate {
            data: Some(json!({"analysis_completed": true})),
            ..Default::default()
        },
    )?;
    workflow.complete_step(project_id, StepKey::SituationAnalysis)?;

    // ==========================================
    // Stratification
    // ==========================================
    let config = stratification.create_config(
        project_id,
        ConfigCreate {
            name: "National PfPR thresholds".to_string(),
            metric: StratificationMetric::Pfpr,
            thresholds: standard_thresholds(),
            is_active: true,
        },
    )?;
    let results = stratification.calculate(
        project_id,
        &config.config_id,
        &[
            row("ND", "North District", 28.0, 220_000, 14_000, 70),
            row("CD", "Central District", 9.0, 150_000, 4_500, 12),
            row("SD", "South District", 0.6, 90_000, 400, 1),
        ],
    )?;
    for r in &results {
        info!(
            unit = %r.admin_unit_code,
            risk = %r.risk_level,
            eligible = r.eligible_interventions.len(),
            "unit stratified"
        );
    }
    workflow.complete_step(project_id, StepKey::Stratification)?;

    let summary = stratification.get_summary(project_id, &config.config_id)?;
    info!(
        units = summary.total_units,
        population = summary.total_population,
        cases = summary.total_cases,
        "stratification summary"
    );

    // ==========================================
    // Recommendations
    // ==========================================
    let mut context = BTreeMap::new();
    context.insert("seasonality".to_string(), json!("seasonal"));
    context.insert("pyrethroid_resistance_pct".to_string(), json!(48.0));
    for rec in interventions.get_recommendations(RiskLevel::High, &context) {
        info!(
            intervention = %rec.intervention_code,
            eligible = rec.is_eligible,
            "recommendation"
        );
    }

    // ==========================================
    // Scenario, costing, optimization
    // ==========================================
    let mut assignments = BTreeMap::new();
    assignments.insert(
        "ND".to_string(),
        vec![InterventionCode::Itn, InterventionCode::Smc, InterventionCode::Cm],
    );
    assignments.insert(
        "CD".to_string(),
        vec![InterventionCode::Itn, InterventionCode::Cm],
    );
    assignments.insert("SD".to_string(), vec![InterventionCode::Cm]);

    let scenario = scenarios.create(
        project_id,
        ScenarioCreate {
            name: "Ideal mix".to_string(),
            description: Some("Full recommended package per risk level".to_string()),
            scenario_type: ScenarioType::Ideal,
            interventions: assignments,
        },
    )?;

    let cost = scenarios.calculate_cost(project_id, &scenario.scenario_id, 3)?;
    info!(
        total_cost = cost.total_cost,
        per_capita = ?cost.cost_per_capita,
        "scenario costed"
    );

    // ==========================================
    // Forecast and comparison
    // ==========================================
    let request = ForecastRequest {
        model_type: MODEL_SIMPLE.to_string(),
        projection_years: 3,
        coverage: BTreeMap::new(),
    };
    scenarios.select(project_id, &scenario.scenario_id)?;
    let forecast = forecasts.run(project_id, &scenario.scenario_id, &request)?;
    info!(
        cases_averted = ?forecast.cases_averted,
        deaths_averted = ?forecast.deaths_averted,
        dalys_averted = ?forecast.dalys_averted,
        "forecast (full mix)"
    );

    // Trim the mix to the budget in place and forecast again.
    let optimized = scenarios.optimize(project_id, &scenario.scenario_id, 1_500_000.0, 3)?;
    info!(
        admitted = optimized.candidates_admitted,
        considered = optimized.candidates_considered,
        total_cost = ?optimized.scenario.total_cost,
        "budget optimization applied"
    );
    forecasts.run(project_id, &scenario.scenario_id, &request)?;

    let comparison = forecasts.compare(project_id)?;
    info!(
        best_by_cases = ?comparison.best_by_cases_averted,
        best_by_ce = ?comparison.best_by_cost_effectiveness,
        "forecast comparison"
    );

    let state = workflow.get_state(project_id)?;
    info!(
        progress = state.overall_progress,
        current = ?state.current_step,
        "workflow state"
    );

    Ok(())
}

fn standard_thresholds() -> ThresholdMap {
    let mut t = ThresholdMap::new();
    t.insert(RiskLevel::VeryLow, ThresholdRange::new(0.0, 1.0));
    t.insert(RiskLevel::Low, ThresholdRange::new(1.0, 5.0));
    t.insert(RiskLevel::Moderate, ThresholdRange::new(5.0, 25.0));
    t.insert(RiskLevel::High, ThresholdRange::new(25.0, 100.0));
    t
}

fn unit(code: &str, name: &str, population: u64, cases: u64, deaths: u64) -> AdminUnitRecord {
    AdminUnitRecord {
        admin_unit_code: code.to_string(),
        admin_unit_name: name.to_string(),
        population,
        geometry: Some(json!({"type": "Point", "coordinates": [0.0, 0.0]})),
        cases_annual: Some(cases),
        deaths_annual: Some(deaths),
    }
}

fn row(
    code: &str,
    name: &str,
    metric_value: f64,
    population: u64,
    cases: u64,
    deaths: u64,
) -> AdminUnitRow {
    AdminUnitRow {
        admin_unit_name: name.to_string(),
        admin_unit_code: code.to_string(),
        metric_value,
        population: Some(population),
        cases_annual: Some(cases),
        deaths_annual: Some(deaths),
    }
}
