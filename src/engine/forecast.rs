// ==========================================
// SNT Planner - Impact Forecast Engine
// ==========================================
// Projects epidemiological trajectories for a scenario's intervention
// mix and derives cost-effectiveness ratios.
// Model: multiplicative-independent intervention effects,
//   remaining_risk = prod(1 - efficacy_i * coverage_i)
//   projected[year] = baseline * remaining_risk^year
// Status machine: Pending -> Running -> Completed | Failed.
// ==========================================

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::EngineSettings;
use crate::domain::forecast::{
    BaselineData, ForecastComparison, ForecastRequest, ForecastResult, ForecastSummary,
    UncertaintyBounds, UncertaintyInterval,
};
use crate::domain::scenario::Scenario;
use crate::domain::types::ForecastStatus;

/// Model type handled in-process; anything else is delegated to an
/// external modelling collaborator and left pending.
pub const MODEL_SIMPLE: &str = "simple";

// ==========================================
// ForecastEngine
// ==========================================
pub struct ForecastEngine {
    settings: Arc<EngineSettings>,
}

impl ForecastEngine {
    pub fn new(settings: Arc<EngineSettings>) -> Self {
        Self { settings }
    }

    // ==========================================
    // Forecast run
    // ==========================================

    /// Run a forecast for one scenario.
    ///
    /// Preconditions: baseline data present and at least one
    /// intervention assigned to some unit. Violations produce a Failed
    /// result carrying the reason; the caller surfaces it as a model
    /// error and keeps the failed run in history.
    pub fn run(
        &self,
        scenario: &Scenario,
        baseline: Option<&BaselineData>,
        request: &ForecastRequest,
    ) -> ForecastResult {
        let mut result = self.blank_result(scenario, request);
        result.status = ForecastStatus::Running;
        debug!(
            scenario_id = %scenario.scenario_id,
            model_type = %request.model_type,
            years = request.projection_years,
            "forecast started"
        );

        // Precondition checks.
        let Some(baseline) = baseline else {
            return self.fail(result, "Baseline data is missing");
        };
        let has_interventions = scenario.interventions.values().any(|v| !v.is_empty());
        if !has_interventions {
            return self.fail(result, "Scenario has no interventions assigned to any unit");
        }
        if request.projection_years == 0 {
            return self.fail(result, "Projection horizon must be at least one year");
        }

        if request.model_type != MODEL_SIMPLE {
            // External models run out of process; the record stays
            // pending until the collaborator reports back.
            info!(model_type = %request.model_type, "external model requested, leaving pending");
            result.status = ForecastStatus::Pending;
            return result;
        }

        self.project(result, scenario, baseline, request)
    }

    fn project(
        &self,
        mut result: ForecastResult,
        scenario: &Scenario,
        baseline: &BaselineData,
        request: &ForecastRequest,
    ) -> ForecastResult {
        // Distinct interventions across all units; combined effect is
        // multiplicative-independent.
        let mix: BTreeSet<_> = scenario
            .interventions
            .values()
            .flatten()
            .copied()
            .collect();

        let mut remaining_cases = 1.0;
        let mut remaining_deaths = 1.0;
        for code in &mix {
            let Some(eff) = self.settings.efficacy(*code) else {
                warn!(intervention = %code, "no efficacy profile, ignoring in projection");
                continue;
            };
            let coverage = request.coverage.get(code).copied().unwrap_or(1.0).clamp(0.0, 1.0);
            remaining_cases *= 1.0 - eff.cases_reduction * coverage;
            remaining_deaths *= 1.0 - eff.deaths_reduction * coverage;
        }

        let mut cases_averted = 0.0;
        let mut deaths_averted = 0.0;
        for year in 1..=request.projection_years {
            let year_cases = baseline.baseline_cases * remaining_cases.powi(year as i32);
            let year_deaths = baseline.baseline_deaths * remaining_deaths.powi(year as i32);
            let year_prevalence =
                baseline.baseline_prevalence * remaining_cases.powi(year as i32);

            result.projected_cases.insert(year, year_cases);
            result.projected_deaths.insert(year, year_deaths);
            result.projected_prevalence.insert(year, year_prevalence);

            cases_averted += baseline.baseline_cases - year_cases;
            deaths_averted += baseline.baseline_deaths - year_deaths;
        }

        let dalys_averted = deaths_averted * self.settings.daly_per_death
            + cases_averted * self.settings.daly_per_case;

        result.cases_averted = Some(cases_averted);
        result.deaths_averted = Some(deaths_averted);
        result.dalys_averted = Some(dalys_averted);

        // Cost-effectiveness, None whenever the denominator is zero.
        if let Some(total_cost) = scenario.total_cost {
            result.cost_per_case_averted = ratio(total_cost, cases_averted);
            result.cost_per_death_averted = ratio(total_cost, deaths_averted);
            result.cost_per_daly_averted = ratio(total_cost, dalys_averted);
        }

        let envelope = self.settings.uncertainty_envelope;
        result.uncertainty_bounds = Some(UncertaintyBounds {
            cases_averted: interval(cases_averted, envelope),
            deaths_averted: interval(deaths_averted, envelope),
        });

        result.status = ForecastStatus::Completed;
        info!(
            scenario_id = %scenario.scenario_id,
            cases_averted,
            deaths_averted,
            "forecast completed"
        );
        result
    }

    fn blank_result(&self, scenario: &Scenario, request: &ForecastRequest) -> ForecastResult {
        ForecastResult {
            forecast_id: Uuid::new_v4().to_string(),
            scenario_id: scenario.scenario_id.clone(),
            status: ForecastStatus::Pending,
            failure_reason: None,
            model_type: request.model_type.clone(),
            projected_cases: BTreeMap::new(),
            projected_deaths: BTreeMap::new(),
            projected_prevalence: BTreeMap::new(),
            cases_averted: None,
            deaths_averted: None,
            dalys_averted: None,
            cost_per_case_averted: None,
            cost_per_death_averted: None,
            cost_per_daly_averted: None,
            uncertainty_bounds: None,
            created_at: Utc::now().naive_utc(),
        }
    }

    fn fail(&self, mut result: ForecastResult, reason: &str) -> ForecastResult {
        warn!(scenario_id = %result.scenario_id, reason, "forecast failed");
        result.status = ForecastStatus::Failed;
        result.failure_reason = Some(reason.to_string());
        result
    }

    // ==========================================
    // Cross-scenario comparison
    // ==========================================

    /// Compare the latest completed forecast of each scenario.
    pub fn compare(
        &self,
        project_id: &str,
        entries: &[(&Scenario, Option<&ForecastResult>)],
    ) -> ForecastComparison {
        let mut summaries = Vec::new();
        let mut best_by_cases: Option<(String, f64)> = None;
        let mut best_by_ce: Option<(String, f64)> = None;

        for (scenario, forecast) in entries {
            let final_year = forecast.and_then(|f| f.projected_cases.keys().max().copied());
            let summary = ForecastSummary {
                scenario_id: scenario.scenario_id.clone(),
                scenario_name: scenario.name.clone(),
                projected_cases_final_year: forecast
                    .zip(final_year)
                    .and_then(|(f, y)| f.projected_cases.get(&y).copied()),
                projected_deaths_final_year: forecast
                    .zip(final_year)
                    .and_then(|(f, y)| f.projected_deaths.get(&y).copied()),
                total_cases_averted: forecast.and_then(|f| f.cases_averted),
                total_deaths_averted: forecast.and_then(|f| f.deaths_averted),
                cost_per_case_averted: forecast.and_then(|f| f.cost_per_case_averted),
                cost_per_death_averted: forecast.and_then(|f| f.cost_per_death_averted),
            };

            // The first candidate seeds the running best so a lone
            // zero-impact scenario is still reported.
            if let Some(averted) = summary.total_cases_averted {
                if best_by_cases.as_ref().map_or(true, |(_, v)| averted > *v) {
                    best_by_cases = Some((scenario.scenario_id.clone(), averted));
                }
            }
            if let Some(ce) = summary.cost_per_case_averted {
                if best_by_ce.as_ref().map_or(true, |(_, v)| ce < *v) {
                    best_by_ce = Some((scenario.scenario_id.clone(), ce));
                }
            }

            summaries.push(summary);
        }

        ForecastComparison {
            project_id: project_id.to_string(),
            scenarios: summaries,
            best_by_cases_averted: best_by_cases.map(|(id, _)| id),
            best_by_cost_effectiveness: best_by_ce.map(|(id, _)| id),
        }
    }
}

fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator > 0.0 {
        Some(numerator / denominator)
    } else {
        None
    }
}

fn interval(point: f64, envelope: f64) -> UncertaintyInterval {
    UncertaintyInterval {
        lower: point * (1.0 - envelope),
        upper: point * (1.0 + envelope),
    }
}
