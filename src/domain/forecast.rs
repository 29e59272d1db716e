// ==========================================
// SNT Planner - Forecast Domain Model
// ==========================================
// Baseline inputs, projected series and cost-effectiveness outputs.
// Multiple forecast runs per scenario are kept as history.
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::types::{ForecastStatus, InterventionCode};

// ==========================================
// BaselineData - pre-intervention epidemiology
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaselineData {
    pub baseline_cases: f64,
    pub baseline_deaths: f64,
    /// PfPR, percent.
    pub baseline_prevalence: f64,
    pub population: u64,
}

// ==========================================
// ForecastRequest
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastRequest {
    /// "simple" is the built-in transmission model; anything else is
    /// handled by an external modelling collaborator and left pending.
    pub model_type: String,
    pub projection_years: u32,
    /// Achieved coverage per intervention, 0..=1. Missing entries
    /// default to full coverage.
    #[serde(default)]
    pub coverage: BTreeMap<InterventionCode, f64>,
}

// ==========================================
// Uncertainty bounds
// ==========================================
// Fixed symmetric multiplicative envelope around point estimates, not
// a stochastic simulation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UncertaintyInterval {
    pub lower: f64,
    pub upper: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UncertaintyBounds {
    pub cases_averted: UncertaintyInterval,
    pub deaths_averted: UncertaintyInterval,
}

// ==========================================
// ForecastResult
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastResult {
    pub forecast_id: String,
    pub scenario_id: String,
    pub status: ForecastStatus,
    /// Populated when status is Failed.
    pub failure_reason: Option<String>,
    pub model_type: String,
    /// Projection year (1-based offset) -> value.
    pub projected_cases: BTreeMap<u32, f64>,
    pub projected_deaths: BTreeMap<u32, f64>,
    pub projected_prevalence: BTreeMap<u32, f64>,
    pub cases_averted: Option<f64>,
    pub deaths_averted: Option<f64>,
    pub dalys_averted: Option<f64>,
    /// None when the corresponding averted total is zero.
    pub cost_per_case_averted: Option<f64>,
    pub cost_per_death_averted: Option<f64>,
    pub cost_per_daly_averted: Option<f64>,
    pub uncertainty_bounds: Option<UncertaintyBounds>,
    pub created_at: NaiveDateTime,
}

// ==========================================
// Forecast comparison across scenarios
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastSummary {
    pub scenario_id: String,
    pub scenario_name: String,
    pub projected_cases_final_year: Option<f64>,
    pub projected_deaths_final_year: Option<f64>,
    pub total_cases_averted: Option<f64>,
    pub total_deaths_averted: Option<f64>,
    pub cost_per_case_averted: Option<f64>,
    pub cost_per_death_averted: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastComparison {
    pub project_id: String,
    pub scenarios: Vec<ForecastSummary>,
    pub best_by_cases_averted: Option<String>,
    pub best_by_cost_effectiveness: Option<String>,
}
