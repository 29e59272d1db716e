// ==========================================
// SNT Planner - Scenario Domain Model
// ==========================================
// Intervention scenarios, their cost items and cost summaries.
// Cost items are a wholesale-recomputed snapshot owned by the
// scenario; no partial updates.
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::types::{CostRecurrence, InterventionCode, ScenarioType};

// ==========================================
// Scenario
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub scenario_id: String,
    pub project_id: String,
    pub name: String,
    pub description: Option<String>,
    pub scenario_type: ScenarioType,
    /// admin_unit_code -> intervention package for that unit.
    pub interventions: BTreeMap<String, Vec<InterventionCode>>,
    /// At most one scenario per project may be selected.
    pub is_selected: bool,
    // Derived fields, written by cost / optimize / forecast runs.
    pub total_cost: Option<f64>,
    pub population_covered: Option<u64>,
    pub estimated_cases_averted: Option<f64>,
    pub estimated_deaths_averted: Option<f64>,
    pub created_at: NaiveDateTime,
}

/// Inputs for scenario creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioCreate {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub scenario_type: ScenarioType,
    pub interventions: BTreeMap<String, Vec<InterventionCode>>,
}

/// Partial scenario update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScenarioUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub interventions: Option<BTreeMap<String, Vec<InterventionCode>>>,
}

// ==========================================
// ScenarioCostItem - one (unit, intervention) cost line
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioCostItem {
    pub scenario_id: String,
    pub admin_unit_name: String,
    pub admin_unit_code: String,
    pub intervention_code: InterventionCode,
    /// USD per person (per year when recurring).
    pub unit_cost: f64,
    /// Persons covered: population * coverage/100, else population.
    pub quantity: f64,
    pub total_cost: f64,
    pub cost_category: String,
    pub recurrence: CostRecurrence,
    pub years: u32,
}

// ==========================================
// ScenarioCostSummary
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioCostSummary {
    pub scenario_id: String,
    pub scenario_name: String,
    pub total_cost: f64,
    pub cost_by_intervention: BTreeMap<InterventionCode, f64>,
    pub cost_by_unit: BTreeMap<String, f64>,
    /// None when total population is 0.
    pub cost_per_capita: Option<f64>,
    pub total_population: u64,
}

// ==========================================
// Scenario comparison
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioComparisonRow {
    pub scenario_id: String,
    pub name: String,
    pub scenario_type: ScenarioType,
    pub is_selected: bool,
    pub total_cost: Option<f64>,
    pub population_covered: Option<u64>,
    pub cases_averted: Option<f64>,
    pub deaths_averted: Option<f64>,
    pub cost_per_case_averted: Option<f64>,
    /// Rank by total cost ascending; None for scenarios without a
    /// computed cost (listed but excluded from ranking).
    pub cost_rank: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioComparison {
    pub project_id: String,
    pub scenarios: Vec<ScenarioComparisonRow>,
}
