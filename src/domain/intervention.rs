// ==========================================
// SNT Planner - Intervention Domain Model
// ==========================================
// Decision trees (eligibility criteria + typed tailoring questions),
// recommendations and saved per-unit intervention plans.
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::domain::types::{InterventionCode, RiskLevel};

// ==========================================
// Eligibility criteria
// ==========================================
// Each criterion is a predicate over (risk_level, context). All
// criteria are always evaluated so ineligibility reasons are complete.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "criterion", rename_all = "snake_case")]
pub enum EligibilityCriterion {
    /// Risk level must be one of the listed levels.
    RiskLevel { levels: Vec<RiskLevel> },
    /// Context "seasonality" must match (passes when absent).
    Seasonality { required: String },
    /// Context "setting" must be one of the listed values (passes when
    /// absent).
    Setting { settings: Vec<String> },
}

// ==========================================
// Tailoring questions (tagged by question type)
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TailoringOption {
    pub value: String,
    pub label: String,
    /// Context conditions gating this option, e.g.
    /// pyrethroid_resistance_pct -> ">40". Empty = always available.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub conditions: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "question_type", rename_all = "snake_case")]
pub enum QuestionKind {
    Select {
        options: Vec<TailoringOption>,
        #[serde(skip_serializing_if = "Option::is_none")]
        default: Option<String>,
    },
    Numeric {
        min_value: f64,
        max_value: f64,
        #[serde(skip_serializing_if = "Option::is_none")]
        default: Option<f64>,
    },
    Boolean {
        #[serde(skip_serializing_if = "Option::is_none")]
        default: Option<bool>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TailoringQuestion {
    pub id: String,
    pub question: String,
    #[serde(flatten)]
    pub kind: QuestionKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
}

// ==========================================
// InterventionDecisionTree - static per intervention
// ==========================================
#[derive(Debug, Clone, Serialize)]
pub struct InterventionDecisionTree {
    pub intervention_code: InterventionCode,
    pub intervention_name: &'static str,
    pub eligibility_criteria: Vec<EligibilityCriterion>,
    pub tailoring_questions: Vec<TailoringQuestion>,
}

// ==========================================
// InterventionRecommendation - ephemeral, recomputed per request
// ==========================================
#[derive(Debug, Clone, Serialize)]
pub struct InterventionRecommendation {
    pub intervention_code: InterventionCode,
    pub intervention_name: &'static str,
    pub is_eligible: bool,
    /// All failing criteria, never truncated at the first failure.
    pub ineligibility_reasons: Vec<String>,
    /// Context-filtered questions (eligible interventions only).
    pub tailoring_questions: Vec<TailoringQuestion>,
    /// Defaults computed from risk level and context.
    pub default_recommendations: BTreeMap<String, Value>,
}

// ==========================================
// InterventionPlan - chosen intervention per admin unit
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterventionPlan {
    pub plan_id: String,
    pub project_id: String,
    pub admin_unit_name: String,
    pub admin_unit_code: String,
    pub intervention_code: InterventionCode,
    pub tailoring_decisions: Option<Value>,
    /// Coverage target in percent (0..=100), feeds cost quantities.
    pub coverage_target: Option<f64>,
    pub target_population: Option<u64>,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
}

/// Inputs for plan creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterventionPlanCreate {
    pub admin_unit_name: String,
    pub admin_unit_code: String,
    pub intervention_code: InterventionCode,
    #[serde(default)]
    pub tailoring_decisions: Option<Value>,
    #[serde(default)]
    pub coverage_target: Option<f64>,
    #[serde(default)]
    pub target_population: Option<u64>,
    #[serde(default)]
    pub notes: Option<String>,
    /// Risk level of the unit, used when plan eligibility enforcement
    /// is active.
    #[serde(default)]
    pub risk_level: Option<RiskLevel>,
    /// Context for eligibility enforcement (seasonality, setting, ...).
    #[serde(default)]
    pub context: BTreeMap<String, Value>,
}
