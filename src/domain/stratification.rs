// ==========================================
// SNT Planner - Stratification Domain Model
// ==========================================
// Threshold configurations, per-unit classification results and the
// GeoJSON output shape for map display.
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::domain::types::{InterventionCode, RiskLevel, StratificationMetric};

// ==========================================
// ThresholdRange
// ==========================================
// Lower-inclusive, upper-exclusive. The high range is open-ended: its
// configured max documents the expected metric scale but does not cap
// classification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdRange {
    pub min_value: f64,
    pub max_value: f64,
}

impl ThresholdRange {
    pub fn new(min_value: f64, max_value: f64) -> Self {
        Self {
            min_value,
            max_value,
        }
    }
}

/// Risk level -> range mapping. BTreeMap keeps level order stable in
/// serialized output.
pub type ThresholdMap = BTreeMap<RiskLevel, ThresholdRange>;

// ==========================================
// StratificationConfig
// ==========================================
// Invariant (enforced at creation): the four ranges tile [0, +inf)
// with no gap and no overlap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StratificationConfig {
    pub config_id: String,
    pub project_id: String,
    pub name: String,
    pub metric: StratificationMetric,
    pub thresholds: ThresholdMap,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
}

// ==========================================
// AdminUnitRow - one classification input row
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminUnitRow {
    pub admin_unit_name: String,
    pub admin_unit_code: String,
    pub metric_value: f64,
    pub population: Option<u64>,
    pub cases_annual: Option<u64>,
    pub deaths_annual: Option<u64>,
}

// ==========================================
// StratificationResult - immutable classification snapshot
// ==========================================
// Recalculation replaces the config's whole result set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StratificationResult {
    pub result_id: String,
    pub config_id: String,
    pub admin_unit_name: String,
    pub admin_unit_code: String,
    pub metric_value: f64,
    pub risk_level: RiskLevel,
    pub population: Option<u64>,
    pub cases_annual: Option<u64>,
    pub deaths_annual: Option<u64>,
    /// Display-only eligibility preview; costing re-evaluates
    /// independently through the decision engine.
    pub eligible_interventions: Vec<InterventionCode>,
}

// ==========================================
// StratificationSummary
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StratificationSummary {
    pub config_id: String,
    pub config_name: String,
    pub metric: StratificationMetric,
    pub total_units: usize,
    pub risk_distribution: BTreeMap<RiskLevel, usize>,
    pub total_population: u64,
    pub total_cases: u64,
}

// ==========================================
// GeoJSON output types
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoFeatureCollection {
    /// Always "FeatureCollection".
    pub r#type: String,
    pub features: Vec<GeoFeature>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoFeature {
    /// Always "Feature".
    pub r#type: String,
    /// Raw GeoJSON geometry as supplied by the data store.
    pub geometry: Value,
    pub properties: GeoProperties,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoProperties {
    pub unit_name: String,
    pub unit_code: String,
    pub risk_level: RiskLevel,
    pub metric_value: f64,
    pub population: Option<u64>,
    pub cases_annual: Option<u64>,
    pub deaths_annual: Option<u64>,
    pub eligible_interventions: Vec<InterventionCode>,
}
