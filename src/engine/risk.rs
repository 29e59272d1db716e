// ==========================================
// SNT Planner - Risk Classification Engine
// ==========================================
// Threshold-based risk stratification of administrative units.
// Input: metric values + threshold configuration
// Output: risk levels, result rows, summary, GeoJSON join
// Rule: stateless, no side effects; every rejection carries reasons.
// ==========================================

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::domain::stratification::{
    AdminUnitRow, GeoFeature, GeoFeatureCollection, GeoProperties, StratificationConfig,
    StratificationResult, StratificationSummary, ThresholdMap,
};
use crate::domain::types::RiskLevel;
use crate::engine::decision::InterventionDecisionEngine;

// ==========================================
// RiskClassifier
// ==========================================
pub struct RiskClassifier;

impl RiskClassifier {
    pub fn new() -> Self {
        Self
    }

    // ==========================================
    // Threshold validation (config-creation time)
    // ==========================================

    /// Check the tiling invariant: the four ranges must cover [0, +inf)
    /// with no gap and no overlap.
    ///
    /// Rules:
    /// 1. All four risk levels present
    /// 2. Each range has min < max
    /// 3. very_low starts at 0
    /// 4. Each range starts exactly where the previous one ends
    ///
    /// Returns every violation, not just the first.
    pub fn validate_thresholds(&self, thresholds: &ThresholdMap) -> Vec<String> {
        let mut violations = Vec::new();

        for level in RiskLevel::ALL {
            match thresholds.get(&level) {
                None => violations.push(format!("Missing threshold range for '{}'", level)),
                Some(range) => {
                    if !range.min_value.is_finite() || !range.max_value.is_finite() {
                        violations.push(format!(
                            "Range for '{}' must be finite (got [{}, {}))",
                            level, range.min_value, range.max_value
                        ));
                    } else if range.min_value >= range.max_value {
                        violations.push(format!(
                            "Range for '{}' must have min < max (got [{}, {}))",
                            level, range.min_value, range.max_value
                        ));
                    }
                }
            }
        }

        // Tiling checks only make sense once all ranges are well-formed.
        if !violations.is_empty() {
            return violations;
        }

        let first = &thresholds[&RiskLevel::VeryLow];
        if first.min_value != 0.0 {
            violations.push(format!(
                "Range for 'very_low' must start at 0 (got {})",
                first.min_value
            ));
        }

        for pair in RiskLevel::ALL.windows(2) {
            let (lo, hi) = (pair[0], pair[1]);
            let prev = &thresholds[&lo];
            let next = &thresholds[&hi];
            if next.min_value > prev.max_value {
                violations.push(format!(
                    "Gap between '{}' and '{}': [{}, {}) then [{}, {})",
                    lo, hi, prev.min_value, prev.max_value, next.min_value, next.max_value
                ));
            } else if next.min_value < prev.max_value {
                violations.push(format!(
                    "Overlap between '{}' and '{}': [{}, {}) then [{}, {})",
                    lo, hi, prev.min_value, prev.max_value, next.min_value, next.max_value
                ));
            }
        }

        violations
    }

    // ==========================================
    // Classification
    // ==========================================

    /// Map a metric value to a risk level.
    ///
    /// Precedence order is fixed: very_low -> low -> moderate -> high,
    /// first matching range wins. Ranges are lower-inclusive and
    /// upper-exclusive, so a shared boundary belongs to the higher-risk
    /// range. The high range is open-ended above its minimum, keeping
    /// the tiling of [0, +inf) total.
    ///
    /// With a validated configuration exactly one level matches any
    /// value >= 0.
    pub fn classify(&self, value: f64, thresholds: &ThresholdMap) -> RiskLevel {
        for level in RiskLevel::ALL {
            if let Some(range) = thresholds.get(&level) {
                let contains = if level == RiskLevel::High {
                    value >= range.min_value
                } else {
                    value >= range.min_value && value < range.max_value
                };
                if contains {
                    return level;
                }
            }
        }
        // Unreachable for validated configs; values below 0 or against
        // a partial map conservatively classify as high.
        RiskLevel::High
    }

    // ==========================================
    // Batch calculation
    // ==========================================

    /// Classify a batch of admin-unit rows against a configuration.
    ///
    /// eligible_interventions is populated via the decision engine for
    /// display purposes only; costing re-evaluates independently.
    pub fn calculate(
        &self,
        config: &StratificationConfig,
        rows: &[AdminUnitRow],
        decision_engine: &InterventionDecisionEngine,
    ) -> Vec<StratificationResult> {
        debug!(
            config_id = %config.config_id,
            metric = %config.metric,
            rows = rows.len(),
            "calculating stratification"
        );

        rows.iter()
            .map(|row| {
                let risk_level = self.classify(row.metric_value, &config.thresholds);
                let eligible =
                    decision_engine.eligible_codes(risk_level, &BTreeMap::new());
                StratificationResult {
                    result_id: Uuid::new_v4().to_string(),
                    config_id: config.config_id.clone(),
                    admin_unit_name: row.admin_unit_name.clone(),
                    admin_unit_code: row.admin_unit_code.clone(),
                    metric_value: row.metric_value,
                    risk_level,
                    population: row.population,
                    cases_annual: row.cases_annual,
                    deaths_annual: row.deaths_annual,
                    eligible_interventions: eligible,
                }
            })
            .collect()
    }

    /// Summary statistics over a result set.
    pub fn summarize(
        &self,
        config: &StratificationConfig,
        results: &[StratificationResult],
    ) -> StratificationSummary {
        let mut risk_distribution: BTreeMap<RiskLevel, usize> = BTreeMap::new();
        let mut total_population = 0u64;
        let mut total_cases = 0u64;

        for r in results {
            *risk_distribution.entry(r.risk_level).or_insert(0) += 1;
            total_population += r.population.unwrap_or(0);
            total_cases += r.cases_annual.unwrap_or(0);
        }

        StratificationSummary {
            config_id: config.config_id.clone(),
            config_name: config.name.clone(),
            metric: config.metric,
            total_units: results.len(),
            risk_distribution,
            total_population,
            total_cases,
        }
    }

    // ==========================================
    // GeoJSON export
    // ==========================================

    /// Join results to unit geometry by admin_unit_code.
    ///
    /// A unit with no matching geometry fails the whole export; the
    /// error lists every missing unit code rather than silently
    /// omitting rows.
    pub fn to_geojson(
        &self,
        results: &[StratificationResult],
        geometries: &BTreeMap<String, Value>,
    ) -> Result<GeoFeatureCollection, Vec<String>> {
        let missing: Vec<String> = results
            .iter()
            .filter(|r| !geometries.contains_key(&r.admin_unit_code))
            .map(|r| r.admin_unit_code.clone())
            .collect();
        if !missing.is_empty() {
            return Err(missing);
        }

        let features = results
            .iter()
            .map(|r| GeoFeature {
                r#type: "Feature".to_string(),
                geometry: geometries[&r.admin_unit_code].clone(),
                properties: GeoProperties {
                    unit_name: r.admin_unit_name.clone(),
                    unit_code: r.admin_unit_code.clone(),
                    risk_level: r.risk_level,
                    metric_value: r.metric_value,
                    population: r.population,
                    cases_annual: r.cases_annual,
                    deaths_annual: r.deaths_annual,
                    eligible_interventions: r.eligible_interventions.clone(),
                },
            })
            .collect();

        Ok(GeoFeatureCollection {
            r#type: "FeatureCollection".to_string(),
            features,
        })
    }
}

impl Default for RiskClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::stratification::ThresholdRange;
    use serde_json::json;

    fn standard_thresholds() -> ThresholdMap {
        let mut t = ThresholdMap::new();
        t.insert(RiskLevel::VeryLow, ThresholdRange::new(0.0, 1.0));
        t.insert(RiskLevel::Low, ThresholdRange::new(1.0, 5.0));
        t.insert(RiskLevel::Moderate, ThresholdRange::new(5.0, 25.0));
        t.insert(RiskLevel::High, ThresholdRange::new(25.0, 100.0));
        t
    }

    #[test]
    fn test_classify_boundary_and_interior_values() {
        let c = RiskClassifier::new();
        let t = standard_thresholds();
        assert_eq!(c.classify(0.0, &t), RiskLevel::VeryLow);
        assert_eq!(c.classify(3.0, &t), RiskLevel::Low);
        // Shared boundary goes to the higher-risk range.
        assert_eq!(c.classify(5.0, &t), RiskLevel::Moderate);
        assert_eq!(c.classify(25.0, &t), RiskLevel::High);
        // High is open-ended above its minimum.
        assert_eq!(c.classify(100.0, &t), RiskLevel::High);
        assert_eq!(c.classify(5000.0, &t), RiskLevel::High);
    }

    #[test]
    fn test_classify_returns_exactly_one_level_across_domain() {
        let c = RiskClassifier::new();
        let t = standard_thresholds();
        // Sample the domain densely; every value must land in exactly
        // one containing range under the engine's semantics.
        let mut v = 0.0;
        while v < 200.0 {
            let level = c.classify(v, &t);
            let mut matches = 0;
            for l in RiskLevel::ALL {
                let r = &t[&l];
                let contains = if l == RiskLevel::High {
                    v >= r.min_value
                } else {
                    v >= r.min_value && v < r.max_value
                };
                if contains {
                    matches += 1;
                    assert_eq!(level, l);
                }
            }
            assert_eq!(matches, 1, "value {} matched {} ranges", v, matches);
            v += 0.37;
        }
    }

    #[test]
    fn test_validate_accepts_tiling_config() {
        let c = RiskClassifier::new();
        assert!(c.validate_thresholds(&standard_thresholds()).is_empty());
    }

    #[test]
    fn test_validate_rejects_gap_and_overlap() {
        let c = RiskClassifier::new();

        let mut gap = standard_thresholds();
        gap.insert(RiskLevel::Moderate, ThresholdRange::new(6.0, 25.0));
        let violations = c.validate_thresholds(&gap);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].contains("Gap"));

        let mut overlap = standard_thresholds();
        overlap.insert(RiskLevel::Low, ThresholdRange::new(0.5, 5.0));
        let violations = c.validate_thresholds(&overlap);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].contains("Overlap"));
    }

    #[test]
    fn test_validate_collects_all_violations() {
        let c = RiskClassifier::new();
        let mut t = ThresholdMap::new();
        t.insert(RiskLevel::VeryLow, ThresholdRange::new(1.0, 0.5));
        let violations = c.validate_thresholds(&t);
        // Three missing levels plus one inverted range.
        assert_eq!(violations.len(), 4);
    }

    #[test]
    fn test_validate_rejects_nonzero_start() {
        let c = RiskClassifier::new();
        let mut t = standard_thresholds();
        t.insert(RiskLevel::VeryLow, ThresholdRange::new(0.5, 1.0));
        let violations = c.validate_thresholds(&t);
        assert!(violations.iter().any(|v| v.contains("start at 0")));
    }

    #[test]
    fn test_calculate_attaches_demographics_and_eligibility() {
        let c = RiskClassifier::new();
        let engine = InterventionDecisionEngine::new();
        let config = StratificationConfig {
            config_id: "cfg-1".to_string(),
            project_id: "p-1".to_string(),
            name: "National PfPR".to_string(),
            metric: crate::domain::types::StratificationMetric::Pfpr,
            thresholds: standard_thresholds(),
            is_active: true,
            created_at: chrono::Utc::now().naive_utc(),
        };
        let rows = vec![AdminUnitRow {
            admin_unit_name: "North District".to_string(),
            admin_unit_code: "ND".to_string(),
            metric_value: 12.0,
            population: Some(150_000),
            cases_annual: Some(9_000),
            deaths_annual: Some(40),
        }];

        let results = c.calculate(&config, &rows, &engine);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].risk_level, RiskLevel::Moderate);
        assert_eq!(results[0].population, Some(150_000));
        // Case management is universally eligible.
        assert!(results[0]
            .eligible_interventions
            .contains(&crate::domain::types::InterventionCode::Cm));
    }

    #[test]
    fn test_geojson_fails_whole_export_on_missing_geometry() {
        let c = RiskClassifier::new();
        let result = StratificationResult {
            result_id: "r1".to_string(),
            config_id: "cfg-1".to_string(),
            admin_unit_name: "North District".to_string(),
            admin_unit_code: "ND".to_string(),
            metric_value: 2.0,
            risk_level: RiskLevel::Low,
            population: None,
            cases_annual: None,
            deaths_annual: None,
            eligible_interventions: vec![],
        };
        let mut with_geom = result.clone();
        with_geom.admin_unit_code = "SD".to_string();

        let mut geometries = BTreeMap::new();
        geometries.insert(
            "SD".to_string(),
            json!({"type": "Point", "coordinates": [1.0, 2.0]}),
        );

        let err = c
            .to_geojson(&[result.clone(), with_geom.clone()], &geometries)
            .unwrap_err();
        assert_eq!(err, vec!["ND".to_string()]);

        let ok = c.to_geojson(&[with_geom], &geometries).unwrap();
        assert_eq!(ok.features.len(), 1);
        assert_eq!(ok.r#type, "FeatureCollection");
    }
}
