// ==========================================
// SNT Planner - Intervention Decision Engine
// ==========================================
// Eligibility evaluation and tailoring of the WHO intervention
// catalog against a unit's risk level and context.
// Rule: deterministic; all criteria are evaluated so ineligibility
// reasons are complete, never truncated at the first failure.
// ==========================================

use std::collections::BTreeMap;

use serde_json::{json, Value};
use tracing::debug;

use crate::domain::intervention::{
    EligibilityCriterion, InterventionDecisionTree, InterventionRecommendation, QuestionKind,
    TailoringQuestion,
};
use crate::domain::types::{InterventionCode, RiskLevel};
use crate::engine::decision_trees;

/// Context keys: seasonality, setting, pyrethroid_resistance_pct, ...
pub type DecisionContext = BTreeMap<String, Value>;

// ==========================================
// InterventionDecisionEngine
// ==========================================
pub struct InterventionDecisionEngine {
    catalog: Vec<InterventionDecisionTree>,
}

impl InterventionDecisionEngine {
    /// Engine over the built-in WHO catalog.
    pub fn new() -> Self {
        Self {
            catalog: decision_trees::catalog(),
        }
    }

    /// Engine over a custom catalog (country adaptations).
    pub fn with_catalog(catalog: Vec<InterventionDecisionTree>) -> Self {
        Self { catalog }
    }

    pub fn decision_tree(&self, code: InterventionCode) -> Option<&InterventionDecisionTree> {
        self.catalog
            .iter()
            .find(|t| t.intervention_code == code)
    }

    pub fn all_decision_trees(&self) -> &[InterventionDecisionTree] {
        &self.catalog
    }

    // ==========================================
    // Recommendations
    // ==========================================

    /// Evaluate every catalog intervention for one unit.
    ///
    /// Identical (risk_level, context) inputs always produce an
    /// identical recommendation set.
    pub fn recommendations(
        &self,
        risk_level: RiskLevel,
        context: &DecisionContext,
    ) -> Vec<InterventionRecommendation> {
        self.catalog
            .iter()
            .map(|tree| self.recommend(tree, risk_level, context))
            .collect()
    }

    /// Evaluate a single intervention.
    pub fn recommendation(
        &self,
        code: InterventionCode,
        risk_level: RiskLevel,
        context: &DecisionContext,
    ) -> Option<InterventionRecommendation> {
        self.decision_tree(code)
            .map(|tree| self.recommend(tree, risk_level, context))
    }

    /// Codes eligible for a unit, in catalog order. Display helper for
    /// stratification results.
    pub fn eligible_codes(
        &self,
        risk_level: RiskLevel,
        context: &DecisionContext,
    ) -> Vec<InterventionCode> {
        self.catalog
            .iter()
            .filter(|tree| {
                self.check_eligibility(&tree.eligibility_criteria, risk_level, context)
                    .is_empty()
            })
            .map(|tree| tree.intervention_code)
            .collect()
    }

    fn recommend(
        &self,
        tree: &InterventionDecisionTree,
        risk_level: RiskLevel,
        context: &DecisionContext,
    ) -> InterventionRecommendation {
        let reasons = self.check_eligibility(&tree.eligibility_criteria, risk_level, context);

        if !reasons.is_empty() {
            debug!(
                intervention = %tree.intervention_code,
                risk_level = %risk_level,
                reasons = reasons.len(),
                "intervention ineligible"
            );
            return InterventionRecommendation {
                intervention_code: tree.intervention_code,
                intervention_name: tree.intervention_name,
                is_eligible: false,
                ineligibility_reasons: reasons,
                tailoring_questions: Vec::new(),
                default_recommendations: BTreeMap::new(),
            };
        }

        InterventionRecommendation {
            intervention_code: tree.intervention_code,
            intervention_name: tree.intervention_name,
            is_eligible: true,
            ineligibility_reasons: Vec::new(),
            tailoring_questions: self.filter_questions(&tree.tailoring_questions, context),
            default_recommendations: self.defaults(tree.intervention_code, risk_level, context),
        }
    }

    // ==========================================
    // Eligibility (logical AND over all criteria)
    // ==========================================

    /// Returns one reason per failing criterion; empty means eligible.
    /// Every criterion is evaluated regardless of earlier failures.
    fn check_eligibility(
        &self,
        criteria: &[EligibilityCriterion],
        risk_level: RiskLevel,
        context: &DecisionContext,
    ) -> Vec<String> {
        let mut reasons = Vec::new();

        for criterion in criteria {
            match criterion {
                EligibilityCriterion::RiskLevel { levels } => {
                    if !levels.contains(&risk_level) {
                        let required: Vec<&str> =
                            levels.iter().map(|l| l.as_str()).collect();
                        reasons.push(format!(
                            "Risk level '{}' not eligible (requires: {})",
                            risk_level,
                            required.join(", ")
                        ));
                    }
                }
                EligibilityCriterion::Seasonality { required } => {
                    // Missing context is not ineligibility.
                    if let Some(actual) = context.get("seasonality").and_then(Value::as_str) {
                        if actual != required {
                            reasons.push(format!(
                                "Requires {} transmission (found: {})",
                                required, actual
                            ));
                        }
                    }
                }
                EligibilityCriterion::Setting { settings } => {
                    if let Some(actual) = context.get("setting").and_then(Value::as_str) {
                        if !settings.iter().any(|s| s == actual) {
                            reasons.push(format!(
                                "Setting '{}' not eligible (requires: {})",
                                actual,
                                settings.join(", ")
                            ));
                        }
                    }
                }
            }
        }

        reasons
    }

    // ==========================================
    // Question filtering
    // ==========================================

    /// Drop select options whose conditions fail against the context.
    /// If every option of a question would be filtered out, the full
    /// list is kept rather than presenting an empty choice.
    fn filter_questions(
        &self,
        questions: &[TailoringQuestion],
        context: &DecisionContext,
    ) -> Vec<TailoringQuestion> {
        questions
            .iter()
            .map(|q| match &q.kind {
                QuestionKind::Select { options, default } => {
                    let available: Vec<_> = options
                        .iter()
                        .filter(|opt| self.conditions_hold(&opt.conditions, context))
                        .cloned()
                        .collect();
                    let options = if available.is_empty() {
                        options.clone()
                    } else {
                        available
                    };
                    TailoringQuestion {
                        id: q.id.clone(),
                        question: q.question.clone(),
                        kind: QuestionKind::Select {
                            options,
                            default: default.clone(),
                        },
                        help_text: q.help_text.clone(),
                    }
                }
                _ => q.clone(),
            })
            .collect()
    }

    /// Condition grammar: ">N" / "<N" numeric comparison, anything
    /// else exact string match. A key absent from the context passes.
    fn conditions_hold(&self, conditions: &BTreeMap<String, String>, context: &DecisionContext) -> bool {
        for (key, required) in conditions {
            let Some(actual) = context.get(key) else {
                continue;
            };
            if let Some(threshold) = required.strip_prefix('>') {
                match (actual.as_f64(), threshold.parse::<f64>()) {
                    (Some(a), Ok(t)) if a > t => {}
                    _ => return false,
                }
            } else if let Some(threshold) = required.strip_prefix('<') {
                match (actual.as_f64(), threshold.parse::<f64>()) {
                    (Some(a), Ok(t)) if a < t => {}
                    _ => return false,
                }
            } else if actual.as_str() != Some(required.as_str()) {
                return false;
            }
        }
        true
    }

    // ==========================================
    // Default answers (risk level x context lookup)
    // ==========================================

    fn defaults(
        &self,
        code: InterventionCode,
        risk_level: RiskLevel,
        context: &DecisionContext,
    ) -> BTreeMap<String, Value> {
        let mut defaults = BTreeMap::new();

        match code {
            InterventionCode::Itn => {
                let resistance = context
                    .get("pyrethroid_resistance_pct")
                    .and_then(Value::as_f64)
                    .unwrap_or(0.0);
                let itn_type = if resistance > 60.0 {
                    "dual_ai_llin"
                } else if resistance > 40.0 {
                    "pbo_llin"
                } else {
                    "standard_llin"
                };
                defaults.insert("itn_type".to_string(), json!(itn_type));
                defaults.insert("distribution_strategy".to_string(), json!("hybrid"));
                defaults.insert("coverage_target".to_string(), json!(80));
            }
            InterventionCode::Irs => {
                defaults.insert("spray_rounds".to_string(), json!(1));
                let targeting = if risk_level == RiskLevel::High {
                    "universal"
                } else {
                    "targeted_high_risk"
                };
                defaults.insert("geographic_targeting".to_string(), json!(targeting));
            }
            InterventionCode::Smc => {
                defaults.insert("target_age".to_string(), json!("3_59_months"));
                defaults.insert("num_cycles".to_string(), json!(4));
                defaults.insert("delivery_strategy".to_string(), json!("door_to_door"));
            }
            InterventionCode::Vaccine => {
                defaults.insert("vaccine_product".to_string(), json!("r21"));
                defaults.insert("delivery_platform".to_string(), json!("epi_routine"));
                defaults.insert("age_first_dose".to_string(), json!(5));
            }
            InterventionCode::Cm => {
                defaults.insert("diagnostic_approach".to_string(), json!("rdt"));
                defaults.insert("community_case_mgmt".to_string(), json!(true));
            }
            _ => {}
        }

        defaults
    }
}

impl Default for InterventionDecisionEngine {
    fn default() -> Self {
        Self::new()
    }
}
