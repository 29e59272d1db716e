// ==========================================
// SNT Planner - Intervention API
// ==========================================
// Responsibility: decision tree queries, per-unit recommendations and
// intervention plan management.
// Policy: plan creation checks engine eligibility when the configured
// plan policy enforces it; rejections carry the engine's reasons.
// ==========================================

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::api::error::{ApiError, ApiResult};
use crate::config::EngineSettings;
use crate::domain::intervention::{
    InterventionDecisionTree, InterventionPlan, InterventionPlanCreate, InterventionRecommendation,
};
use crate::domain::types::{InterventionCode, RiskLevel};
use crate::engine::{DecisionContext, InterventionDecisionEngine};
use crate::store::ProjectStore;

pub struct InterventionApi {
    store: Arc<ProjectStore>,
    engine: Arc<InterventionDecisionEngine>,
    settings: Arc<EngineSettings>,
}

impl InterventionApi {
    pub fn new(
        store: Arc<ProjectStore>,
        engine: Arc<InterventionDecisionEngine>,
        settings: Arc<EngineSettings>,
    ) -> Self {
        Self {
            store,
            engine,
            settings,
        }
    }

    pub fn decision_tree(&self, code: InterventionCode) -> ApiResult<InterventionDecisionTree> {
        self.engine
            .decision_tree(code)
            .cloned()
            .ok_or_else(|| ApiError::not_found("decision_tree", code.as_str()))
    }

    pub fn all_decision_trees(&self) -> Vec<InterventionDecisionTree> {
        self.engine.all_decision_trees().to_vec()
    }

    /// Evaluate every catalog intervention for one unit's risk level
    /// and context.
    pub fn get_recommendations(
        &self,
        risk_level: RiskLevel,
        context: &DecisionContext,
    ) -> Vec<InterventionRecommendation> {
        self.engine.recommendations(risk_level, context)
    }

    /// Persist an intervention choice for an admin unit.
    pub fn create_plan(
        &self,
        project_id: &str,
        create: InterventionPlanCreate,
    ) -> ApiResult<InterventionPlan> {
        if let Some(coverage) = create.coverage_target {
            if !(0.0..=100.0).contains(&coverage) {
                return Err(ApiError::InvalidInput(format!(
                    "coverage_target must be within [0, 100] (got {})",
                    coverage
                )));
            }
        }

        if self.settings.plan_policy.enforce_eligibility {
            self.check_plan_eligibility(&create)?;
        }

        let plan = InterventionPlan {
            plan_id: Uuid::new_v4().to_string(),
            project_id: project_id.to_string(),
            admin_unit_name: create.admin_unit_name,
            admin_unit_code: create.admin_unit_code,
            intervention_code: create.intervention_code,
            tailoring_decisions: create.tailoring_decisions,
            coverage_target: create.coverage_target,
            target_population: create.target_population,
            notes: create.notes,
            created_at: Utc::now().naive_utc(),
        };
        self.store.insert_plan(plan.clone())?;
        info!(
            project_id,
            plan_id = %plan.plan_id,
            unit = %plan.admin_unit_code,
            intervention = %plan.intervention_code,
            "intervention plan created"
        );
        Ok(plan)
    }

    pub fn list_plans(&self, project_id: &str) -> ApiResult<Vec<InterventionPlan>> {
        Ok(self.store.list_plans(project_id)?)
    }

    pub fn delete_plan(&self, project_id: &str, plan_id: &str) -> ApiResult<()> {
        self.store.delete_plan(project_id, plan_id)?;
        info!(project_id, plan_id, "intervention plan deleted");
        Ok(())
    }

    /// Eligibility gate for plan creation. Without a risk level there
    /// is nothing to evaluate against; the plan is admitted (matching
    /// the engine's insufficient-data-passes rule).
    fn check_plan_eligibility(&self, create: &InterventionPlanCreate) -> ApiResult<()> {
        let Some(risk_level) = create.risk_level else {
            warn!(
                unit = %create.admin_unit_code,
                intervention = %create.intervention_code,
                "plan created without risk level; eligibility not enforced"
            );
            return Ok(());
        };

        let recommendation = self
            .engine
            .recommendation(create.intervention_code, risk_level, &create.context)
            .ok_or_else(|| {
                ApiError::not_found("decision_tree", create.intervention_code.as_str())
            })?;
        if !recommendation.is_eligible {
            return Err(ApiError::validation(recommendation.ineligibility_reasons));
        }
        Ok(())
    }
}
