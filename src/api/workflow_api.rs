// ==========================================
// SNT Planner - Workflow API
// ==========================================
// Responsibility: workflow queries and step transitions for a project.
// Mutations echo the refreshed workflow state so callers never render
// stale accessibility.
// ==========================================

use std::sync::Arc;

use tracing::info;

use crate::api::error::ApiResult;
use crate::domain::types::StepKey;
use crate::domain::workflow::{StepValidation, StepView, WorkflowStateView};
use crate::engine::{StepUpdate, ValidationContext, WorkflowEngine};
use crate::store::{ProjectStore, StoreError};

pub struct WorkflowApi {
    store: Arc<ProjectStore>,
    engine: WorkflowEngine,
}

impl WorkflowApi {
    pub fn new(store: Arc<ProjectStore>) -> Self {
        Self {
            store,
            engine: WorkflowEngine::new(),
        }
    }

    /// Full workflow snapshot with derived accessibility and progress.
    pub fn get_state(&self, project_id: &str) -> ApiResult<WorkflowStateView> {
        let steps = self.store.steps(project_id)?;
        Ok(self.engine.state_view(project_id, &steps))
    }

    pub fn get_step(&self, project_id: &str, step: StepKey) -> ApiResult<StepView> {
        let steps = self.store.steps(project_id)?;
        self.engine
            .step_view(step, &steps)
            .ok_or_else(|| StoreError::not_found("workflow_step", &step.to_string()).into())
    }

    /// Merge notes / completion / data into a step. Status is never
    /// changed here.
    pub fn update_step(
        &self,
        project_id: &str,
        step: StepKey,
        update: &StepUpdate,
    ) -> ApiResult<StepView> {
        let mut steps = self.store.steps(project_id)?;
        self.engine.update_step(&mut steps, step, update)?;
        self.store.save_steps(project_id, steps)?;
        self.get_step(project_id, step)
    }

    /// Run the step validator without transitioning anything.
    pub fn validate_step(&self, project_id: &str, step: StepKey) -> ApiResult<StepValidation> {
        let steps = self.store.steps(project_id)?;
        let ctx = self.validation_context(project_id)?;
        Ok(self.engine.validate_step(step, &steps, &ctx))
    }

    /// Complete a step; fails with PrerequisiteNotMet or Validation
    /// before any state is written.
    pub fn complete_step(&self, project_id: &str, step: StepKey) -> ApiResult<WorkflowStateView> {
        let mut steps = self.store.steps(project_id)?;
        let ctx = self.validation_context(project_id)?;
        self.engine.complete_step(&mut steps, step, &ctx)?;
        self.store.save_steps(project_id, steps)?;
        info!(project_id, step = %step, "workflow step completed");
        self.get_state(project_id)
    }

    /// Reopen a completed step back to InProgress.
    pub fn reopen_step(&self, project_id: &str, step: StepKey) -> ApiResult<WorkflowStateView> {
        let mut steps = self.store.steps(project_id)?;
        self.engine.reopen_step(&mut steps, step)?;
        self.store.save_steps(project_id, steps)?;
        info!(project_id, step = %step, "workflow step reopened");
        self.get_state(project_id)
    }

    /// Cross-entity facts for the step validators, pulled from the
    /// store.
    fn validation_context(&self, project_id: &str) -> ApiResult<ValidationContext> {
        let active = self.store.active_config(project_id)?;
        let results_exist = match &active {
            Some(config) => !self.store.results(project_id, &config.config_id)?.is_empty(),
            None => false,
        };
        Ok(ValidationContext {
            has_active_stratification_config: active.is_some(),
            stratification_results_exist: results_exist,
        })
    }
}
