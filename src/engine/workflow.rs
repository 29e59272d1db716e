// ==========================================
// SNT Planner - Workflow Engine
// ==========================================
// Step-gating state machine over the 10 SNT planning steps.
// Rule: accessibility is recomputed from current statuses and the
// prerequisite graph on every read, never stored. Validation is
// independent of status transitions.
// ==========================================

use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use crate::domain::types::{PrerequisiteType, StepKey, StepStatus};
use crate::domain::workflow::{
    prerequisites_of, StepValidation, StepView, WorkflowStateView, WorkflowStepState,
};

/// Per-project step states, keyed by step.
pub type StepMap = BTreeMap<StepKey, WorkflowStepState>;

// ==========================================
// Requests and errors
// ==========================================

/// Partial step update; absent fields are left untouched. Never
/// changes status.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StepUpdate {
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub completion_percentage: Option<f64>,
    #[serde(default)]
    pub data: Option<Value>,
}

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("prerequisite not met for step {step}: {unmet:?}")]
    PrerequisiteNotMet { step: StepKey, unmet: Vec<StepKey> },

    #[error("step {step} cannot be completed: {errors:?}")]
    ValidationFailed { step: StepKey, errors: Vec<String> },

    #[error("invalid step transition: from={from} to={to}")]
    InvalidTransition { from: StepStatus, to: StepStatus },

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Cross-entity facts the step validators need, assembled by the
/// caller from the data store.
#[derive(Debug, Clone, Default)]
pub struct ValidationContext {
    pub has_active_stratification_config: bool,
    pub stratification_results_exist: bool,
}

// ==========================================
// WorkflowEngine
// ==========================================
pub struct WorkflowEngine;

impl WorkflowEngine {
    pub fn new() -> Self {
        Self
    }

    /// All 10 step states at project creation, NotStarted.
    pub fn init_steps(&self) -> StepMap {
        StepKey::ORDER
            .iter()
            .map(|k| (*k, WorkflowStepState::new(*k)))
            .collect()
    }

    // ==========================================
    // Derived accessibility
    // ==========================================

    /// Unmet prerequisites of a step: (blocking, non_blocking).
    pub fn unmet_prerequisites(
        &self,
        step: StepKey,
        steps: &StepMap,
    ) -> (Vec<StepKey>, Vec<StepKey>) {
        let mut blocking = Vec::new();
        let mut non_blocking = Vec::new();

        for (prereq, kind) in prerequisites_of(step) {
            let completed = steps
                .get(prereq)
                .map(|s| s.status == StepStatus::Completed)
                .unwrap_or(false);
            if !completed {
                match kind {
                    PrerequisiteType::Blocking => blocking.push(*prereq),
                    PrerequisiteType::NonBlocking => non_blocking.push(*prereq),
                }
            }
        }

        (blocking, non_blocking)
    }

    /// Pure: true iff every blocking prerequisite is completed.
    pub fn is_accessible(&self, step: StepKey, steps: &StepMap) -> bool {
        self.unmet_prerequisites(step, steps).0.is_empty()
    }

    // ==========================================
    // Views
    // ==========================================

    pub fn step_view(&self, step: StepKey, steps: &StepMap) -> Option<StepView> {
        let state = steps.get(&step)?;
        let (blocking, non_blocking) = self.unmet_prerequisites(step, steps);
        Some(StepView {
            step,
            label: step.label(),
            status: state.status,
            completion_percentage: state.completion_percentage,
            is_accessible: blocking.is_empty(),
            blocking_prerequisites: blocking,
            non_blocking_prerequisites: non_blocking,
            notes: state.notes.clone(),
            data: state.data.clone(),
            completed_at: state.completed_at,
            validation: state.validation.clone(),
        })
    }

    /// Full workflow snapshot: per-step views, overall progress and
    /// the current step.
    pub fn state_view(&self, project_id: &str, steps: &StepMap) -> WorkflowStateView {
        let views: Vec<StepView> = StepKey::ORDER
            .iter()
            .filter_map(|k| self.step_view(*k, steps))
            .collect();

        let current_step = views
            .iter()
            .find(|v| v.is_accessible && v.status != StepStatus::Completed)
            .map(|v| v.step);

        WorkflowStateView {
            project_id: project_id.to_string(),
            steps: views,
            overall_progress: self.overall_progress(steps),
            current_step,
        }
    }

    /// Arithmetic mean of all steps' completion_percentage.
    pub fn overall_progress(&self, steps: &StepMap) -> f64 {
        if steps.is_empty() {
            return 0.0;
        }
        let sum: f64 = steps.values().map(|s| s.completion_percentage).sum();
        sum / steps.len() as f64
    }

    // ==========================================
    // Mutations
    // ==========================================

    /// Merge notes / completion percentage / data into a step. The
    /// status is deliberately left untouched; only complete and reopen
    /// transition it.
    pub fn update_step(
        &self,
        steps: &mut StepMap,
        step: StepKey,
        update: &StepUpdate,
    ) -> Result<(), WorkflowError> {
        if let Some(pct) = update.completion_percentage {
            if !(0.0..=100.0).contains(&pct) {
                return Err(WorkflowError::InvalidInput(format!(
                    "completion_percentage must be within [0, 100] (got {})",
                    pct
                )));
            }
        }

        let state = steps
            .get_mut(&step)
            .ok_or_else(|| WorkflowError::InvalidInput(format!("unknown step {}", step)))?;

        if let Some(notes) = &update.notes {
            state.notes = Some(notes.clone());
        }
        if let Some(pct) = update.completion_percentage {
            state.completion_percentage = pct;
        }
        if let Some(data) = &update.data {
            state.data = Some(data.clone());
        }

        debug!(step = %step, "step updated");
        Ok(())
    }

    /// Complete a step. Fails with PrerequisiteNotMet (listing exactly
    /// the unmet blocking steps) when inaccessible, or with
    /// ValidationFailed when the step validator reports errors.
    pub fn complete_step(
        &self,
        steps: &mut StepMap,
        step: StepKey,
        ctx: &ValidationContext,
    ) -> Result<(), WorkflowError> {
        let (unmet, _) = self.unmet_prerequisites(step, steps);
        if !unmet.is_empty() {
            return Err(WorkflowError::PrerequisiteNotMet { step, unmet });
        }

        let validation = self.validate_step(step, steps, ctx);
        if !validation.is_valid() {
            return Err(WorkflowError::ValidationFailed {
                step,
                errors: validation.errors,
            });
        }

        let state = steps
            .get_mut(&step)
            .ok_or_else(|| WorkflowError::InvalidInput(format!("unknown step {}", step)))?;
        state.status = StepStatus::Completed;
        state.completion_percentage = 100.0;
        state.completed_at = Some(Utc::now().naive_utc());
        state.validation = Some(validation);

        info!(step = %step, "step completed");
        Ok(())
    }

    /// Reopen a completed step back to InProgress.
    ///
    /// Downstream steps keep their completed status; they merely lose
    /// accessibility for new completion until this step completes
    /// again (deliberate policy: no cascading status revert).
    pub fn reopen_step(&self, steps: &mut StepMap, step: StepKey) -> Result<(), WorkflowError> {
        let state = steps
            .get_mut(&step)
            .ok_or_else(|| WorkflowError::InvalidInput(format!("unknown step {}", step)))?;

        if state.status != StepStatus::Completed {
            return Err(WorkflowError::InvalidTransition {
                from: state.status,
                to: StepStatus::InProgress,
            });
        }

        state.status = StepStatus::InProgress;
        state.completed_at = None;

        info!(step = %step, "step reopened");
        Ok(())
    }

    // ==========================================
    // Validation (independent of transitions)
    // ==========================================

    /// Run the step-specific validator. Errors block completion,
    /// warnings are advisory. Never transitions status.
    pub fn validate_step(
        &self,
        step: StepKey,
        steps: &StepMap,
        ctx: &ValidationContext,
    ) -> StepValidation {
        let state = steps.get(&step);
        let data = state.and_then(|s| s.data.as_ref());

        match step {
            StepKey::PlanningPreparedness => self.validate_planning(data),
            StepKey::DataAssembly => self.validate_data_assembly(data),
            StepKey::SituationAnalysis => self.validate_situation_analysis(data),
            StepKey::Stratification => self.validate_stratification(ctx),
            _ => self.validate_generic(state),
        }
    }

    fn validate_planning(&self, data: Option<&Value>) -> StepValidation {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        if !field_present(data, "scope_of_work") {
            errors.push("Scope of work not documented".to_string());
        }
        if !field_present(data, "operational_unit") {
            errors.push("Operational unit (district/region) not defined".to_string());
        }
        if !field_present(data, "timeline") {
            warnings.push("Timeline not yet created".to_string());
        }

        StepValidation { errors, warnings }
    }

    fn validate_data_assembly(&self, data: Option<&Value>) -> StepValidation {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        let source_types: Vec<&str> = data
            .and_then(|d| d.get("source_types"))
            .and_then(Value::as_array)
            .map(|a| a.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();

        if source_types.is_empty() {
            errors.push("No data sources registered".to_string());
            return StepValidation { errors, warnings };
        }

        let missing: Vec<&str> = ["epidemiological", "demographic"]
            .into_iter()
            .filter(|t| !source_types.contains(t))
            .collect();
        if !missing.is_empty() {
            errors.push(format!(
                "Missing required data types: {}",
                missing.join(", ")
            ));
        }

        if let Some(scores) = data
            .and_then(|d| d.get("quality_scores"))
            .and_then(Value::as_object)
        {
            for (name, score) in scores {
                if let Some(score) = score.as_f64() {
                    if score < 0.5 {
                        warnings.push(format!(
                            "Low quality score for '{}': {:.0}%",
                            name,
                            score * 100.0
                        ));
                    }
                }
            }
        }

        StepValidation { errors, warnings }
    }

    fn validate_situation_analysis(&self, data: Option<&Value>) -> StepValidation {
        let mut errors = Vec::new();
        let completed = data
            .and_then(|d| d.get("analysis_completed"))
            .and_then(Value::as_bool)
            .unwrap_or(false);
        if !completed {
            errors.push("Situation analysis not marked as completed".to_string());
        }
        StepValidation {
            errors,
            warnings: Vec::new(),
        }
    }

    fn validate_stratification(&self, ctx: &ValidationContext) -> StepValidation {
        let mut errors = Vec::new();
        if !ctx.has_active_stratification_config {
            errors.push("No active stratification configuration".to_string());
        } else if !ctx.stratification_results_exist {
            errors.push("No stratification results calculated".to_string());
        }
        StepValidation {
            errors,
            warnings: Vec::new(),
        }
    }

    fn validate_generic(&self, state: Option<&WorkflowStepState>) -> StepValidation {
        let mut warnings = Vec::new();
        if let Some(state) = state {
            if state.completion_percentage < 100.0 {
                warnings.push(format!(
                    "Step is {:.0}% complete",
                    state.completion_percentage
                ));
            }
        }
        StepValidation {
            errors: Vec::new(),
            warnings,
        }
    }
}

impl Default for WorkflowEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn field_present(data: Option<&Value>, key: &str) -> bool {
    data.and_then(|d| d.get(key))
        .map(|v| match v {
            Value::Null => false,
            Value::String(s) => !s.is_empty(),
            _ => true,
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn engine() -> WorkflowEngine {
        WorkflowEngine::new()
    }

    /// Complete a chain of steps with passing validators.
    fn force_complete(steps: &mut StepMap, through: &[StepKey]) {
        for step in through {
            let state = steps.get_mut(step).unwrap();
            state.status = StepStatus::Completed;
            state.completion_percentage = 100.0;
            state.completed_at = Some(Utc::now().naive_utc());
        }
    }

    #[test]
    fn test_init_creates_10_not_started_steps() {
        let steps = engine().init_steps();
        assert_eq!(steps.len(), 10);
        assert!(steps.values().all(|s| s.status == StepStatus::NotStarted));
        assert!(steps.values().all(|s| s.completion_percentage == 0.0));
    }

    #[test]
    fn test_only_first_step_accessible_initially() {
        let e = engine();
        let steps = e.init_steps();
        assert!(e.is_accessible(StepKey::PlanningPreparedness, &steps));
        assert!(!e.is_accessible(StepKey::DataAssembly, &steps));
        // Monitoring only has a non-blocking prerequisite.
        assert!(e.is_accessible(StepKey::MonitoringEvaluation, &steps));
    }

    #[test]
    fn test_complete_fails_with_exact_unmet_steps() {
        let e = engine();
        let mut steps = e.init_steps();
        let ctx = ValidationContext::default();

        let err = e
            .complete_step(&mut steps, StepKey::DataAssembly, &ctx)
            .unwrap_err();
        match err {
            WorkflowError::PrerequisiteNotMet { step, unmet } => {
                assert_eq!(step, StepKey::DataAssembly);
                assert_eq!(unmet, vec![StepKey::PlanningPreparedness]);
            }
            other => panic!("expected PrerequisiteNotMet, got {:?}", other),
        }
    }

    #[test]
    fn test_complete_succeeds_after_blockers_done() {
        let e = engine();
        let mut steps = e.init_steps();
        let ctx = ValidationContext::default();

        force_complete(&mut steps, &[StepKey::PlanningPreparedness]);
        // Data assembly still needs its own validation to pass.
        e.update_step(
            &mut steps,
            StepKey::DataAssembly,
            &StepUpdate {
                data: Some(json!({"source_types": ["epidemiological", "demographic"]})),
                ..Default::default()
            },
        )
        .unwrap();

        e.complete_step(&mut steps, StepKey::DataAssembly, &ctx)
            .unwrap();
        let state = &steps[&StepKey::DataAssembly];
        assert_eq!(state.status, StepStatus::Completed);
        assert_eq!(state.completion_percentage, 100.0);
        assert!(state.completed_at.is_some());
    }

    #[test]
    fn test_complete_blocked_by_validation_errors() {
        let e = engine();
        let mut steps = e.init_steps();
        let ctx = ValidationContext::default();

        // Planning step is accessible but scope/unit are missing.
        let err = e
            .complete_step(&mut steps, StepKey::PlanningPreparedness, &ctx)
            .unwrap_err();
        match err {
            WorkflowError::ValidationFailed { errors, .. } => {
                assert_eq!(errors.len(), 2);
            }
            other => panic!("expected ValidationFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_update_merges_without_status_change() {
        let e = engine();
        let mut steps = e.init_steps();

        e.update_step(
            &mut steps,
            StepKey::PlanningPreparedness,
            &StepUpdate {
                notes: Some("kickoff held".to_string()),
                completion_percentage: Some(40.0),
                data: None,
            },
        )
        .unwrap();

        let state = &steps[&StepKey::PlanningPreparedness];
        assert_eq!(state.status, StepStatus::NotStarted);
        assert_eq!(state.completion_percentage, 40.0);
        assert_eq!(state.notes.as_deref(), Some("kickoff held"));
    }

    #[test]
    fn test_update_rejects_out_of_range_percentage() {
        let e = engine();
        let mut steps = e.init_steps();
        let err = e
            .update_step(
                &mut steps,
                StepKey::PlanningPreparedness,
                &StepUpdate {
                    completion_percentage: Some(120.0),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidInput(_)));
    }

    #[test]
    fn test_reopen_revokes_downstream_accessibility_without_revert() {
        let e = engine();
        let mut steps = e.init_steps();
        force_complete(
            &mut steps,
            &[
                StepKey::PlanningPreparedness,
                StepKey::DataAssembly,
                StepKey::SituationAnalysis,
            ],
        );
        assert!(e.is_accessible(StepKey::Stratification, &steps));

        e.reopen_step(&mut steps, StepKey::DataAssembly).unwrap();

        // Reopened step is back in progress.
        assert_eq!(steps[&StepKey::DataAssembly].status, StepStatus::InProgress);
        assert!(steps[&StepKey::DataAssembly].completed_at.is_none());
        // Downstream completed step keeps its status...
        assert_eq!(
            steps[&StepKey::SituationAnalysis].status,
            StepStatus::Completed
        );
        // ...but accessibility downstream of the reopened step is gone.
        assert!(!e.is_accessible(StepKey::SituationAnalysis, &steps));
    }

    #[test]
    fn test_reopen_requires_completed_status() {
        let e = engine();
        let mut steps = e.init_steps();
        let err = e
            .reopen_step(&mut steps, StepKey::PlanningPreparedness)
            .unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidTransition { .. }));
    }

    #[test]
    fn test_overall_progress_is_mean_of_percentages() {
        let e = engine();
        let mut steps = e.init_steps();
        assert_eq!(e.overall_progress(&steps), 0.0);

        steps
            .get_mut(&StepKey::PlanningPreparedness)
            .unwrap()
            .completion_percentage = 100.0;
        steps
            .get_mut(&StepKey::DataAssembly)
            .unwrap()
            .completion_percentage = 50.0;
        assert!((e.overall_progress(&steps) - 15.0).abs() < 1e-9);

        force_complete(&mut steps, &StepKey::ORDER);
        assert_eq!(e.overall_progress(&steps), 100.0);
    }

    #[test]
    fn test_current_step_is_first_accessible_incomplete() {
        let e = engine();
        let mut steps = e.init_steps();
        let view = e.state_view("p-1", &steps);
        assert_eq!(view.current_step, Some(StepKey::PlanningPreparedness));

        force_complete(&mut steps, &[StepKey::PlanningPreparedness]);
        let view = e.state_view("p-1", &steps);
        assert_eq!(view.current_step, Some(StepKey::DataAssembly));
    }

    #[test]
    fn test_validation_does_not_transition_status() {
        let e = engine();
        let steps = e.init_steps();
        let validation =
            e.validate_step(StepKey::SituationAnalysis, &steps, &ValidationContext::default());
        assert!(!validation.is_valid());
        assert_eq!(steps[&StepKey::SituationAnalysis].status, StepStatus::NotStarted);
    }

    #[test]
    fn test_stratification_validator_uses_context() {
        let e = engine();
        let steps = e.init_steps();

        let v = e.validate_step(
            StepKey::Stratification,
            &steps,
            &ValidationContext {
                has_active_stratification_config: false,
                stratification_results_exist: false,
            },
        );
        assert!(v.errors[0].contains("No active stratification"));

        let v = e.validate_step(
            StepKey::Stratification,
            &steps,
            &ValidationContext {
                has_active_stratification_config: true,
                stratification_results_exist: false,
            },
        );
        assert!(v.errors[0].contains("No stratification results"));

        let v = e.validate_step(
            StepKey::Stratification,
            &steps,
            &ValidationContext {
                has_active_stratification_config: true,
                stratification_results_exist: true,
            },
        );
        assert!(v.is_valid());
    }
}
