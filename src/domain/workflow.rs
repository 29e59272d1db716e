// ==========================================
// SNT Planner - Workflow Domain Model
// ==========================================
// Per-project state of the 10 SNT planning steps plus the static
// prerequisite graph.
// Rule: accessibility is derived on read, never stored.
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::types::{PrerequisiteType, StepKey, StepStatus};

// ==========================================
// Prerequisite graph
// ==========================================
// Linear chain through the planning stages; monitoring & evaluation
// only soft-depends on service delivery.
pub const PREREQUISITES: [(StepKey, &[(StepKey, PrerequisiteType)]); 10] = [
    (StepKey::PlanningPreparedness, &[]),
    (
        StepKey::DataAssembly,
        &[(StepKey::PlanningPreparedness, PrerequisiteType::Blocking)],
    ),
    (
        StepKey::SituationAnalysis,
        &[(StepKey::DataAssembly, PrerequisiteType::Blocking)],
    ),
    (
        StepKey::Stratification,
        &[(StepKey::SituationAnalysis, PrerequisiteType::Blocking)],
    ),
    (
        StepKey::InterventionTailoring,
        &[(StepKey::Stratification, PrerequisiteType::Blocking)],
    ),
    (
        StepKey::ImpactForecasting,
        &[(StepKey::InterventionTailoring, PrerequisiteType::Blocking)],
    ),
    (
        StepKey::ScenarioSelection,
        &[(StepKey::ImpactForecasting, PrerequisiteType::Blocking)],
    ),
    (
        StepKey::ResourceOptimization,
        &[(StepKey::ScenarioSelection, PrerequisiteType::Blocking)],
    ),
    (
        StepKey::ServiceDelivery,
        &[(StepKey::ResourceOptimization, PrerequisiteType::Blocking)],
    ),
    (
        StepKey::MonitoringEvaluation,
        &[(StepKey::ServiceDelivery, PrerequisiteType::NonBlocking)],
    ),
];

/// Prerequisites for a single step.
pub fn prerequisites_of(step: StepKey) -> &'static [(StepKey, PrerequisiteType)] {
    PREREQUISITES
        .iter()
        .find(|(k, _)| *k == step)
        .map(|(_, p)| *p)
        .unwrap_or(&[])
}

// ==========================================
// WorkflowStepState - persisted per-step state
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowStepState {
    pub step: StepKey,
    pub status: StepStatus,
    /// Progress within the step, 0..=100.
    pub completion_percentage: f64,
    pub notes: Option<String>,
    /// Free-form step payload (scope of work, analysis flags, ...).
    pub data: Option<Value>,
    pub completed_at: Option<NaiveDateTime>,
    /// Last validation outcome, stored for display.
    pub validation: Option<StepValidation>,
}

impl WorkflowStepState {
    /// Fresh state at project creation.
    pub fn new(step: StepKey) -> Self {
        Self {
            step,
            status: StepStatus::NotStarted,
            completion_percentage: 0.0,
            notes: None,
            data: None,
            completed_at: None,
            validation: None,
        }
    }
}

// ==========================================
// StepValidation - errors block completion, warnings are advisory
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepValidation {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl StepValidation {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

// ==========================================
// StepView - derived view returned by the API
// ==========================================
// is_accessible and the unmet-prerequisite lists are computed from the
// current statuses and the graph, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct StepView {
    pub step: StepKey,
    pub label: &'static str,
    pub status: StepStatus,
    pub completion_percentage: f64,
    pub is_accessible: bool,
    /// Unmet blocking prerequisites (empty means accessible).
    pub blocking_prerequisites: Vec<StepKey>,
    /// Unmet non-blocking prerequisites (UI hints only).
    pub non_blocking_prerequisites: Vec<StepKey>,
    pub notes: Option<String>,
    pub data: Option<Value>,
    pub completed_at: Option<NaiveDateTime>,
    pub validation: Option<StepValidation>,
}

// ==========================================
// WorkflowStateView - the full workflow snapshot
// ==========================================
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowStateView {
    pub project_id: String,
    pub steps: Vec<StepView>,
    /// Arithmetic mean of all steps' completion_percentage, 0..=100.
    pub overall_progress: f64,
    /// First accessible, non-completed step in canonical order.
    pub current_step: Option<StepKey>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_steps_have_graph_entry() {
        for step in StepKey::ORDER {
            assert!(
                PREREQUISITES.iter().any(|(k, _)| *k == step),
                "missing prerequisites entry for {}",
                step
            );
        }
    }

    #[test]
    fn test_first_step_has_no_blocking_prerequisites() {
        let blocking: Vec<_> = prerequisites_of(StepKey::PlanningPreparedness)
            .iter()
            .filter(|(_, t)| *t == PrerequisiteType::Blocking)
            .collect();
        assert!(blocking.is_empty());
    }

    #[test]
    fn test_intervention_tailoring_requires_stratification() {
        let prereqs: Vec<_> = prerequisites_of(StepKey::InterventionTailoring)
            .iter()
            .map(|(k, _)| *k)
            .collect();
        assert!(prereqs.contains(&StepKey::Stratification));
    }

    #[test]
    fn test_monitoring_has_only_non_blocking_prerequisites() {
        for (_, t) in prerequisites_of(StepKey::MonitoringEvaluation) {
            assert_eq!(*t, PrerequisiteType::NonBlocking);
        }
    }

    #[test]
    fn test_no_circular_dependencies() {
        fn visit(step: StepKey, path: &mut Vec<StepKey>) {
            assert!(!path.contains(&step), "cycle detected at {}", step);
            path.push(step);
            for (prereq, _) in prerequisites_of(step) {
                visit(*prereq, &mut path.clone());
            }
        }
        for step in StepKey::ORDER {
            visit(step, &mut Vec::new());
        }
    }
}
