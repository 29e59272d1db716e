// ==========================================
// SNT Planner - Engine Layer
// ==========================================
// Stateless computation engines. Each engine takes domain data in and
// returns domain data (or reasons) out; persistence and orchestration
// live in the api layer.
// ==========================================

pub mod cost;
pub mod decision;
pub mod decision_trees;
pub mod forecast;
pub mod risk;
pub mod workflow;

pub use cost::{CostModel, CoverageTargets, OptimizationOutcome, PopulationRecord};
pub use decision::{DecisionContext, InterventionDecisionEngine};
pub use forecast::{ForecastEngine, MODEL_SIMPLE};
pub use risk::RiskClassifier;
pub use workflow::{StepMap, StepUpdate, ValidationContext, WorkflowEngine, WorkflowError};
