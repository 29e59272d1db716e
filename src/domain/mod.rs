// ==========================================
// SNT Planner - Domain Layer
// ==========================================
// Entities and typed vocabulary. No business rules, no I/O.
// ==========================================

pub mod forecast;
pub mod intervention;
pub mod scenario;
pub mod stratification;
pub mod types;
pub mod workflow;

pub use forecast::{
    BaselineData, ForecastComparison, ForecastRequest, ForecastResult, ForecastSummary,
    UncertaintyBounds, UncertaintyInterval,
};
pub use intervention::{
    EligibilityCriterion, InterventionDecisionTree, InterventionPlan, InterventionPlanCreate,
    InterventionRecommendation, QuestionKind, TailoringOption, TailoringQuestion,
};
pub use scenario::{
    Scenario, ScenarioComparison, ScenarioComparisonRow, ScenarioCostItem, ScenarioCostSummary,
    ScenarioCreate, ScenarioUpdate,
};
pub use stratification::{
    AdminUnitRow, GeoFeature, GeoFeatureCollection, GeoProperties, StratificationConfig,
    StratificationResult, StratificationSummary, ThresholdMap, ThresholdRange,
};
pub use workflow::{
    prerequisites_of, StepValidation, StepView, WorkflowStateView, WorkflowStepState,
    PREREQUISITES,
};
