// ==========================================
// SNT Planner - Core Library
// ==========================================
// Decision-support engine for subnational malaria program planning:
// guided workflow, risk stratification, WHO intervention tailoring,
// costing and impact forecasting. Human planners keep final control;
// every rejection and recommendation carries explicit reasons.
// ==========================================

// ==========================================
// Module declarations
// ==========================================

// Domain layer - entities and types
pub mod domain;

// Store layer - project data access
pub mod store;

// Engine layer - business rules
pub mod engine;

// Configuration layer - engine parameters
pub mod config;

// Logging
pub mod logging;

// API layer - business operations
pub mod api;

// ==========================================
// Core type re-exports
// ==========================================

// Domain types
pub use domain::types::{
    CostRecurrence, ForecastStatus, InterventionCode, PrerequisiteType, RiskLevel, ScenarioType,
    StepKey, StepStatus, StratificationMetric,
};

// Domain entities
pub use domain::{
    AdminUnitRow, BaselineData, ForecastRequest, ForecastResult, InterventionPlan,
    InterventionRecommendation, Scenario, ScenarioCreate, StratificationConfig,
    StratificationResult, WorkflowStateView,
};

// Engines
pub use engine::{
    CostModel, ForecastEngine, InterventionDecisionEngine, RiskClassifier, WorkflowEngine,
};

// Configuration
pub use config::{EngineSettings, PlanPolicy};

// Store
pub use store::{AdminUnitRecord, Project, ProjectStore};

// API
pub use api::{
    ApiError, ApiResult, ForecastApi, InterventionApi, ProjectApi, ScenarioApi, StratificationApi,
    WorkflowApi,
};

// ==========================================
// Constants
// ==========================================

// System version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// System name
pub const APP_NAME: &str = "SNT Planner";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
