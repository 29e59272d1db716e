// ==========================================
// SNT Planner - API Layer
// ==========================================
// Responsibility: request/response operations composing the store and
// the engines. All errors leave this layer as ApiError.
// ==========================================

pub mod error;
pub mod forecast_api;
pub mod intervention_api;
pub mod project_api;
pub mod scenario_api;
pub mod stratification_api;
pub mod workflow_api;

pub use error::{ApiError, ApiResult};
pub use forecast_api::ForecastApi;
pub use intervention_api::InterventionApi;
pub use project_api::ProjectApi;
pub use scenario_api::{OptimizedScenario, ScenarioApi, ScenarioDetail};
pub use stratification_api::{ConfigCreate, ConfigUpdate, StratificationApi};
pub use workflow_api::WorkflowApi;
