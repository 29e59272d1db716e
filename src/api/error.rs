// ==========================================
// SNT Planner - API Errors
// ==========================================
// Responsibility: one structured error type for all operations; store
// and engine errors are converted here so callers only ever see
// ApiError. Every variant carries an explicit reason.
// ==========================================

use thiserror::Error;

use crate::domain::types::StepKey;
use crate::engine::WorkflowError;
use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum ApiError {
    /// Input failed validation; every violation is listed, not just
    /// the first.
    #[error("validation failed: {reasons:?}")]
    Validation { reasons: Vec<String> },

    #[error("prerequisite not met for step {step}: {unmet:?}")]
    PrerequisiteNotMet { step: StepKey, unmet: Vec<StepKey> },

    /// Two data sources disagree on the set of admin units.
    #[error("source mismatch: {reason} (units: {missing_units:?})")]
    SourceMismatch {
        reason: String,
        missing_units: Vec<String>,
    },

    /// A forecast model run failed.
    #[error("model error: {0}")]
    Model(String),

    #[error("not found: {entity} with id={id}")]
    NotFound { entity: String, id: String },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid state transition: from={from} to={to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    pub fn validation(reasons: Vec<String>) -> Self {
        ApiError::Validation { reasons }
    }

    pub fn not_found(entity: &str, id: &str) -> Self {
        ApiError::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => ApiError::NotFound { entity, id },
            StoreError::Duplicate { entity, id } => {
                ApiError::InvalidInput(format!("duplicate {} with id={}", entity, id))
            }
            StoreError::LockError(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<WorkflowError> for ApiError {
    fn from(err: WorkflowError) -> Self {
        match err {
            WorkflowError::PrerequisiteNotMet { step, unmet } => {
                ApiError::PrerequisiteNotMet { step, unmet }
            }
            WorkflowError::ValidationFailed { errors, .. } => {
                ApiError::Validation { reasons: errors }
            }
            WorkflowError::InvalidTransition { from, to } => ApiError::InvalidStateTransition {
                from: from.to_string(),
                to: to.to_string(),
            },
            WorkflowError::InvalidInput(msg) => ApiError::InvalidInput(msg),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
