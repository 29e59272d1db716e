// ==========================================
// SNT Planner - Store Errors
// ==========================================
// Tool: thiserror derive macros
// ==========================================

use thiserror::Error;

/// Store layer error type.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("record not found: {entity} with id={id}")]
    NotFound { entity: String, id: String },

    #[error("duplicate record: {entity} with id={id}")]
    Duplicate { entity: String, id: String },

    #[error("store lock poisoned: {0}")]
    LockError(String),
}

impl StoreError {
    pub fn not_found(entity: &str, id: &str) -> Self {
        StoreError::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }

    pub fn duplicate(entity: &str, id: &str) -> Self {
        StoreError::Duplicate {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
