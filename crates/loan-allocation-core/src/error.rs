use thiserror::Error;

/// Errors surfaced to callers. Solver failures are not among them: the
/// strategy chain absorbs those and falls back.
#[derive(Debug, Error)]
pub enum AllocationError {
    #[error("Invalid input: {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Insufficient pool: {available} records available, at least {required} required")]
    InsufficientPool { available: usize, required: usize },

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for AllocationError {
    fn from(e: serde_json::Error) -> Self {
        AllocationError::SerializationError(e.to_string())
    }
}
