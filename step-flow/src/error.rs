use thiserror::Error;

/// Errors surfaced by the wizard engine.
#[derive(Error, Debug)]
pub enum FlowError {
    #[error("Step not found: {0}")]
    StepNotFound(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Context error: {0}")]
    ContextError(String),

    #[error("Step execution failed: {0}")]
    StepFailed(String),

    #[error("Storage error: {0}")]
    StorageError(#[from] sqlx::Error),
}

pub type Result<T> = std::result::Result<T, FlowError>;
