use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Resource not found")]
    NotFound,
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Internal error: {0}")]
    Internal(String),
}
