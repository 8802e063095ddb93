use sea_orm::DbErr;
use thiserror::Error;

/// Error types for the entity services
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Input was well-formed but violates a domain rule
    #[error("{0}")]
    Validation(String),

    /// The write would duplicate an existing row
    #[error("{0}")]
    Conflict(String),

    /// The caller's role or identity does not permit the operation
    #[error("{0}")]
    Forbidden(String),

    /// A referenced row does not exist
    #[error("{0}")]
    NotFound(String),

    /// Error from the database operations
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl ServiceError {
    pub fn not_found(what: &str, id: i32) -> Self {
        ServiceError::NotFound(format!("{} with ID {} not found", what, id))
    }
}

/// Type alias for Result with ServiceError
pub type Result<T> = std::result::Result<T, ServiceError>;
