//! Error types shared by the domain and its repositories.

use thiserror::Error;

/// A value supplied by a caller does not fit the domain.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Unknown role: {0}")]
    UnknownRole(String),

    #[error("Unknown tone: {0}")]
    UnknownTone(String),
}

/// Repository-level errors.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Database connection failed: {0}")]
    Connection(String),

    #[error("Query execution failed: {0}")]
    Query(String),

    /// The row to update or delete does not exist.
    #[error("Entity not found")]
    NotFound,

    /// Unique or foreign-key violation, e.g. a duplicate email.
    #[error("Constraint violation: {0}")]
    Constraint(String),
}
