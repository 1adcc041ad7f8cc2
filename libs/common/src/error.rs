//! Custom error types for the common library
//!
//! This module defines the database error type shared by every store
//! implementation, plus helpers to classify driver errors.

use sqlx::Error as SqlxError;
use thiserror::Error;

/// Custom error type for database operations
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error occurred during database connection
    #[error("Database connection error: {0}")]
    Connection(#[source] SqlxError),

    /// Error occurred during database query execution
    #[error("Database query error: {0}")]
    Query(#[source] SqlxError),

    /// Error occurred while opening or committing a transaction
    #[error("Database transaction error: {0}")]
    Transaction(#[source] SqlxError),

    /// Error occurred during database migration
    #[error("Database migration error: {0}")]
    Migration(String),

    /// Configuration error
    #[error("Database configuration error: {0}")]
    Configuration(String),
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Name of the violated constraint when `err` is a unique violation.
///
/// Returns `Some("")` when the driver reports a unique violation without a
/// constraint name.
pub fn unique_violation(err: &SqlxError) -> Option<&str> {
    match err {
        SqlxError::Database(db) if db.is_unique_violation() => {
            Some(db.constraint().unwrap_or_default())
        }
        _ => None,
    }
}
