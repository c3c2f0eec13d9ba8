//! Shared error types for database infrastructure

use thiserror::Error;

/// Failures raised while setting up or reaching the database
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// The pool could not be established or a connection dropped
    #[error("Database connection error: {0}")]
    Connection(#[source] sqlx::Error),

    /// An environment variable held a value that cannot configure the pool
    #[error("Database configuration error: {0}")]
    Configuration(String),
}

pub type DatabaseResult<T> = Result<T, DatabaseError>;
