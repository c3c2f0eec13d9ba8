//! Repositories for database operations

pub mod user;

pub use user::UserRepository;

/// Check whether an error chain contains a unique-constraint violation
///
/// Used by the routes to map duplicate username/email inserts to a
/// validation failure instead of a generic 500.
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.downcast_ref::<sqlx::Error>()
        .and_then(|e| e.as_database_error())
        .and_then(|db| db.code())
        .map(|code| code == "23505")
        .unwrap_or(false)
}
