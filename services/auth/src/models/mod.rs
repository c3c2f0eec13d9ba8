//! Authentication service models

pub mod user;

// Re-export for convenience
pub use common::auth::Role;
pub use user::{LoginCredentials, NewUser, User, UserResponse};
