//! Authentication service for the Rentora platform
//!
//! Owns the credential store, issues RS256 session tokens, and exposes
//! the login/register/me endpoints.

pub mod jwt;
pub mod middleware;
pub mod models;
pub mod rate_limiter;
pub mod repositories;
pub mod routes;
pub mod validation;

use sqlx::PgPool;

use crate::jwt::JwtService;
use crate::rate_limiter::LoginLimiter;
use crate::repositories::UserRepository;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub jwt_service: JwtService,
    pub user_repository: UserRepository,
    pub login_limiter: LoginLimiter,
}
