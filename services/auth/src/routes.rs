//! Authentication service routes

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use axum::{
    Extension, Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::{
    AppState,
    middleware::{AuthUser, auth_middleware},
    models::{LoginCredentials, NewUser, Role, User, UserResponse},
    repositories::is_unique_violation,
    validation::{validate_email, validate_password, validate_username},
};

/// Response for successful registration
#[derive(Serialize)]
pub struct RegisterResponse {
    pub token: String,
    pub user: UserResponse,
}

/// Response for successful login
#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user_id: uuid::Uuid,
    pub username: String,
    pub role: Role,
    pub email: String,
}

/// Create the router for the authentication service
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/auth/me", get(me))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .merge(protected_routes)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "auth-service"
    }))
}

/// User registration endpoint
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<NewUser>, JsonRejection>,
) -> Result<impl IntoResponse, AuthError> {
    // A missing or malformed body is a validation failure, not a bare 422
    let Json(payload) = payload.map_err(|e| AuthError::Validation(e.body_text()))?;

    info!("Registration attempt for user: {}", payload.username);

    validate_username(&payload.username).map_err(AuthError::Validation)?;
    validate_email(&payload.email).map_err(AuthError::Validation)?;
    validate_password(&payload.password).map_err(AuthError::Validation)?;

    // Admin accounts are provisioned out of band, never self-registered
    if payload.role == Role::Admin {
        return Err(AuthError::Validation(
            "Role must be owner or tenant".to_string(),
        ));
    }

    let user = state.user_repository.create(&payload).await.map_err(|e| {
        if is_unique_violation(&e) {
            AuthError::Validation("Username or email is already taken".to_string())
        } else {
            error!("Failed to create user: {}", e);
            AuthError::InternalServerError
        }
    })?;

    let token = state.jwt_service.generate_token(&user).map_err(|e| {
        error!("Failed to generate token: {}", e);
        AuthError::InternalServerError
    })?;

    let response = RegisterResponse {
        token,
        user: user.to_response(),
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// User login endpoint
///
/// Unknown username and wrong password produce byte-identical responses,
/// and the unknown-user path still performs a password hash so the two
/// cases cannot be told apart by timing either.
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginCredentials>, JsonRejection>,
) -> Result<impl IntoResponse, AuthError> {
    let Json(payload) = payload.map_err(|e| AuthError::Validation(e.body_text()))?;

    info!("Login attempt for user: {}", payload.username);

    if payload.username.is_empty() || payload.password.is_empty() {
        return Err(AuthError::Validation(
            "Username and password are required".to_string(),
        ));
    }

    if !state.login_limiter.is_allowed(&payload.username).await {
        warn!("Login throttled for user: {}", payload.username);
        return Err(AuthError::TooManyAttempts);
    }

    let user = state
        .user_repository
        .find_by_username_or_email(&payload.username)
        .await
        .map_err(|e| {
            error!("Failed to look up user: {}", e);
            AuthError::InternalServerError
        })?;

    let user = match authenticate(user, &payload.password) {
        Ok(user) => user,
        Err(AuthError::InvalidCredentials) => {
            state.login_limiter.record_failure(&payload.username).await;
            return Err(AuthError::InvalidCredentials);
        }
        Err(e) => return Err(e),
    };

    state.login_limiter.reset(&payload.username).await;

    let token = state.jwt_service.generate_token(&user).map_err(|e| {
        error!("Failed to generate token: {}", e);
        AuthError::InternalServerError
    })?;

    let response = LoginResponse {
        token,
        user_id: user.id,
        username: user.username,
        role: user.role,
        email: user.email,
    };

    Ok((StatusCode::OK, Json(response)))
}

/// Current-user endpoint; requires a valid bearer token
pub async fn me(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<impl IntoResponse, AuthError> {
    let user = state
        .user_repository
        .find_by_id(auth_user.id)
        .await
        .map_err(|e| {
            error!("Failed to load user: {}", e);
            AuthError::InternalServerError
        })?
        .ok_or(AuthError::Unauthenticated)?;

    Ok(Json(user.to_response()))
}

/// Check a login attempt against the looked-up user
///
/// Unknown user and wrong password both resolve to the same
/// `InvalidCredentials` value; the unknown-user path burns one argon2
/// round so the two cases take comparable time.
fn authenticate(user: Option<User>, password: &str) -> Result<User, AuthError> {
    let Some(user) = user else {
        burn_password_hash(password);
        return Err(AuthError::InvalidCredentials);
    };

    let parsed_hash = PasswordHash::new(&user.password_hash).map_err(|e| {
        error!("Failed to parse password hash: {}", e);
        AuthError::InternalServerError
    })?;

    if Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
    {
        Ok(user)
    } else {
        Err(AuthError::InvalidCredentials)
    }
}

/// Spend one argon2 hashing round so missing-user and wrong-password
/// paths take comparable time
fn burn_password_hash(password: &str) {
    let salt = SaltString::generate(&mut rand::thread_rng());
    let _ = Argon2::default().hash_password(password.as_bytes(), &salt);
}

/// Custom error type for authentication operations
#[derive(Error, Debug)]
pub enum AuthError {
    /// Malformed or out-of-range input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Wrong username or password; the body never says which
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Missing, tampered, or expired token
    #[error("Unauthorized")]
    Unauthenticated,

    /// Login throttle tripped
    #[error("Too many attempts")]
    TooManyAttempts,

    /// Internal server error
    #[error("Internal server error")]
    InternalServerError,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AuthError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AuthError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "Invalid username or password".to_string(),
            ),
            AuthError::Unauthenticated => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            AuthError::TooManyAttempts => (
                StatusCode::TOO_MANY_REQUESTS,
                "Too many login attempts".to_string(),
            ),
            AuthError::InternalServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn stored_user(password: &str) -> User {
        let salt = SaltString::generate(&mut rand::thread_rng());
        let password_hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .unwrap()
            .to_string();

        User {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password_hash,
            role: Role::Tenant,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn correct_password_authenticates() {
        let user = stored_user("correct horse");
        let authenticated = authenticate(Some(user.clone()), "correct horse").unwrap();
        assert_eq!(authenticated.id, user.id);
    }

    #[test]
    fn wrong_password_is_invalid_credentials() {
        let user = stored_user("correct horse");
        assert!(matches!(
            authenticate(Some(user), "wrong"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn unknown_user_is_invalid_credentials() {
        assert!(matches!(
            authenticate(None, "wrong"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn both_credential_failures_answer_identically() {
        let user = stored_user("correct horse");

        let unknown_user = authenticate(None, "wrong").unwrap_err();
        let wrong_password = authenticate(Some(user), "wrong").unwrap_err();

        let a = unknown_user.into_response();
        let b = wrong_password.into_response();
        assert_eq!(a.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(b.status(), StatusCode::UNAUTHORIZED);

        // Byte-identical bodies so the caller cannot enumerate users
        let a_body = axum::body::to_bytes(a.into_body(), usize::MAX).await.unwrap();
        let b_body = axum::body::to_bytes(b.into_body(), usize::MAX).await.unwrap();
        assert_eq!(a_body, b_body);
    }
}
