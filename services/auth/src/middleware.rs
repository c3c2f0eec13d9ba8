//! Middleware for JWT token validation and authentication

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use tracing::debug;
use uuid::Uuid;

use crate::{AppState, models::Role, routes::AuthError};

/// Authenticated caller, attached to request extensions by the middleware
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: Role,
}

/// Extract and validate a bearer token from the Authorization header
///
/// Verification always runs before the handler; a missing, tampered, or
/// expired token produces the same opaque 401 so callers cannot tell the
/// cases apart.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .ok_or(AuthError::Unauthenticated)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::Unauthenticated)?;

    let claims = state.jwt_service.validate_token(token).map_err(|e| {
        debug!("Token validation failed: {}", e);
        AuthError::Unauthenticated
    })?;

    req.extensions_mut().insert(AuthUser {
        id: claims.sub,
        role: claims.role,
    });

    Ok(next.run(req).await)
}
