//! JWT Authentication Middleware
//!
//! Provides authentication middleware for protected API endpoints.
//! Extracts JWT from the Authorization header, validates it, and makes the
//! caller's identity available to handlers via Axum's Extension.

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use synerharvest_auth::{JwtError, JwtValidator};
use synerharvest_db::entities::user::Role;

use crate::error::ApiError;

/// Authenticated caller context extracted from JWT
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// Database id of the caller
    pub id: i64,
    /// Login name (token subject)
    pub username: String,
    /// Role recorded in the token at login time
    pub role: Role,
}

/// JWT validation state shared across middleware instances
#[derive(Clone)]
pub struct JwtState {
    pub validator: Arc<JwtValidator>,
}

impl JwtState {
    /// Create new JWT state with the given secret
    pub fn new(secret: &[u8]) -> Self {
        Self {
            validator: Arc::new(JwtValidator::new(secret)),
        }
    }
}

/// Authentication middleware that validates JWT bearer tokens
///
/// Extracts the token from an "Authorization: Bearer <token>" header,
/// validates signature and expiration, and injects [`AuthUser`] into the
/// request extensions.
///
/// # Errors
/// Returns 401 AUTHENTICATION_FAILED if:
/// - The Authorization header is missing or not a Bearer token
/// - The token is malformed, tampered with, or expired
/// - The token lacks the user id or role claims
pub async fn require_auth(
    State(state): State<Arc<JwtState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or_else(|| {
            ApiError::AuthenticationFailed("Missing authentication token".to_string())
        })?;

    let claims = state.validator.validate(token).map_err(|e| match e {
        JwtError::TokenExpired => ApiError::AuthenticationFailed("Token expired".to_string()),
        _ => ApiError::AuthenticationFailed("Invalid authentication token".to_string()),
    })?;

    let id = claims
        .user_id
        .ok_or_else(|| ApiError::AuthenticationFailed("Token missing user id".to_string()))?;
    let role = claims
        .role
        .as_deref()
        .and_then(|r| Role::from_str(r).ok())
        .ok_or_else(|| ApiError::AuthenticationFailed("Token missing role".to_string()))?;

    request.extensions_mut().insert(AuthUser {
        id,
        username: claims.sub,
        role,
    });

    Ok(next.run(request).await)
}
