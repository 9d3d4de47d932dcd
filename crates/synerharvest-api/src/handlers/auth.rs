//! Registration, login, and profile handlers

use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::{Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter, Set,
};
use std::str::FromStr;
use std::sync::Arc;
use synerharvest_auth::{hash_password, verify_password, JwtClaims, JwtValidator};
use synerharvest_db::entities::{
    prelude::User,
    user::{self, Permissions, Role},
};
use tracing::{debug, info, warn};
use validator::Validate;

use super::current_user;
use crate::error::{ApiError, ErrorBody, ValidationErrorBody};
use crate::middleware::AuthUser;
use crate::models::*;
use crate::AppState;

/// Issuer claim stamped into every token
const TOKEN_ISSUER: &str = "synerharvest";
/// Audience claim stamped into every token
const TOKEN_AUDIENCE: &str = "synerharvest-clients";
/// Token lifetime in hours
const TOKEN_VALIDITY_HOURS: i64 = 24;

/// Register a new account
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = UserResponse),
        (status = 400, description = "Validation failed", body = ValidationErrorBody),
        (status = 409, description = "Username or email already taken", body = ErrorBody)
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    info!("Registering user: {}", request.username);

    request.validate()?;

    if User::find()
        .filter(user::Column::Username.eq(&request.username))
        .one(&state.db)
        .await?
        .is_some()
    {
        return Err(ApiError::Duplicate("Username already exists".to_string()));
    }

    if User::find()
        .filter(user::Column::Email.eq(&request.email))
        .one(&state.db)
        .await?
        .is_some()
    {
        return Err(ApiError::Duplicate("Email already exists".to_string()));
    }

    // Validation restricts the role to the self-assignable set, so this
    // parse only fails on requests that skipped validation somehow.
    let role = Role::from_str(&request.role)
        .map_err(|_| ApiError::BadRequest(format!("Invalid role: {}", request.role)))?;

    let password_hash =
        hash_password(&request.password).map_err(|e| ApiError::Internal(e.to_string()))?;

    let now = Utc::now();
    let created = user::ActiveModel {
        username: Set(request.username),
        email: Set(request.email),
        password_hash: Set(password_hash),
        permissions: Set(Permissions::for_role(&role)),
        role: Set(role),
        enabled: Set(true),
        verified: Set(false),
        first_name: Set(Some(request.first_name)),
        last_name: Set(Some(request.last_name)),
        phone_number: Set(request.phone_number),
        profile_image_url: Set(None),
        company_name: Set(request.company_name),
        company_address: Set(request.company_address),
        location_coordinates: Set(request.location_coordinates),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    info!("Registered user {} with id {}", created.username, created.id);

    Ok((StatusCode::CREATED, Json(created.into())))
}

/// Exchange credentials for a bearer token
///
/// Every failure renders the same INVALID_CREDENTIALS body so callers
/// cannot probe which usernames exist or which accounts are disabled.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = ErrorBody)
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    debug!("Login attempt: {}", request.username);

    let Some(user) = User::find()
        .filter(user::Column::Username.eq(&request.username))
        .one(&state.db)
        .await?
    else {
        warn!("Login failed for {}: unknown username", request.username);
        return Err(ApiError::InvalidCredentials);
    };

    let password_ok = verify_password(&request.password, &user.password_hash).unwrap_or(false);
    if !password_ok {
        warn!("Login failed for {}: wrong password", request.username);
        return Err(ApiError::InvalidCredentials);
    }

    if !user.enabled {
        warn!("Login failed for {}: account disabled", request.username);
        return Err(ApiError::InvalidCredentials);
    }

    let claims = JwtClaims::new(
        user.username.clone(),
        TOKEN_ISSUER.to_string(),
        TOKEN_AUDIENCE.to_string(),
        Duration::hours(TOKEN_VALIDITY_HOURS),
    )
    .with_user_id(user.id)
    .with_role(user.role.as_str().to_string());

    let token = JwtValidator::encode(state.jwt_secret.as_bytes(), &claims)
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    info!("User {} logged in", user.username);

    Ok(Json(LoginResponse {
        token,
        token_type: "Bearer".to_string(),
        id: user.id,
        username: user.username,
        email: user.email,
        first_name: user.first_name,
        last_name: user.last_name,
        role: user.role.into(),
        permissions: user.permissions.0,
        message: "Login successful".to_string(),
    }))
}

/// Fetch the caller's profile
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Caller profile", body = UserResponse),
        (status = 401, description = "Not authenticated", body = ErrorBody)
    ),
    tag = "auth"
)]
pub async fn get_current_user(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<UserResponse>, ApiError> {
    debug!("Fetching profile for user {}", auth.id);

    let user = current_user(&state.db, &auth).await?;
    Ok(Json(user.into()))
}

/// Update the caller's profile
///
/// Every present field overwrites the stored value. A role change resets
/// permissions to the new role's defaults; an explicit permissions list
/// is applied after that reset.
#[utoipa::path(
    put,
    path = "/api/auth/me",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated profile", body = UserResponse),
        (status = 400, description = "Unknown role"),
        (status = 401, description = "Not authenticated", body = ErrorBody),
        (status = 409, description = "Username or email already taken", body = ErrorBody)
    ),
    tag = "auth"
)]
pub async fn update_current_user(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    info!("Updating profile for user {}", auth.id);

    let user = current_user(&state.db, &auth).await?;
    let mut active = user.clone().into_active_model();

    if let Some(username) = request.username {
        if username != user.username {
            let taken = User::find()
                .filter(user::Column::Username.eq(&username))
                .one(&state.db)
                .await?
                .is_some();
            if taken {
                return Err(ApiError::Duplicate("Username already exists".to_string()));
            }
        }
        active.username = Set(username);
    }

    if let Some(email) = request.email {
        if email != user.email {
            let taken = User::find()
                .filter(user::Column::Email.eq(&email))
                .one(&state.db)
                .await?
                .is_some();
            if taken {
                return Err(ApiError::Duplicate("Email already exists".to_string()));
            }
        }
        active.email = Set(email);
    }

    if let Some(password) = request.password {
        let password_hash =
            hash_password(&password).map_err(|e| ApiError::Internal(e.to_string()))?;
        active.password_hash = Set(password_hash);
    }

    if let Some(first_name) = request.first_name {
        active.first_name = Set(Some(first_name));
    }
    if let Some(last_name) = request.last_name {
        active.last_name = Set(Some(last_name));
    }
    if let Some(phone_number) = request.phone_number {
        active.phone_number = Set(Some(phone_number));
    }
    if let Some(profile_image_url) = request.profile_image_url {
        active.profile_image_url = Set(Some(profile_image_url));
    }
    if let Some(role) = request.role {
        let role = Role::from_str(&role)
            .map_err(|_| ApiError::BadRequest(format!("Invalid role: {role}")))?;
        active.permissions = Set(Permissions::for_role(&role));
        active.role = Set(role);
    }
    if let Some(company_name) = request.company_name {
        active.company_name = Set(Some(company_name));
    }
    if let Some(company_address) = request.company_address {
        active.company_address = Set(Some(company_address));
    }
    if let Some(location_coordinates) = request.location_coordinates {
        active.location_coordinates = Set(Some(location_coordinates));
    }
    if let Some(permissions) = request.permissions {
        active.permissions = Set(Permissions(permissions));
    }
    active.updated_at = Set(Utc::now());

    let updated = active.update(&state.db).await?;

    Ok(Json(updated.into()))
}
