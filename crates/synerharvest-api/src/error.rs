//! Centralized API error type and response rendering
//!
//! Every handler returns `Result<_, ApiError>`. Rendering happens in two
//! stages: `IntoResponse` attaches an `ErrorEnvelope` extension carrying the
//! categorized error, and the outermost `error_envelope` middleware turns it
//! into the JSON body, which needs the request path. `BadRequest` bypasses
//! the envelope and renders a bare string body, matching the uncategorized
//! 400s the product/batch flows have always produced.

use std::collections::BTreeMap;

use axum::{
    body::Body,
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use sea_orm::{DbErr, SqlErr};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};
use utoipa::ToSchema;
use validator::ValidationErrors;

/// API error taxonomy.
///
/// `AccessDenied` and `Internal` carry a server-side reason that is logged
/// but never serialized; the wire message for those variants is fixed.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Requested entity does not exist (404 RESOURCE_NOT_FOUND)
    #[error("{0}")]
    NotFound(String),

    /// Caller is authenticated but not allowed (403 ACCESS_DENIED)
    #[error("{0}")]
    AccessDenied(String),

    /// Missing, invalid, or expired credentials (401 AUTHENTICATION_FAILED)
    #[error("{0}")]
    AuthenticationFailed(String),

    /// Login failure of any kind (401 INVALID_CREDENTIALS)
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// Unique value already taken (409 DUPLICATE_RESOURCE)
    #[error("{0}")]
    Duplicate(String),

    /// Request DTO failed validation (400 VALIDATION_FAILED + field map)
    #[error("Validation failed")]
    Validation(BTreeMap<String, String>),

    /// Uncategorized client error rendered as a bare string body (400)
    #[error("{0}")]
    BadRequest(String),

    /// Unexpected failure (500 INTERNAL_SERVER_ERROR)
    #[error("{0}")]
    Internal(String),
}

impl From<DbErr> for ApiError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                ApiError::Duplicate("Resource already exists".to_string())
            }
            _ => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields = BTreeMap::new();
        for (field, violations) in errors.field_errors() {
            if let Some(first) = violations.first() {
                let message = first
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value for {field}"));
                fields.insert(field.to_string(), message);
            }
        }
        ApiError::Validation(fields)
    }
}

/// Categorized error carried from `IntoResponse` to the envelope middleware.
#[derive(Debug, Clone)]
pub struct ErrorEnvelope {
    pub status: StatusCode,
    pub message: String,
    pub code: &'static str,
    pub errors: Option<BTreeMap<String, String>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let envelope = match self {
            // Bare-string body, no envelope
            ApiError::BadRequest(message) => {
                return (StatusCode::BAD_REQUEST, message).into_response();
            }
            ApiError::NotFound(message) => ErrorEnvelope {
                status: StatusCode::NOT_FOUND,
                message,
                code: "RESOURCE_NOT_FOUND",
                errors: None,
            },
            ApiError::AccessDenied(reason) => {
                warn!("Access denied: {}", reason);
                ErrorEnvelope {
                    status: StatusCode::FORBIDDEN,
                    message: "You do not have permission to access this resource".to_string(),
                    code: "ACCESS_DENIED",
                    errors: None,
                }
            }
            ApiError::AuthenticationFailed(message) => ErrorEnvelope {
                status: StatusCode::UNAUTHORIZED,
                message,
                code: "AUTHENTICATION_FAILED",
                errors: None,
            },
            ApiError::InvalidCredentials => ErrorEnvelope {
                status: StatusCode::UNAUTHORIZED,
                message: "Invalid username or password".to_string(),
                code: "INVALID_CREDENTIALS",
                errors: None,
            },
            ApiError::Duplicate(message) => ErrorEnvelope {
                status: StatusCode::CONFLICT,
                message,
                code: "DUPLICATE_RESOURCE",
                errors: None,
            },
            ApiError::Validation(fields) => ErrorEnvelope {
                status: StatusCode::BAD_REQUEST,
                message: "Validation failed".to_string(),
                code: "VALIDATION_FAILED",
                errors: Some(fields),
            },
            ApiError::Internal(detail) => {
                error!("Internal error: {}", detail);
                ErrorEnvelope {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    message: "An unexpected error occurred".to_string(),
                    code: "INTERNAL_SERVER_ERROR",
                    errors: None,
                }
            }
        };

        let mut response = Response::new(Body::empty());
        *response.status_mut() = envelope.status;
        response.extensions_mut().insert(envelope);
        response
    }
}

/// Standard error body
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    /// When the error occurred
    pub timestamp: DateTime<Utc>,
    /// Human-readable message
    pub message: String,
    /// Request path that produced the error
    pub path: String,
    /// Machine-readable error code
    pub error_code: String,
}

/// Validation error body with a per-field message map
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidationErrorBody {
    /// When the error occurred
    pub timestamp: DateTime<Utc>,
    /// Always "Validation failed"
    pub message: String,
    /// Field name mapped to the first violated rule's message
    pub errors: BTreeMap<String, String>,
    /// Machine-readable error code
    pub error_code: String,
}

/// Outermost middleware rendering `ErrorEnvelope` extensions as JSON bodies.
///
/// Runs outside the auth middleware so authentication failures render the
/// same way handler errors do.
pub async fn error_envelope(request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    let mut response = next.run(request).await;

    let Some(envelope) = response.extensions_mut().remove::<ErrorEnvelope>() else {
        return response;
    };

    let status = envelope.status;
    match envelope.errors {
        Some(errors) => (
            status,
            Json(ValidationErrorBody {
                timestamp: Utc::now(),
                message: envelope.message,
                errors,
                error_code: envelope.code.to_string(),
            }),
        )
            .into_response(),
        None => (
            status,
            Json(ErrorBody {
                timestamp: Utc::now(),
                message: envelope.message,
                path,
                error_code: envelope.code.to_string(),
            }),
        )
            .into_response(),
    }
}
