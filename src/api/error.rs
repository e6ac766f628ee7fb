use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use std::fmt;

use crate::services::TokenError;

use super::types::ErrorBody;

/// Every way a request can fail, mapped in one place to an HTTP status, a
/// stable machine code, and a human message. Handlers return these; nothing
/// else formats error responses.
#[derive(Debug)]
pub enum ApiError {
    ValidationError(String),

    EmailExists,

    BadRequest(String),

    InvalidCredentials,

    MissingToken,

    InvalidToken,

    TokenExpired,

    TokenRevoked,

    Unauthorized(String),

    Forbidden(String),

    DiaryNotFound,

    UserNotFound,

    NotFound(String),

    RateLimited { retry_after_secs: u64 },

    InternalError(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            ApiError::EmailExists => write!(f, "Email already registered"),
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::InvalidCredentials => write!(f, "Invalid email or password"),
            ApiError::MissingToken => write!(f, "Authorization token is missing"),
            ApiError::InvalidToken => write!(f, "Invalid token"),
            ApiError::TokenExpired => write!(f, "Token has expired"),
            ApiError::TokenRevoked => write!(f, "Token has been revoked"),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::DiaryNotFound => write!(f, "Diary entry not found"),
            ApiError::UserNotFound => write!(f, "User not found"),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::RateLimited { .. } => write!(f, "Rate limit exceeded"),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl ApiError {
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            ApiError::ValidationError(_) | ApiError::EmailExists | ApiError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::InvalidCredentials
            | ApiError::MissingToken
            | ApiError::InvalidToken
            | ApiError::TokenExpired
            | ApiError::TokenRevoked
            | ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::DiaryNotFound | ApiError::UserNotFound | ApiError::NotFound(_) => {
                StatusCode::NOT_FOUND
            }
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The stable machine token clients branch on.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            ApiError::ValidationError(_) => "VALIDATION_ERROR",
            ApiError::EmailExists => "EMAIL_EXISTS",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::InvalidCredentials => "INVALID_CREDENTIALS",
            ApiError::MissingToken => "MISSING_TOKEN",
            ApiError::InvalidToken => "INVALID_TOKEN",
            ApiError::TokenExpired => "TOKEN_EXPIRED",
            ApiError::TokenRevoked => "TOKEN_REVOKED",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::DiaryNotFound => "DIARY_NOT_FOUND",
            ApiError::UserNotFound => "USER_NOT_FOUND",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::RateLimited { .. } => "RATE_LIMIT_EXCEEDED",
            ApiError::InternalError(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::ValidationError(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        ApiError::BadRequest(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        ApiError::Unauthorized(msg.into())
    }

    /// 403 for a diary entry the caller does not own. `action` is the verb
    /// shown to the user: "access", "update" or "delete".
    pub fn forbidden(action: &str) -> Self {
        ApiError::Forbidden(format!(
            "You do not have permission to {} this diary entry",
            action
        ))
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        ApiError::InternalError(msg.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();

        let message = match &self {
            ApiError::ValidationError(msg)
            | ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg) => msg.clone(),
            ApiError::EmailExists => "Email already registered".to_string(),
            ApiError::InvalidCredentials => "Invalid email or password".to_string(),
            ApiError::MissingToken => "Authorization token is missing".to_string(),
            ApiError::InvalidToken => "Invalid token".to_string(),
            ApiError::TokenExpired => "Token has expired".to_string(),
            ApiError::TokenRevoked => "Token has been revoked".to_string(),
            ApiError::DiaryNotFound => "Diary entry not found".to_string(),
            ApiError::UserNotFound => "User not found".to_string(),
            ApiError::RateLimited { .. } => "Rate limit exceeded".to_string(),
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                "An unexpected error occurred".to_string()
            }
        };

        let retry_after = match &self {
            ApiError::RateLimited { retry_after_secs } => Some(*retry_after_secs),
            _ => None,
        };

        let body = ErrorBody {
            error: message,
            code,
        };
        let mut response = (status, Json(body)).into_response();

        if let Some(secs) = retry_after
            && let Ok(value) = header::HeaderValue::from_str(&secs.to_string())
        {
            response.headers_mut().insert(header::RETRY_AFTER, value);
        }

        response
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        // The schema's only unique constraint is users.email, so a unique
        // violation can only mean a duplicate registration.
        if let Some(db_err) = err.downcast_ref::<sea_orm::DbErr>()
            && matches!(
                db_err.sql_err(),
                Some(sea_orm::SqlErr::UniqueConstraintViolation(_))
            )
        {
            return ApiError::EmailExists;
        }

        ApiError::InternalError(format!("{err:#}"))
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => ApiError::TokenExpired,
            TokenError::Invalid => ApiError::InvalidToken,
            TokenError::Signing(msg) => ApiError::InternalError(msg),
        }
    }
}
