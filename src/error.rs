use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::security::jwt::TokenError;
use crate::security::password::PasswordError;

/// Stable machine-readable error codes. `(status, code)` is the wire
/// contract; messages are diagnostic only.
pub mod codes {
    pub const INVALID_CONTENT_TYPE: &str = "INVALID_CONTENT_TYPE";
    pub const INVALID_JSON: &str = "INVALID_JSON";
    pub const MISSING_FIELDS: &str = "MISSING_FIELDS";
    pub const INVALID_LOGIN: &str = "INVALID_LOGIN";
    pub const LOGIN_EXISTS: &str = "LOGIN_EXISTS";
    pub const INVALID_PASSWORD: &str = "INVALID_PASSWORD";
    pub const INVALID_CREDENTIALS: &str = "INVALID_CREDENTIALS";
    pub const MISSING_TOKEN: &str = "MISSING_TOKEN";
    pub const INVALID_TOKEN: &str = "INVALID_TOKEN";
    pub const INVALID_REFRESH_TOKEN: &str = "INVALID_REFRESH_TOKEN";
    pub const MISSING_QUERY: &str = "MISSING_QUERY";
    pub const INVALID_USER_ID: &str = "INVALID_USER_ID";
    pub const USER_NOT_FOUND: &str = "USER_NOT_FOUND";
    pub const SELF_MESSAGE: &str = "SELF_MESSAGE";
    pub const INVALID_MESSAGE: &str = "INVALID_MESSAGE";
    pub const MESSAGE_TOO_LONG: &str = "MESSAGE_TOO_LONG";
    pub const EMPTY_MESSAGE_IDS: &str = "EMPTY_MESSAGE_IDS";
    pub const ENDPOINT_NOT_FOUND: &str = "ENDPOINT_NOT_FOUND";
    pub const METHOD_NOT_ALLOWED: &str = "METHOD_NOT_ALLOWED";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
}

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{message}")]
    BadRequest { code: &'static str, message: String },
    #[error("{message}")]
    Unauthorized { code: &'static str, message: String },
    #[error("{message}")]
    Forbidden { code: &'static str, message: String },
    #[error("{message}")]
    NotFound { code: &'static str, message: String },
    #[error("{message}")]
    Conflict { code: &'static str, message: String },
    #[error("{0}")]
    Internal(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl AppError {
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::BadRequest { code, message: message.into() }
    }

    pub fn unauthorized(code: &'static str, message: impl Into<String>) -> Self {
        Self::Unauthorized { code, message: message.into() }
    }

    pub fn forbidden(code: &'static str, message: impl Into<String>) -> Self {
        Self::Forbidden { code, message: message.into() }
    }

    pub fn not_found(code: &'static str, message: impl Into<String>) -> Self {
        Self::NotFound { code, message: message.into() }
    }

    pub fn conflict(code: &'static str, message: impl Into<String>) -> Self {
        Self::Conflict { code, message: message.into() }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// The `(status, code, message)` triple rendered into the envelope.
    pub fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            Self::BadRequest { code, message } => {
                (StatusCode::BAD_REQUEST, code, message.clone())
            }
            Self::Unauthorized { code, message } => {
                (StatusCode::UNAUTHORIZED, code, message.clone())
            }
            Self::Forbidden { code, message } => (StatusCode::FORBIDDEN, code, message.clone()),
            Self::NotFound { code, message } => (StatusCode::NOT_FOUND, code, message.clone()),
            Self::Conflict { code, message } => (StatusCode::CONFLICT, code, message.clone()),
            Self::Internal(_) | Self::Database(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                codes::INTERNAL_ERROR,
                "Internal server error".to_string(),
            ),
        }
    }
}

impl From<PasswordError> for AppError {
    fn from(err: PasswordError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Store and driver failures never reach the client verbatim.
        match &self {
            Self::Database(err) => tracing::error!("database error: {err}"),
            Self::Internal(message) => tracing::error!("internal error: {message}"),
            _ => {}
        }

        let (status, code, message) = self.parts();
        let body = Json(json!({
            "status": "error",
            "code": code,
            "message": message,
        }));
        (status, body).into_response()
    }
}
