use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::error::{codes, AppError};
use crate::state::SharedState;

/// Authenticated caller extracted from the `Authorization: Bearer` access
/// token. Verification covers signature, issuer, expiry, token type, and
/// the revocation set.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub login: String,
    /// The raw bearer token; logout and account deletion revoke it.
    pub token: String,
}

fn invalid_token(message: impl Into<String>) -> AppError {
    AppError::unauthorized(codes::INVALID_TOKEN, message)
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    SharedState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = SharedState::from_ref(state);

        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| invalid_token("Missing authorization header"))?;

        let token = header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| invalid_token("Authorization header must carry a bearer token"))?;

        let info = state
            .tokens
            .verify_and_decode(token)
            .map_err(|e| invalid_token(format!("Invalid token: {e}")))?;

        if !info.is_access_token() {
            return Err(invalid_token("An access token is required"));
        }

        let login = info
            .login
            .ok_or_else(|| invalid_token("Token carries no login"))?;

        Ok(AuthUser {
            user_id: info.user_id,
            login,
            token: token.to_string(),
        })
    }
}
