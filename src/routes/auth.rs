use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{delete, post, put};
use axum::{Json, Router};
use chrono::Utc;
use serde_json::{json, Value};

use crate::db;
use crate::error::{codes, AppError, AppResult};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::ValidJson;
use crate::models::auth::{
    AuthResponse, ChangePasswordRequest, LoginRequest, LogoutRequest, RefreshRequest,
};
use crate::models::user::{RegisterRequest, User};
use crate::models::ModelError;
use crate::response;
use crate::security::{password, validation};
use crate::state::SharedState;

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .route("/logout", post(logout))
        .route("/password", put(change_password))
        .route("/account", delete(delete_account))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn missing_fields(message: &str) -> AppError {
    AppError::bad_request(codes::MISSING_FIELDS, message.to_string())
}

/// Mint an access + refresh pair and build the login-shaped response body.
fn issue_token_pair(state: &SharedState, user: &User) -> AppResult<AuthResponse> {
    let access_token = state
        .tokens
        .issue_access_token(&user.user_id.to_string(), &user.login)?;
    let refresh_token = state
        .tokens
        .issue_refresh_token(&user.user_id.to_string())?;

    Ok(AuthResponse {
        access_token,
        refresh_token,
        token_type: "Bearer",
        expires_in: state.tokens.access_expiry_secs(),
        user_id: user.user_id,
        login: user.login.clone(),
    })
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /register -- create a new user account.
async fn register(
    State(state): State<SharedState>,
    ValidJson(body): ValidJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let (Some(login), Some(pw)) = (body.login, body.password) else {
        return Err(missing_fields("Both login and password are required"));
    };

    if !validation::login_valid(&login) {
        return Err(AppError::bad_request(
            codes::INVALID_LOGIN,
            "Login must be 3-50 characters of letters, digits, or underscore",
        ));
    }

    if db::users::login_exists(&state.pool, &login).await? {
        return Err(AppError::conflict(
            codes::LOGIN_EXISTS,
            "This login is already taken",
        ));
    }

    if !validation::password_valid(&pw) {
        return Err(AppError::bad_request(
            codes::INVALID_PASSWORD,
            "Password must be 6-128 characters with at least one letter and one digit",
        ));
    }

    let user = User::create_from_credentials(&login, &pw).map_err(|e| match e {
        ModelError::InvalidLogin => AppError::bad_request(codes::INVALID_LOGIN, e.to_string()),
        _ => AppError::bad_request(codes::INVALID_PASSWORD, e.to_string()),
    })?;

    db::users::create(&state.pool, &user).await?;

    tracing::info!(user_id = %user.user_id, login = %user.login, "user registered");

    Ok((
        StatusCode::CREATED,
        response::success_with_message(
            "User registered successfully",
            json!({ "user_id": user.user_id, "login": user.login }),
        ),
    ))
}

/// POST /login -- authenticate and return a token pair.
async fn login(
    State(state): State<SharedState>,
    ValidJson(body): ValidJson<LoginRequest>,
) -> AppResult<Json<Value>> {
    let (Some(login), Some(pw)) = (body.login, body.password) else {
        return Err(missing_fields("Both login and password are required"));
    };

    let user = db::users::find_by_login(&state.pool, &login)
        .await?
        .filter(|u| password::verify_password(&pw, &u.password_hash, ""))
        .ok_or_else(|| {
            AppError::unauthorized(codes::INVALID_CREDENTIALS, "Invalid login or password")
        })?;

    let tokens = issue_token_pair(&state, &user)?;

    let expires_at = Utc::now() + state.tokens.refresh_expiry();
    db::refresh_tokens::store(
        &state.pool,
        user.user_id,
        &password::fingerprint(&tokens.refresh_token),
        expires_at,
    )
    .await?;

    tracing::info!(user_id = %user.user_id, "user logged in");

    Ok(response::success(serde_json::to_value(tokens).map_err(
        |e| AppError::internal(format!("serialization error: {e}")),
    )?))
}

/// POST /refresh -- exchange a refresh token for a new pair (rotation).
async fn refresh(
    State(state): State<SharedState>,
    ValidJson(body): ValidJson<RefreshRequest>,
) -> AppResult<Json<Value>> {
    let Some(refresh_token) = body.refresh_token.filter(|t| !t.is_empty()) else {
        return Err(AppError::bad_request(
            codes::MISSING_TOKEN,
            "refresh_token is required",
        ));
    };

    let invalid = || {
        AppError::unauthorized(
            codes::INVALID_REFRESH_TOKEN,
            "Refresh token is invalid or expired",
        )
    };

    let info = state
        .tokens
        .verify_and_decode(&refresh_token)
        .map_err(|_| invalid())?;
    if !info.is_refresh_token() {
        return Err(invalid());
    }

    // The token must also still be on record; logout and rotation remove it.
    let old_hash = password::fingerprint(&refresh_token);
    let user_id = db::refresh_tokens::find_valid(&state.pool, &old_hash)
        .await?
        .filter(|id| *id == info.user_id)
        .ok_or_else(invalid)?;

    let user = db::users::find_by_id(&state.pool, user_id)
        .await?
        .ok_or_else(invalid)?;

    let tokens = issue_token_pair(&state, &user)?;

    let expires_at = Utc::now() + state.tokens.refresh_expiry();
    db::refresh_tokens::rotate(
        &state.pool,
        user.user_id,
        &old_hash,
        &password::fingerprint(&tokens.refresh_token),
        expires_at,
    )
    .await?;

    Ok(response::success(serde_json::to_value(tokens).map_err(
        |e| AppError::internal(format!("serialization error: {e}")),
    )?))
}

/// POST /logout -- revoke the access token and drop the refresh record.
async fn logout(
    State(state): State<SharedState>,
    auth_user: AuthUser,
    ValidJson(body): ValidJson<LogoutRequest>,
) -> AppResult<Json<Value>> {
    let Some(refresh_token) = body.refresh_token.filter(|t| !t.is_empty()) else {
        return Err(AppError::bad_request(
            codes::MISSING_TOKEN,
            "refresh_token is required",
        ));
    };

    // Revocation is process-local and best-effort; it never blocks logout.
    state.tokens.revoke(&auth_user.token);

    if let Err(e) =
        db::refresh_tokens::delete_by_hash(&state.pool, &password::fingerprint(&refresh_token))
            .await
    {
        tracing::warn!(user_id = %auth_user.user_id, "failed to delete refresh token: {e}");
    }

    tracing::info!(user_id = %auth_user.user_id, "user logged out");

    Ok(response::success_message("Logged out successfully"))
}

/// PUT /password -- change the password while authenticated.
async fn change_password(
    State(state): State<SharedState>,
    auth_user: AuthUser,
    ValidJson(body): ValidJson<ChangePasswordRequest>,
) -> AppResult<Json<Value>> {
    let (Some(old_pw), Some(new_pw)) = (body.old_password, body.new_password) else {
        return Err(missing_fields(
            "Both old_password and new_password are required",
        ));
    };

    let user = db::users::find_by_id(&state.pool, auth_user.user_id)
        .await?
        .ok_or_else(|| {
            AppError::unauthorized(codes::INVALID_TOKEN, "Account no longer exists")
        })?;

    if !password::verify_password(&old_pw, &user.password_hash, "") {
        return Err(AppError::forbidden(
            codes::INVALID_PASSWORD,
            "Current password is incorrect",
        ));
    }

    if !validation::password_valid(&new_pw) {
        return Err(AppError::bad_request(
            codes::INVALID_PASSWORD,
            "Password must be 6-128 characters with at least one letter and one digit",
        ));
    }

    let new_hash = password::hash_password(&new_pw, "")?;
    db::users::update_password(&state.pool, user.user_id, &new_hash).await?;

    tracing::info!(user_id = %user.user_id, "password changed");

    Ok(response::success_message("Password changed successfully"))
}

/// DELETE /account -- delete the caller's account. Messages and refresh
/// tokens cascade in the store; the live access token is revoked here.
async fn delete_account(
    State(state): State<SharedState>,
    auth_user: AuthUser,
) -> AppResult<Json<Value>> {
    db::users::delete(&state.pool, auth_user.user_id).await?;
    state.tokens.revoke(&auth_user.token);

    tracing::info!(user_id = %auth_user.user_id, "account deleted");

    Ok(response::success_message("Account deleted successfully"))
}
