pub mod auth;
pub mod health;
pub mod messages;
pub mod users;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Json, Router};
use serde_json::json;

use crate::error::{codes, AppError};
use crate::state::SharedState;

/// Build the top-level router with all sub-routers merged. Unknown paths
/// and unsupported methods both answer with the error envelope.
pub fn router() -> Router<SharedState> {
    Router::new()
        // Health / readiness at root level
        .merge(health::router())
        // API v1 namespaced routes
        .nest("/api/v1/auth", auth::router())
        .nest("/api/v1/users", users::router())
        .nest("/api/v1/messages", messages::router())
        .fallback(endpoint_not_found)
        .method_not_allowed_fallback(method_not_allowed)
}

async fn endpoint_not_found() -> impl IntoResponse {
    AppError::not_found(codes::ENDPOINT_NOT_FOUND, "Endpoint not found")
}

async fn method_not_allowed() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({
            "status": "error",
            "code": codes::METHOD_NOT_ALLOWED,
            "message": "Method not supported by this endpoint",
        })),
    )
}
