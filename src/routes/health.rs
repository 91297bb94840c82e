use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::state::SharedState;

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/health", get(liveness))
        .route("/ready", get(readiness))
}

/// GET /health -- process is up; answers before any dependency.
async fn liveness() -> Json<Value> {
    Json(json!({ "status": "ok", "service": "nova-chat-server" }))
}

/// GET /ready -- the store must answer a probe query.
async fn readiness(State(state): State<SharedState>) -> (StatusCode, Json<Value>) {
    let probe = sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(&state.pool)
        .await;

    match probe {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({ "status": "ready", "database": "connected" })),
        ),
        Err(e) => {
            tracing::error!("readiness probe failed: {e}");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "not_ready", "database": "unreachable" })),
            )
        }
    }
}
