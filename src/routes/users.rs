use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::db;
use crate::error::{codes, AppError, AppResult};
use crate::extractors::auth::AuthUser;
use crate::extractors::pagination::{clamp, parse_or, PageParams};
use crate::models::user::UserResponse;
use crate::response;
use crate::state::SharedState;

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", get(list_users))
        .route("/search", get(search_users))
}

/// GET / -- paginated user directory, newest registrations first.
async fn list_users(
    State(state): State<SharedState>,
    _auth_user: AuthUser,
    Query(params): Query<PageParams>,
) -> AppResult<Json<Value>> {
    let page = params.page();
    let limit = params.limit();
    let search = params.search();

    let users = db::users::list(&state.pool, search, limit, params.offset()).await?;
    let total_count = db::users::count(&state.pool, search).await?;

    let total_pages = if total_count == 0 {
        0
    } else {
        (total_count + limit - 1) / limit
    };

    let users: Vec<UserResponse> = users.into_iter().map(UserResponse::from).collect();

    Ok(response::success(json!({
        "users": users,
        "pagination": {
            "page": page,
            "limit": limit,
            "total_count": total_count,
            "total_pages": total_pages,
            "has_next": page < total_pages,
            "has_prev": page > 1 && total_count > 0,
        }
    })))
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    query: Option<String>,
    limit: Option<String>,
}

/// GET /search -- login-ordered directory search.
async fn search_users(
    State(state): State<SharedState>,
    _auth_user: AuthUser,
    Query(params): Query<SearchParams>,
) -> AppResult<Json<Value>> {
    let Some(query) = params.query.filter(|q| !q.is_empty()) else {
        return Err(AppError::bad_request(
            codes::MISSING_QUERY,
            "query parameter is required",
        ));
    };

    let limit = clamp(parse_or(&params.limit, 20), 1, 50);

    let users = db::users::search(&state.pool, &query, limit).await?;
    let users: Vec<UserResponse> = users.into_iter().map(UserResponse::from).collect();
    let count = users.len();

    Ok(response::success(json!({
        "users": users,
        "meta": {
            "query": query,
            "count": count,
            "limit": limit,
        }
    })))
}
