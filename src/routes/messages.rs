use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::db;
use crate::db::messages::{Cursor, MessageFilter};
use crate::error::{codes, AppError, AppResult};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::ValidJson;
use crate::extractors::pagination::{clamp, parse_or};
use crate::models::message::{MarkReadRequest, Message, SendMessageRequest};
use crate::models::ModelError;
use crate::response;
use crate::state::SharedState;

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", get(list_messages))
        .route("/send", post(send_message))
        .route("/read", post(mark_read))
}

/// POST /send -- deliver a message to another user by login.
async fn send_message(
    State(state): State<SharedState>,
    auth_user: AuthUser,
    ValidJson(body): ValidJson<SendMessageRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let (Some(to_login), Some(text)) = (body.to_login, body.message) else {
        return Err(AppError::bad_request(
            codes::MISSING_FIELDS,
            "Both to_login and message are required",
        ));
    };
    if text.is_empty() {
        return Err(AppError::bad_request(
            codes::MISSING_FIELDS,
            "message must not be empty",
        ));
    }

    let recipient = db::users::find_by_login(&state.pool, &to_login)
        .await?
        .ok_or_else(|| {
            AppError::not_found(codes::USER_NOT_FOUND, "Recipient does not exist")
        })?;

    let message =
        Message::new(auth_user.user_id, recipient.user_id, &text).map_err(|e| match e {
            ModelError::SelfMessage => AppError::bad_request(
                codes::SELF_MESSAGE,
                "Messages cannot be sent to yourself",
            ),
            ModelError::MessageTooLong => {
                AppError::bad_request(codes::MESSAGE_TOO_LONG, e.to_string())
            }
            _ => AppError::bad_request(codes::INVALID_MESSAGE, e.to_string()),
        })?;

    db::messages::create(&state.pool, &message).await?;

    tracing::info!(
        message_id = %message.message_id,
        from = %auth_user.user_id,
        to = %recipient.user_id,
        "message sent"
    );

    Ok((
        StatusCode::CREATED,
        response::success_with_message(
            "Message sent successfully",
            json!({ "message_id": message.message_id, "sent_at": message.created_at }),
        ),
    ))
}

#[derive(Debug, Deserialize)]
struct ListParams {
    unread_only: Option<String>,
    limit: Option<String>,
    conversation_with: Option<String>,
    after_message_id: Option<String>,
    before_message_id: Option<String>,
}

fn parse_user_ref(raw: Option<&str>, field: &str) -> AppResult<Option<Uuid>> {
    match raw.filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => Uuid::parse_str(s).map(Some).map_err(|_| {
            AppError::bad_request(
                codes::INVALID_USER_ID,
                format!("{field} must be a valid UUID"),
            )
        }),
    }
}

/// Resolve a wire cursor parameter to its keyset position. An id that
/// references no message simply yields no cursor bound.
async fn resolve_cursor(
    state: &SharedState,
    raw: Option<&str>,
    field: &str,
) -> AppResult<Option<Cursor>> {
    match parse_user_ref(raw, field)? {
        None => Ok(None),
        Some(id) => Ok(db::messages::cursor_for(&state.pool, id).await?),
    }
}

/// GET / -- list messages where the caller is sender or recipient.
async fn list_messages(
    State(state): State<SharedState>,
    auth_user: AuthUser,
    Query(params): Query<ListParams>,
) -> AppResult<Json<Value>> {
    let unread_only = params
        .unread_only
        .as_deref()
        .is_some_and(|v| matches!(v, "true" | "1"));
    let limit = clamp(parse_or(&params.limit, 50), 1, 200);

    let conversation_with =
        parse_user_ref(params.conversation_with.as_deref(), "conversation_with")?;
    let after = resolve_cursor(&state, params.after_message_id.as_deref(), "after_message_id")
        .await?;
    let before =
        resolve_cursor(&state, params.before_message_id.as_deref(), "before_message_id")
            .await?;

    let filter = MessageFilter {
        user_id: auth_user.user_id,
        unread_only,
        conversation_with,
        after,
        before,
        limit,
    };

    let messages = db::messages::list_for_user(&state.pool, &filter).await?;
    let total_count = db::messages::count_for_user(&state.pool, &filter).await?;
    let unread_count = db::messages::unread_count(&state.pool, auth_user.user_id).await?;

    let has_more = messages.len() as i64 == limit;
    let last_message_id = messages.last().map(|m| m.message_id);

    Ok(response::success(json!({
        "messages": messages,
        "meta": {
            "total_count": total_count,
            "unread_count": unread_count,
            "has_more": has_more,
            "last_message_id": last_message_id,
        }
    })))
}

/// POST /read -- mark messages as read. Only rows addressed to the caller
/// are flipped; ids addressed to anyone else are silently ignored. The
/// reported `read_count` is the input cardinality; `affected_count`
/// carries the rows actually updated.
async fn mark_read(
    State(state): State<SharedState>,
    auth_user: AuthUser,
    ValidJson(body): ValidJson<MarkReadRequest>,
) -> AppResult<Json<Value>> {
    let Some(message_ids) = body.message_ids.filter(|ids| !ids.is_empty()) else {
        return Err(AppError::bad_request(
            codes::EMPTY_MESSAGE_IDS,
            "message_ids must be a non-empty array",
        ));
    };

    let affected =
        db::messages::mark_read(&state.pool, auth_user.user_id, &message_ids).await?;

    Ok(response::success(json!({
        "read_count": message_ids.len(),
        "affected_count": affected,
    })))
}
