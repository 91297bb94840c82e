use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::models::message::{Message, MessageWithLogins};

/// Keyset cursor: messages page by `(created_at, message_id)` of a
/// referenced row, so paging follows time order even though the wire
/// parameters name a message id.
#[derive(Debug, Clone, Copy, sqlx::FromRow)]
pub struct Cursor {
    pub created_at: DateTime<Utc>,
    pub message_id: Uuid,
}

/// Filters for a caller's message listing. The caller is always either
/// sender or recipient of every returned row.
#[derive(Debug, Clone)]
pub struct MessageFilter {
    pub user_id: Uuid,
    pub unread_only: bool,
    pub conversation_with: Option<Uuid>,
    pub after: Option<Cursor>,
    pub before: Option<Cursor>,
    pub limit: i64,
}

pub async fn create(pool: &PgPool, message: &Message) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO messages (message_id, from_user_id, to_user_id, message_text, is_read, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(message.message_id)
    .bind(message.from_user_id)
    .bind(message.to_user_id)
    .bind(&message.message_text)
    .bind(message.is_read)
    .bind(message.created_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Resolve the keyset position of a message, if it exists.
pub async fn cursor_for(pool: &PgPool, message_id: Uuid) -> Result<Option<Cursor>, sqlx::Error> {
    sqlx::query_as::<_, Cursor>(
        "SELECT created_at, message_id FROM messages WHERE message_id = $1",
    )
    .bind(message_id)
    .fetch_optional(pool)
    .await
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &MessageFilter) {
    builder
        .push(" WHERE (m.from_user_id = ")
        .push_bind(filter.user_id)
        .push(" OR m.to_user_id = ")
        .push_bind(filter.user_id)
        .push(")");

    if filter.unread_only {
        builder
            .push(" AND m.is_read = FALSE AND m.to_user_id = ")
            .push_bind(filter.user_id);
    }

    if let Some(peer) = filter.conversation_with {
        builder
            .push(" AND (m.from_user_id = ")
            .push_bind(peer)
            .push(" OR m.to_user_id = ")
            .push_bind(peer)
            .push(")");
    }
}

fn build_list_query(filter: &MessageFilter) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(
        r#"
        SELECT m.message_id, m.from_user_id, m.to_user_id,
               fu.login AS from_login, tu.login AS to_login,
               m.message_text, m.is_read, m.created_at
        FROM messages m
        JOIN users fu ON fu.user_id = m.from_user_id
        JOIN users tu ON tu.user_id = m.to_user_id
        "#,
    );

    push_filters(&mut builder, filter);

    if let Some(after) = filter.after {
        builder
            .push(" AND (m.created_at, m.message_id) > (")
            .push_bind(after.created_at)
            .push(", ")
            .push_bind(after.message_id)
            .push(")");
    }
    if let Some(before) = filter.before {
        builder
            .push(" AND (m.created_at, m.message_id) < (")
            .push_bind(before.created_at)
            .push(", ")
            .push_bind(before.message_id)
            .push(")");
    }

    builder
        .push(" ORDER BY m.created_at DESC, m.message_id DESC LIMIT ")
        .push_bind(filter.limit);

    builder
}

/// Newest-first listing for the caller, honoring every filter.
pub async fn list_for_user(
    pool: &PgPool,
    filter: &MessageFilter,
) -> Result<Vec<MessageWithLogins>, sqlx::Error> {
    build_list_query(filter)
        .build_query_as::<MessageWithLogins>()
        .fetch_all(pool)
        .await
}

/// Count of messages matching the filter, ignoring cursors and limit.
pub async fn count_for_user(pool: &PgPool, filter: &MessageFilter) -> Result<i64, sqlx::Error> {
    let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM messages m");
    push_filters(&mut builder, filter);
    builder
        .build_query_scalar::<i64>()
        .fetch_one(pool)
        .await
}

/// Total unread messages addressed to the user.
pub async fn unread_count(pool: &PgPool, user_id: Uuid) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM messages WHERE to_user_id = $1 AND is_read = FALSE",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await
}

/// Flip `is_read` for the listed messages where the caller is the
/// recipient; rows addressed to anyone else are left untouched. Returns
/// the number of rows actually updated.
pub async fn mark_read(
    pool: &PgPool,
    recipient: Uuid,
    message_ids: &[Uuid],
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE messages SET is_read = TRUE WHERE to_user_id = $1 AND message_id = ANY($2)",
    )
    .bind(recipient)
    .bind(message_ids)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}
