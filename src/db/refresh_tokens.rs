use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

/// Persist a refresh-token fingerprint. The plaintext token never reaches
/// this layer.
pub async fn store(
    pool: &PgPool,
    user_id: Uuid,
    token_hash: &str,
    expires_at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO refresh_tokens (token_id, user_id, token_hash, expires_at)
        VALUES (gen_random_uuid(), $1, $2, $3)
        "#,
    )
    .bind(user_id)
    .bind(token_hash)
    .bind(expires_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Look up an unexpired refresh record by fingerprint.
pub async fn find_valid(pool: &PgPool, token_hash: &str) -> Result<Option<Uuid>, sqlx::Error> {
    sqlx::query_scalar::<_, Uuid>(
        "SELECT user_id FROM refresh_tokens WHERE token_hash = $1 AND expires_at > NOW()",
    )
    .bind(token_hash)
    .fetch_optional(pool)
    .await
}

pub async fn delete_by_hash(pool: &PgPool, token_hash: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM refresh_tokens WHERE token_hash = $1")
        .bind(token_hash)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// Rotation: persist the replacement fingerprint and remove the consumed
/// one in a single transaction, so a crash cannot leave both valid.
pub async fn rotate(
    pool: &PgPool,
    user_id: Uuid,
    old_token_hash: &str,
    new_token_hash: &str,
    new_expires_at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO refresh_tokens (token_id, user_id, token_hash, expires_at)
        VALUES (gen_random_uuid(), $1, $2, $3)
        "#,
    )
    .bind(user_id)
    .bind(new_token_hash)
    .bind(new_expires_at)
    .execute(&mut *tx)
    .await?;

    sqlx::query("DELETE FROM refresh_tokens WHERE token_hash = $1")
        .bind(old_token_hash)
        .execute(&mut *tx)
        .await?;

    tx.commit().await
}
