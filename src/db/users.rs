use sqlx::PgPool;
use uuid::Uuid;

use crate::models::user::User;

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "SELECT user_id, login, password_hash, created_at FROM users WHERE user_id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn find_by_login(pool: &PgPool, login: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "SELECT user_id, login, password_hash, created_at FROM users WHERE login = $1",
    )
    .bind(login)
    .fetch_optional(pool)
    .await
}

pub async fn login_exists(pool: &PgPool, login: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE login = $1)")
        .bind(login)
        .fetch_one(pool)
        .await
}

pub async fn create(pool: &PgPool, user: &User) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO users (user_id, login, password_hash, created_at)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(user.user_id)
    .bind(&user.login)
    .bind(&user.password_hash)
    .bind(user.created_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn update_password(
    pool: &PgPool,
    user_id: Uuid,
    password_hash: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET password_hash = $2 WHERE user_id = $1")
        .bind(user_id)
        .bind(password_hash)
        .execute(pool)
        .await?;
    Ok(())
}

/// Delete a user row. Messages and refresh tokens follow via ON DELETE
/// CASCADE. Returns true when a row was removed.
pub async fn delete(pool: &PgPool, user_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM users WHERE user_id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Paginated directory listing, newest registrations first. `search`
/// narrows by substring match on the login.
pub async fn list(
    pool: &PgPool,
    search: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<Vec<User>, sqlx::Error> {
    match search {
        Some(term) => {
            sqlx::query_as::<_, User>(
                r#"
                SELECT user_id, login, password_hash, created_at
                FROM users
                WHERE login ILIKE $1
                ORDER BY created_at DESC
                LIMIT $2 OFFSET $3
                "#,
            )
            .bind(like_pattern(term))
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
        }
        None => {
            sqlx::query_as::<_, User>(
                r#"
                SELECT user_id, login, password_hash, created_at
                FROM users
                ORDER BY created_at DESC
                LIMIT $1 OFFSET $2
                "#,
            )
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
        }
    }
}

/// Directory size, honoring the same search filter as [`list`].
pub async fn count(pool: &PgPool, search: Option<&str>) -> Result<i64, sqlx::Error> {
    match search {
        Some(term) => {
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE login ILIKE $1")
                .bind(like_pattern(term))
                .fetch_one(pool)
                .await
        }
        None => {
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
                .fetch_one(pool)
                .await
        }
    }
}

/// Login-ordered search used by the directory search endpoint.
pub async fn search(pool: &PgPool, query: &str, limit: i64) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT user_id, login, password_hash, created_at
        FROM users
        WHERE login ILIKE $1
        ORDER BY login ASC
        LIMIT $2
        "#,
    )
    .bind(like_pattern(query))
    .bind(limit)
    .fetch_all(pool)
    .await
}

/// Escape LIKE metacharacters so a search term matches literally.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_escapes_metacharacters() {
        assert_eq!(like_pattern("bob"), "%bob%");
        assert_eq!(like_pattern("100%"), "%100\\%%");
        assert_eq!(like_pattern("a_b"), "%a\\_b%");
        assert_eq!(like_pattern(r"a\b"), r"%a\\b%");
    }
}
