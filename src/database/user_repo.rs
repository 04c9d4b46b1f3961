use sqlx::SqlitePool;

use crate::models::{CurrentUserRow, UsersRow};

const SQL_LOAD_USER_BY_ID: &str = r#"
SELECT id, name, email, role
FROM users
WHERE id = ?
LIMIT 1
"#;

const SQL_LOAD_CURRENT_USER_ID: &str = r#"
SELECT user_id
FROM current_user
LIMIT 1
"#;

pub async fn load_user_by_id(pool: &SqlitePool, user_id: &str) -> sqlx::Result<Option<UsersRow>> {
    sqlx::query_as::<_, UsersRow>(SQL_LOAD_USER_BY_ID)
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

// Offline/local fallback used by the auth middleware when no token cookie
// is present.
pub async fn load_current_user_id(pool: &SqlitePool) -> sqlx::Result<Option<String>> {
    let row = sqlx::query_as::<_, CurrentUserRow>(SQL_LOAD_CURRENT_USER_ID)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|r| r.user_id))
}
