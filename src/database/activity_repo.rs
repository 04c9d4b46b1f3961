use sqlx::SqlitePool;

use crate::models::ActivitiesRow;

const SQL_LOAD_ACTIVITY_BY_ID: &str = r#"
SELECT id, title, description, status, scheduled_at, location,
       organizer_user_id, created_at
FROM activities
WHERE id = ?
"#;

const SQL_LIST_ACTIVITIES: &str = r#"
SELECT id, title, description, status, scheduled_at, location,
       organizer_user_id, created_at
FROM activities
ORDER BY scheduled_at DESC
"#;

pub async fn load_activity_by_id(
    pool: &SqlitePool,
    activity_id: &str,
) -> sqlx::Result<Option<ActivitiesRow>> {
    sqlx::query_as::<_, ActivitiesRow>(SQL_LOAD_ACTIVITY_BY_ID)
        .bind(activity_id)
        .fetch_optional(pool)
        .await
}

pub async fn list_activities(pool: &SqlitePool) -> sqlx::Result<Vec<ActivitiesRow>> {
    sqlx::query_as::<_, ActivitiesRow>(SQL_LIST_ACTIVITIES)
        .fetch_all(pool)
        .await
}
