use sqlx::SqlitePool;

use crate::models::{ActivityParticipantsRow, ParticipationRow};

const SQL_INSERT_PARTICIPATION: &str = r#"
INSERT INTO participations (
  id,
  activity_id,
  user_id,
  created_at,
  updated_at
) VALUES (?, ?, ?, ?, ?)
ON CONFLICT (activity_id, user_id) DO NOTHING
"#;

const SQL_LOAD_PARTICIPATION: &str = r#"
SELECT id, activity_id, user_id, verified, verified_at,
       appreciation, suggestion, rating,
       photo1, photo2, photo3,
       submitted_at, created_at, updated_at
FROM participations
WHERE activity_id = ? AND user_id = ?
"#;

// The submitted_at IS NULL guard makes the update a no-op when two
// submissions race; the loser sees rows_affected = 0.
const SQL_RECORD_SUBMISSION: &str = r#"
UPDATE participations
SET verified = 1,
    verified_at = ?,
    appreciation = ?,
    suggestion = ?,
    rating = ?,
    photo1 = COALESCE(?, photo1),
    photo2 = COALESCE(?, photo2),
    photo3 = COALESCE(?, photo3),
    submitted_at = ?,
    updated_at = ?
WHERE activity_id = ? AND user_id = ? AND submitted_at IS NULL
"#;

const SQL_LIST_VERIFIED_PARTICIPANTS: &str = r#"
SELECT p.activity_id,
       p.user_id,
       u.name,
       p.rating,
       p.verified_at,
       p.submitted_at
FROM participations p
LEFT JOIN users u ON u.id = p.user_id
WHERE p.activity_id = ? AND p.verified = 1
ORDER BY p.submitted_at ASC
"#;

const SQL_LIST_VERIFIED: &str = r#"
SELECT id, activity_id, user_id, verified, verified_at,
       appreciation, suggestion, rating,
       photo1, photo2, photo3,
       submitted_at, created_at, updated_at
FROM participations
WHERE verified = 1
  AND (? IS NULL OR activity_id = ?)
  AND (? IS NULL OR user_id = ?)
ORDER BY submitted_at DESC
"#;

pub struct NewParticipation<'a> {
    pub id: &'a str,
    pub activity_id: &'a str,
    pub user_id: &'a str,
    pub now: &'a str,
}

/// Insert an empty record for (activity, user) unless one already exists,
/// then return whatever is stored. Safe to call any number of times; the
/// UNIQUE constraint keeps the pair single.
pub async fn get_or_create(
    pool: &SqlitePool,
    new: NewParticipation<'_>,
) -> sqlx::Result<ParticipationRow> {
    sqlx::query(SQL_INSERT_PARTICIPATION)
        .bind(new.id)
        .bind(new.activity_id)
        .bind(new.user_id)
        .bind(new.now)
        .bind(new.now)
        .execute(pool)
        .await?;

    let row = sqlx::query_as::<_, ParticipationRow>(SQL_LOAD_PARTICIPATION)
        .bind(new.activity_id)
        .bind(new.user_id)
        .fetch_one(pool)
        .await?;
    Ok(row)
}

pub async fn load_participation(
    pool: &SqlitePool,
    activity_id: &str,
    user_id: &str,
) -> sqlx::Result<Option<ParticipationRow>> {
    sqlx::query_as::<_, ParticipationRow>(SQL_LOAD_PARTICIPATION)
        .bind(activity_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

pub struct SubmittedFeedback<'a> {
    pub appreciation: &'a str,
    pub suggestion: &'a str,
    pub rating: Option<i64>,
    pub photo1: Option<&'a str>,
    pub photo2: Option<&'a str>,
    pub photo3: Option<&'a str>,
}

/// Stamp verification and submission in one statement. Returns the number
/// of rows touched: 0 means the record was already submitted.
pub async fn record_submission(
    pool: &SqlitePool,
    activity_id: &str,
    user_id: &str,
    feedback: SubmittedFeedback<'_>,
    now: &str,
) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_RECORD_SUBMISSION)
        .bind(now)
        .bind(feedback.appreciation)
        .bind(feedback.suggestion)
        .bind(feedback.rating)
        .bind(feedback.photo1)
        .bind(feedback.photo2)
        .bind(feedback.photo3)
        .bind(now)
        .bind(now)
        .bind(activity_id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

pub async fn list_verified_participants(
    pool: &SqlitePool,
    activity_id: &str,
) -> sqlx::Result<Vec<ActivityParticipantsRow>> {
    sqlx::query_as::<_, ActivityParticipantsRow>(SQL_LIST_VERIFIED_PARTICIPANTS)
        .bind(activity_id)
        .fetch_all(pool)
        .await
}

pub async fn list_verified(
    pool: &SqlitePool,
    activity_id: Option<&str>,
    user_id: Option<&str>,
) -> sqlx::Result<Vec<ParticipationRow>> {
    sqlx::query_as::<_, ParticipationRow>(SQL_LIST_VERIFIED)
        .bind(activity_id)
        .bind(activity_id)
        .bind(user_id)
        .bind(user_id)
        .fetch_all(pool)
        .await
}
