#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ActivitiesRow {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub scheduled_at: String,
    pub location: Option<String>,
    pub organizer_user_id: String,
    pub created_at: String,
}
