// Participant rows joined with user display data for the list page.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ActivityParticipantsRow {
    pub activity_id: String,
    pub user_id: String,
    pub name: Option<String>,
    pub rating: Option<i64>,
    pub verified_at: Option<String>,
    pub submitted_at: Option<String>,
}
