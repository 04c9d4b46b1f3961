#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ParticipationRow {
    pub id: String,
    pub activity_id: String,
    pub user_id: String,
    pub verified: i64,
    pub verified_at: Option<String>,
    pub appreciation: String,
    pub suggestion: String,
    pub rating: Option<i64>,
    pub photo1: Option<String>,
    pub photo2: Option<String>,
    pub photo3: Option<String>,
    pub submitted_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl ParticipationRow {
    /// A participation counts as complete once it is verified and the
    /// feedback form has been submitted.
    pub fn is_complete(&self) -> bool {
        self.verified != 0 && self.submitted_at.is_some()
    }
}
