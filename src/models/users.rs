#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CurrentUserRow {
    pub user_id: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UsersRow {
    pub id: String,
    pub name: String,
    pub email: String,
    /// member | executive | staff
    pub role: String,
}
