use sqlx::SqlitePool;

// Idempotent bootstrap: the portal owns its tables and creates them on
// startup, so a fresh checkout runs against an empty database file.
const SQL_CREATE_USERS: &str = r#"
CREATE TABLE IF NOT EXISTS users (
  id TEXT PRIMARY KEY,
  name TEXT NOT NULL,
  email TEXT NOT NULL UNIQUE,
  role TEXT NOT NULL DEFAULT 'member'
    CHECK (role IN ('member', 'executive', 'staff'))
)
"#;

const SQL_CREATE_CURRENT_USER: &str = r#"
CREATE TABLE IF NOT EXISTS current_user (
  user_id TEXT NOT NULL
)
"#;

const SQL_CREATE_ACTIVITIES: &str = r#"
CREATE TABLE IF NOT EXISTS activities (
  id TEXT PRIMARY KEY,
  title TEXT NOT NULL,
  description TEXT,
  status TEXT NOT NULL DEFAULT 'planned',
  scheduled_at TEXT NOT NULL,
  location TEXT,
  organizer_user_id TEXT NOT NULL,
  created_at TEXT NOT NULL
)
"#;

const SQL_CREATE_PARTICIPATIONS: &str = r#"
CREATE TABLE IF NOT EXISTS participations (
  id TEXT PRIMARY KEY,
  activity_id TEXT NOT NULL,
  user_id TEXT NOT NULL,
  verified INTEGER NOT NULL DEFAULT 0,
  verified_at TEXT,
  appreciation TEXT NOT NULL DEFAULT '',
  suggestion TEXT NOT NULL DEFAULT '',
  rating INTEGER,
  photo1 TEXT,
  photo2 TEXT,
  photo3 TEXT,
  submitted_at TEXT,
  created_at TEXT NOT NULL,
  updated_at TEXT NOT NULL,
  UNIQUE (activity_id, user_id)
)
"#;

pub async fn init(pool: &SqlitePool) -> sqlx::Result<()> {
    for stmt in [
        SQL_CREATE_USERS,
        SQL_CREATE_CURRENT_USER,
        SQL_CREATE_ACTIVITIES,
        SQL_CREATE_PARTICIPATIONS,
    ] {
        sqlx::query(stmt).execute(pool).await?;
    }
    Ok(())
}
