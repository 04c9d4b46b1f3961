use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::database::user_repo;
use crate::models::ActivitiesRow;
use crate::otp::generate_code;
use crate::state::AppState;

pub struct IssuedCode {
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

/// Per-call overrides for the configured defaults.
#[derive(Debug, Default, Clone, Copy)]
pub struct IssueOverrides {
    pub length: Option<usize>,
    pub validity_minutes: Option<u64>,
}

/// Issuing a check-in code is reserved for the activity's organizer and
/// association executives/staff.
pub async fn can_issue_code(
    pool: &SqlitePool,
    user_id: &str,
    activity: &ActivitiesRow,
) -> sqlx::Result<bool> {
    if activity.organizer_user_id == user_id {
        return Ok(true);
    }
    let Some(user) = user_repo::load_user_by_id(pool, user_id).await? else {
        return Ok(false);
    };
    Ok(matches!(user.role.as_str(), "executive" | "staff"))
}

/// Generate a fresh code for the activity and store it with the configured
/// (or per-call) TTL. Any previous code for the same activity is
/// overwritten and its countdown restarted.
pub fn issue_code(state: &AppState, activity_id: &str, overrides: IssueOverrides) -> IssuedCode {
    let length = overrides
        .length
        .filter(|len| *len > 0)
        .unwrap_or(state.config.otp_code_length);
    let ttl = overrides
        .validity_minutes
        .filter(|m| *m > 0)
        .map(|m| Duration::from_secs(m * 60))
        .unwrap_or_else(|| state.otp_ttl());

    let code = generate_code(length);
    let expires_at = state.codes.put(activity_id, &code, ttl);
    IssuedCode { code, expires_at }
}

#[cfg(test)]
mod tests {
    use sqlx::sqlite::SqlitePoolOptions;

    use super::*;
    use crate::config::Config;
    use crate::database::schema;

    async fn test_state() -> AppState {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory pool");
        schema::init(&pool).await.expect("schema");
        let config = Config {
            otp_validity_minutes: 180,
            otp_code_length: 6,
            gate_validity_minutes: 180,
            auth_api_url: String::new(),
            media_root: "media".to_string(),
        };
        AppState::new(pool, config)
    }

    fn activity(organizer: &str) -> ActivitiesRow {
        ActivitiesRow {
            id: "a1".to_string(),
            title: "Chess night".to_string(),
            description: None,
            status: "planned".to_string(),
            scheduled_at: "2026-08-07T18:00:00Z".to_string(),
            location: None,
            organizer_user_id: organizer.to_string(),
            created_at: "2026-08-01T00:00:00Z".to_string(),
        }
    }

    async fn insert_user(state: &AppState, id: &str, role: &str) {
        sqlx::query("INSERT INTO users (id, name, email, role) VALUES (?, ?, ?, ?)")
            .bind(id)
            .bind("Test User")
            .bind(format!("{}@example.org", id))
            .bind(role)
            .execute(&state.pool)
            .await
            .expect("insert user");
    }

    #[tokio::test]
    async fn organizer_and_executives_can_issue() {
        let state = test_state().await;
        insert_user(&state, "member1", "member").await;
        insert_user(&state, "exec1", "executive").await;
        insert_user(&state, "staff1", "staff").await;

        let act = activity("organizer1");
        assert!(can_issue_code(&state.pool, "organizer1", &act).await.unwrap());
        assert!(can_issue_code(&state.pool, "exec1", &act).await.unwrap());
        assert!(can_issue_code(&state.pool, "staff1", &act).await.unwrap());
        assert!(!can_issue_code(&state.pool, "member1", &act).await.unwrap());
        // Unknown users get nothing.
        assert!(!can_issue_code(&state.pool, "ghost", &act).await.unwrap());
    }

    #[tokio::test]
    async fn issue_uses_configured_defaults() {
        let state = test_state().await;
        let issued = issue_code(&state, "a1", IssueOverrides::default());
        assert_eq!(issued.code.len(), 6);
        assert_eq!(state.codes.get("a1").as_deref(), Some(issued.code.as_str()));
        assert!(issued.expires_at > Utc::now());
    }

    #[tokio::test]
    async fn per_call_overrides_win() {
        let state = test_state().await;
        let issued = issue_code(
            &state,
            "a1",
            IssueOverrides {
                length: Some(8),
                validity_minutes: Some(10),
            },
        );
        assert_eq!(issued.code.len(), 8);
        let minutes_left = (issued.expires_at - Utc::now()).num_minutes();
        assert!((8..=10).contains(&minutes_left), "got {}", minutes_left);
    }
}
