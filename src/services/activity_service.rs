use sqlx::SqlitePool;

use crate::database::{activity_repo, participation_repo};
use crate::models::ActivitiesRow;
use crate::services::otp_service;
use crate::state::AppState;

pub struct ActivityCardView {
    pub activity_id: String,
    pub title: String,
    pub status: String,
    pub scheduled_date_label: String,
    pub scheduled_time_label: String,
    pub location_label: String,
}

pub struct ActivityDetailView {
    pub activity_id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub scheduled_date_label: String,
    pub scheduled_time_label: String,
    pub location_label: String,
    pub can_issue_code: bool,
    /// not_started | pending | verified | complete
    pub my_participation_state: String,
    pub code_expiry_label: Option<String>,
    pub notice: Option<String>,
}

pub async fn load_activity_cards(pool: &SqlitePool) -> sqlx::Result<Vec<ActivityCardView>> {
    let rows = activity_repo::list_activities(pool).await?;
    Ok(rows.into_iter().map(card_view).collect())
}

pub async fn load_activity_detail_view(
    state: &AppState,
    user_id: &str,
    activity_id: &str,
    notice: Option<String>,
) -> sqlx::Result<Option<ActivityDetailView>> {
    let Some(row) = activity_repo::load_activity_by_id(&state.pool, activity_id).await? else {
        return Ok(None);
    };

    let can_issue_code = otp_service::can_issue_code(&state.pool, user_id, &row).await?;
    let participation =
        participation_repo::load_participation(&state.pool, activity_id, user_id).await?;
    let my_participation_state = match &participation {
        None => "not_started",
        Some(p) if p.is_complete() => "complete",
        Some(p) if p.verified != 0 => "verified",
        Some(_) => "pending",
    }
    .to_string();

    let code_expiry_label = state
        .codes
        .expiry(activity_id)
        .map(|dt| dt.format("%Y-%m-%d %H:%M UTC").to_string());

    let (scheduled_date_label, scheduled_time_label) = scheduled_labels(&row.scheduled_at);
    Ok(Some(ActivityDetailView {
        activity_id: row.id,
        title: row.title,
        description: row.description,
        status: row.status,
        scheduled_date_label,
        scheduled_time_label,
        location_label: location_label(row.location.as_deref()),
        can_issue_code,
        my_participation_state,
        code_expiry_label,
        notice,
    }))
}

fn card_view(row: ActivitiesRow) -> ActivityCardView {
    let (scheduled_date_label, scheduled_time_label) = scheduled_labels(&row.scheduled_at);
    ActivityCardView {
        activity_id: row.id,
        title: row.title,
        status: row.status,
        scheduled_date_label,
        scheduled_time_label,
        location_label: location_label(row.location.as_deref()),
    }
}

fn scheduled_labels(scheduled_at: &str) -> (String, String) {
    let date = scheduled_at.get(0..10).unwrap_or(scheduled_at);
    let time = scheduled_at.get(11..16).unwrap_or("");
    (date.to_string(), time.to_string())
}

fn location_label(location: Option<&str>) -> String {
    location
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("Location TBA")
        .to_string()
}
