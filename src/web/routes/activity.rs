use askama::Template;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse},
    Extension,
};
use serde::Deserialize;
use tracing::warn;

use crate::services::activity_service::{self, ActivityDetailView};
use crate::state::AppState;
use crate::web::middleware::auth::AuthenticatedUser;

#[derive(Template)]
#[template(path = "activity.html")]
pub struct ActivityDetailTemplate {
    pub activity: ActivityDetailView,
    pub notice_message: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ActivityDetailQuery {
    pub notice: Option<String>,
}

pub async fn activity_detail_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(activity_id): Path<String>,
    Query(query): Query<ActivityDetailQuery>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let view = match activity_service::load_activity_detail_view(
        &state,
        &auth_user.id,
        &activity_id,
        query.notice.clone(),
    )
    .await
    {
        Ok(v) => v,
        Err(e) => {
            warn!("Activity detail load failed for {}: {}", activity_id, e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let Some(view) = view else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let notice_message = view.notice.as_deref().map(notice_message);
    let template = ActivityDetailTemplate {
        activity: view,
        notice_message,
    };
    Html(template.render().unwrap()).into_response()
}

fn notice_message(token: &str) -> String {
    match token {
        "participation_ok" => "Your participation has been recorded. Thank you!",
        "already_submitted" => "You already submitted your participation for this activity.",
        "forbidden" => "You do not have permission to generate a check-in code.",
        _ => "Done.",
    }
    .to_string()
}
