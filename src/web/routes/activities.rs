use askama::Template;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse},
    Extension,
};
use tracing::warn;

use crate::services::activity_service::{self, ActivityCardView};
use crate::state::AppState;
use crate::web::middleware::auth::AuthenticatedUser;

#[derive(Template)]
#[template(path = "activities.html")]
pub struct ActivitiesTemplate {
    pub activities: Vec<ActivityCardView>,
}

pub async fn activities_handler(
    Extension(_auth_user): Extension<AuthenticatedUser>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let activities = match activity_service::load_activity_cards(&state.pool).await {
        Ok(list) => list,
        Err(e) => {
            warn!("Activity list load failed: {}", e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let template = ActivitiesTemplate { activities };
    Html(template.render().unwrap()).into_response()
}
