use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::warn;

use crate::database::{activity_repo, participation_repo};
use crate::models::ParticipationRow;
use crate::otp::{verify, VerifyOutcome};
use crate::services::otp_service::{self, IssueOverrides};
use crate::state::AppState;
use crate::web::middleware::auth::AuthenticatedUser;

type ApiError = (StatusCode, Json<Value>);

fn internal_error(context: &str, e: impl std::fmt::Display) -> ApiError {
    warn!("{}: {}", context, e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "internal_error" })),
    )
}

#[derive(Debug, Deserialize, Default)]
pub struct GenerateOtpBody {
    pub validity_minutes: Option<u64>,
    pub length: Option<usize>,
}

/// POST /api/v1/activities/:activity_id/otp
pub async fn generate_otp_api(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(activity_id): Path<String>,
    State(state): State<AppState>,
    body: Option<Json<GenerateOtpBody>>,
) -> Result<Json<Value>, ApiError> {
    let activity = activity_repo::load_activity_by_id(&state.pool, &activity_id)
        .await
        .map_err(|e| internal_error("api_generate_otp_load_failed", e))?
        .ok_or((
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "activity_not_found" })),
        ))?;

    let allowed = otp_service::can_issue_code(&state.pool, &auth_user.id, &activity)
        .await
        .map_err(|e| internal_error("api_generate_otp_permission_failed", e))?;
    if !allowed {
        return Err((
            StatusCode::FORBIDDEN,
            Json(json!({ "error": "permission_denied" })),
        ));
    }

    let overrides = body.map(|Json(b)| b).unwrap_or_default();
    let issued = otp_service::issue_code(
        &state,
        &activity_id,
        IssueOverrides {
            length: overrides.length,
            validity_minutes: overrides.validity_minutes,
        },
    );
    Ok(Json(json!({
        "otp_code": issued.code,
        "expiry_time": issued.expires_at.to_rfc3339(),
        "activity": activity.title,
    })))
}

#[derive(Debug, Deserialize)]
pub struct VerifyOtpBody {
    pub activity_id: Option<String>,
    pub otp_code: Option<String>,
}

/// POST /api/v1/otp/verify: informational check, does not open the gate.
pub async fn verify_otp_api(
    State(state): State<AppState>,
    Json(body): Json<VerifyOtpBody>,
) -> Result<Json<Value>, ApiError> {
    let (Some(activity_id), Some(otp_code)) = (body.activity_id, body.otp_code) else {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "activity_id and otp_code are required" })),
        ));
    };

    let activity = activity_repo::load_activity_by_id(&state.pool, &activity_id)
        .await
        .map_err(|e| internal_error("api_verify_otp_load_failed", e))?
        .ok_or((
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "activity_not_found" })),
        ))?;

    match verify(&state.codes, &activity_id, &otp_code) {
        VerifyOutcome::Valid => Ok(Json(json!({
            "valid": true,
            "message": "Code is valid",
            "activity": activity.title,
        }))),
        VerifyOutcome::ExpiredOrAbsent => Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "valid": false, "message": "Code expired or no active code" })),
        )),
        VerifyOutcome::Mismatch => Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "valid": false, "message": "Incorrect code" })),
        )),
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct ParticipationsQuery {
    pub activity: Option<String>,
    pub user: Option<String>,
}

#[derive(Serialize)]
pub struct ParticipationDto {
    pub activity_id: String,
    pub user_id: String,
    pub rating: Option<i64>,
    pub appreciation: String,
    pub suggestion: String,
    pub verified_at: Option<String>,
    pub submitted_at: Option<String>,
}

impl From<ParticipationRow> for ParticipationDto {
    fn from(row: ParticipationRow) -> Self {
        Self {
            activity_id: row.activity_id,
            user_id: row.user_id,
            rating: row.rating,
            appreciation: row.appreciation,
            suggestion: row.suggestion,
            verified_at: row.verified_at,
            submitted_at: row.submitted_at,
        }
    }
}

/// GET /api/v1/participations?activity=&user=: verified participations.
pub async fn list_participations_api(
    Extension(_auth_user): Extension<AuthenticatedUser>,
    Query(query): Query<ParticipationsQuery>,
    State(state): State<AppState>,
) -> Result<Json<Value>, ApiError> {
    let rows = participation_repo::list_verified(
        &state.pool,
        query.activity.as_deref(),
        query.user.as_deref(),
    )
    .await
    .map_err(|e| internal_error("api_list_participations_failed", e))?;

    let participations: Vec<ParticipationDto> =
        rows.into_iter().map(ParticipationDto::from).collect();
    Ok(Json(json!({ "participations": participations })))
}
