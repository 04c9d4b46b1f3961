use askama::Template;
use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect},
    Extension, Form,
};
use serde::Deserialize;
use tracing::warn;
use uuid::Uuid;

use crate::database::{activity_repo, participation_repo};
use crate::models::{ActivitiesRow, ActivityParticipantsRow};
use crate::otp::{verify, VerifyOutcome};
use crate::services::otp_service::{self, IssueOverrides};
use crate::services::participation_service::{
    self, FeedbackSubmission, FormAccess, SubmitError,
};
use crate::state::AppState;
use crate::web::middleware::auth::AuthenticatedUser;

const MAX_PHOTOS: usize = 3;

#[derive(Template)]
#[template(path = "otp_generated.html")]
pub struct OtpGeneratedTemplate {
    pub activity_id: String,
    pub activity_title: String,
    pub otp_code: String,
    pub expiry_label: String,
}

#[derive(Template)]
#[template(path = "verify_otp.html")]
pub struct VerifyOtpTemplate {
    pub activity_id: String,
    pub activity_title: String,
    pub expiry_label: Option<String>,
    pub error_message: Option<String>,
}

#[derive(Template)]
#[template(path = "participation_form.html")]
pub struct ParticipationFormTemplate {
    pub activity_id: String,
    pub activity_title: String,
    pub appreciation: String,
    pub suggestion: String,
    pub error_message: Option<String>,
}

#[derive(Template)]
#[template(path = "participant_list.html")]
pub struct ParticipantListTemplate {
    pub activity_title: String,
    pub participants: Vec<ParticipantView>,
}

pub struct ParticipantView {
    pub name: String,
    pub rating_label: String,
    pub submitted_label: String,
}

async fn load_activity(
    state: &AppState,
    activity_id: &str,
) -> Result<ActivitiesRow, axum::response::Response> {
    match activity_repo::load_activity_by_id(&state.pool, activity_id).await {
        Ok(Some(row)) => Ok(row),
        Ok(None) => Err(StatusCode::NOT_FOUND.into_response()),
        Err(e) => {
            warn!("Activity load failed for {}: {}", activity_id, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR.into_response())
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct GenerateOtpForm {
    pub validity_minutes: Option<u64>,
    pub length: Option<usize>,
}

/// POST /activities/:activity_id/otp: organizer generates a check-in code.
pub async fn generate_otp_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(activity_id): Path<String>,
    State(state): State<AppState>,
    Form(form): Form<GenerateOtpForm>,
) -> impl IntoResponse {
    let activity = match load_activity(&state, &activity_id).await {
        Ok(a) => a,
        Err(resp) => return resp,
    };

    match otp_service::can_issue_code(&state.pool, &auth_user.id, &activity).await {
        Ok(true) => {}
        Ok(false) => {
            return Redirect::to(&format!("/activities/{}?notice=forbidden", activity_id))
                .into_response();
        }
        Err(e) => {
            warn!("Permission check failed for {}: {}", activity_id, e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    }

    let issued = otp_service::issue_code(
        &state,
        &activity_id,
        IssueOverrides {
            length: form.length,
            validity_minutes: form.validity_minutes,
        },
    );
    let template = OtpGeneratedTemplate {
        activity_id,
        activity_title: activity.title,
        otp_code: issued.code,
        expiry_label: issued.expires_at.format("%Y-%m-%d %H:%M UTC").to_string(),
    };
    Html(template.render().unwrap()).into_response()
}

#[derive(Debug, Deserialize, Default)]
pub struct VerifyPageQuery {
    pub notice: Option<String>,
}

/// GET /activities/:activity_id/verify: code entry page.
pub async fn verify_otp_page(
    Extension(_auth_user): Extension<AuthenticatedUser>,
    Path(activity_id): Path<String>,
    Query(query): Query<VerifyPageQuery>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let activity = match load_activity(&state, &activity_id).await {
        Ok(a) => a,
        Err(resp) => return resp,
    };

    let expiry_label = state
        .codes
        .expiry(&activity_id)
        .map(|dt| dt.format("%Y-%m-%d %H:%M UTC").to_string());

    let template = VerifyOtpTemplate {
        activity_id,
        activity_title: activity.title,
        expiry_label,
        error_message: query.notice.as_deref().map(verify_notice_message),
    };
    Html(template.render().unwrap()).into_response()
}

#[derive(Debug, Deserialize)]
pub struct VerifyOtpForm {
    pub otp_code: String,
}

/// POST /activities/:activity_id/verify: compare the submitted code; on
/// success open the gate and move on to the participation form.
pub async fn verify_otp_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(activity_id): Path<String>,
    State(state): State<AppState>,
    Form(form): Form<VerifyOtpForm>,
) -> impl IntoResponse {
    if let Err(resp) = load_activity(&state, &activity_id).await {
        return resp;
    }

    match verify(&state.codes, &activity_id, &form.otp_code) {
        VerifyOutcome::Valid => {
            state.gate.open(&auth_user.id, &activity_id);
            Redirect::to(&format!("/activities/{}/participation", activity_id)).into_response()
        }
        VerifyOutcome::ExpiredOrAbsent => Redirect::to(&format!(
            "/activities/{}/verify?notice=code_expired_or_absent",
            activity_id
        ))
        .into_response(),
        VerifyOutcome::Mismatch => Redirect::to(&format!(
            "/activities/{}/verify?notice=code_mismatch",
            activity_id
        ))
        .into_response(),
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct FormPageQuery {
    pub notice: Option<String>,
}

/// GET /activities/:activity_id/participation: the gated feedback form.
pub async fn participation_form_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(activity_id): Path<String>,
    Query(query): Query<FormPageQuery>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let activity = match load_activity(&state, &activity_id).await {
        Ok(a) => a,
        Err(resp) => return resp,
    };

    match participation_service::access_form(&state, &auth_user.id, &activity_id).await {
        Ok(FormAccess::Open(row)) => {
            let template = ParticipationFormTemplate {
                activity_id,
                activity_title: activity.title,
                appreciation: row.appreciation,
                suggestion: row.suggestion,
                error_message: query.notice.as_deref().map(form_notice_message),
            };
            Html(template.render().unwrap()).into_response()
        }
        Ok(FormAccess::AlreadySubmitted) => Redirect::to(&format!(
            "/activities/{}?notice=already_submitted",
            activity_id
        ))
        .into_response(),
        Ok(FormAccess::GateNotOpen) => Redirect::to(&format!(
            "/activities/{}/verify?notice=verify_first",
            activity_id
        ))
        .into_response(),
        Err(e) => {
            warn!("Participation form load failed for {}: {}", activity_id, e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// POST /activities/:activity_id/participation: multipart feedback with up
/// to three photos.
pub async fn submit_participation_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(activity_id): Path<String>,
    State(state): State<AppState>,
    multipart: Multipart,
) -> impl IntoResponse {
    if let Err(resp) = load_activity(&state, &activity_id).await {
        return resp;
    }

    let submission = match read_submission(multipart, &state.config.media_root).await {
        Ok(s) => s,
        Err(e) => {
            warn!("Multipart read failed for {}: {}", activity_id, e);
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    match participation_service::submit_feedback(&state, &auth_user.id, &activity_id, submission)
        .await
    {
        Ok(()) => Redirect::to(&format!(
            "/activities/{}?notice=participation_ok",
            activity_id
        ))
        .into_response(),
        Err(SubmitError::GateNotOpen) => Redirect::to(&format!(
            "/activities/{}/verify?notice=verify_first",
            activity_id
        ))
        .into_response(),
        Err(SubmitError::AlreadySubmitted) => Redirect::to(&format!(
            "/activities/{}?notice=already_submitted",
            activity_id
        ))
        .into_response(),
        Err(SubmitError::InvalidRating) => Redirect::to(&format!(
            "/activities/{}/participation?notice=invalid_rating",
            activity_id
        ))
        .into_response(),
        Err(SubmitError::Db(e)) => {
            warn!("Participation submit failed for {}: {}", activity_id, e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// GET /activities/:activity_id/participants: verified attendance list.
pub async fn participant_list_handler(
    Extension(_auth_user): Extension<AuthenticatedUser>,
    Path(activity_id): Path<String>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let activity = match load_activity(&state, &activity_id).await {
        Ok(a) => a,
        Err(resp) => return resp,
    };

    let rows = match participation_repo::list_verified_participants(&state.pool, &activity_id).await
    {
        Ok(rows) => rows,
        Err(e) => {
            warn!("Participant list load failed for {}: {}", activity_id, e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let template = ParticipantListTemplate {
        activity_title: activity.title,
        participants: rows.into_iter().map(participant_view).collect(),
    };
    Html(template.render().unwrap()).into_response()
}

fn participant_view(row: ActivityParticipantsRow) -> ParticipantView {
    ParticipantView {
        name: row.name.unwrap_or_else(|| "Unknown".to_string()),
        rating_label: row
            .rating
            .map(|r| format!("{}/5", r))
            .unwrap_or_else(|| "-".to_string()),
        submitted_label: row
            .submitted_at
            .as_deref()
            .and_then(|s| s.get(0..16))
            .unwrap_or("-")
            .replace('T', " "),
    }
}

fn form_notice_message(token: &str) -> String {
    match token {
        "invalid_rating" => "Rating must be between 1 and 5.",
        _ => "Please check the form and try again.",
    }
    .to_string()
}

fn verify_notice_message(token: &str) -> String {
    // Absent and expired codes read the same to the participant; only the
    // wording separates them from a plain typo.
    match token {
        "code_expired_or_absent" => "The code has expired or no code is active for this activity.",
        "code_mismatch" => "Incorrect code. Check with the organizer and try again.",
        "verify_first" => "Please verify the check-in code first.",
        _ => "Verification required.",
    }
    .to_string()
}

async fn read_submission(
    mut multipart: Multipart,
    media_root: &str,
) -> Result<FeedbackSubmission, String> {
    let mut submission = FeedbackSubmission {
        appreciation: String::new(),
        suggestion: String::new(),
        rating: None,
        photos: Vec::new(),
    };

    while let Some(field) = multipart.next_field().await.map_err(|e| e.to_string())? {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "appreciation" => {
                submission.appreciation = field.text().await.map_err(|e| e.to_string())?;
            }
            "suggestion" => {
                submission.suggestion = field.text().await.map_err(|e| e.to_string())?;
            }
            "rating" => {
                let raw = field.text().await.map_err(|e| e.to_string())?;
                let raw = raw.trim();
                if !raw.is_empty() {
                    // Unparseable ratings reach the service as out-of-range
                    // so the user gets the same recoverable notice.
                    submission.rating = Some(raw.parse::<i64>().unwrap_or(0));
                }
            }
            "photo1" | "photo2" | "photo3" => {
                if submission.photos.len() >= MAX_PHOTOS {
                    continue;
                }
                let file_name = field.file_name().unwrap_or("").to_string();
                if file_name.is_empty() {
                    continue;
                }
                let bytes = field.bytes().await.map_err(|e| e.to_string())?;
                if bytes.is_empty() {
                    continue;
                }
                let stored = store_photo(media_root, &file_name, &bytes)
                    .await
                    .map_err(|e| e.to_string())?;
                submission.photos.push(stored);
            }
            _ => {}
        }
    }

    Ok(submission)
}

/// Write an uploaded photo under `media_root/participation/photos/` and
/// return its path relative to the media root (what gets persisted).
async fn store_photo(
    media_root: &str,
    original_name: &str,
    bytes: &[u8],
) -> std::io::Result<String> {
    let ext = std::path::Path::new(original_name)
        .extension()
        .and_then(|s| s.to_str())
        .filter(|s| s.chars().all(char::is_alphanumeric))
        .unwrap_or("jpg");
    let relative = format!("participation/photos/{}.{}", Uuid::new_v4(), ext);

    let dir = format!("{}/participation/photos", media_root);
    tokio::fs::create_dir_all(&dir).await?;
    tokio::fs::write(format!("{}/{}", media_root, relative), bytes).await?;
    Ok(relative)
}
