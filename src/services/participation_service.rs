use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

use crate::database::participation_repo::{self, NewParticipation, SubmittedFeedback};
use crate::models::ParticipationRow;
use crate::state::AppState;

#[derive(Debug, Error)]
pub enum SubmitError {
    /// Feedback arrived without a previously verified code; the caller
    /// redirects back to the code-entry page.
    #[error("code verification required before submitting")]
    GateNotOpen,
    /// The (activity, user) pair already has a completed record; nothing
    /// is overwritten.
    #[error("participation already submitted")]
    AlreadySubmitted,
    #[error("rating must be between 1 and 5")]
    InvalidRating,
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

/// What the form page may show for (user, activity).
pub enum FormAccess {
    /// Gate is open and the record is not complete yet.
    Open(ParticipationRow),
    /// The user already submitted; send them away with a notice.
    AlreadySubmitted,
    /// No verified code for this pair; send them to the code-entry page.
    GateNotOpen,
}

/// Resolve form access, creating the empty participation record on first
/// contact (idempotent get-or-create).
pub async fn access_form(
    state: &AppState,
    user_id: &str,
    activity_id: &str,
) -> sqlx::Result<FormAccess> {
    if !state.gate.is_open(user_id, activity_id) {
        // An existing complete record wins over the gate: re-access after
        // submission gets the informational notice, not a re-verify loop.
        if let Some(row) =
            participation_repo::load_participation(&state.pool, activity_id, user_id).await?
        {
            if row.is_complete() {
                return Ok(FormAccess::AlreadySubmitted);
            }
        }
        return Ok(FormAccess::GateNotOpen);
    }

    let row = participation_repo::get_or_create(
        &state.pool,
        NewParticipation {
            id: &Uuid::new_v4().to_string(),
            activity_id,
            user_id,
            now: &Utc::now().to_rfc3339(),
        },
    )
    .await?;

    if row.is_complete() {
        return Ok(FormAccess::AlreadySubmitted);
    }
    Ok(FormAccess::Open(row))
}

pub struct FeedbackSubmission {
    pub appreciation: String,
    pub suggestion: String,
    pub rating: Option<i64>,
    /// Stored photo paths, at most three; the web layer has already
    /// written the files.
    pub photos: Vec<String>,
}

/// Complete the participation: stamp verification and submission, then
/// close the gate. Both timestamps are set here, at submission time.
pub async fn submit_feedback(
    state: &AppState,
    user_id: &str,
    activity_id: &str,
    submission: FeedbackSubmission,
) -> Result<(), SubmitError> {
    if !state.gate.is_open(user_id, activity_id) {
        return Err(SubmitError::GateNotOpen);
    }
    if let Some(rating) = submission.rating {
        if !(1..=5).contains(&rating) {
            return Err(SubmitError::InvalidRating);
        }
    }

    // First contact may happen straight on the POST; make sure the row
    // exists before stamping it.
    let now = Utc::now().to_rfc3339();
    participation_repo::get_or_create(
        &state.pool,
        NewParticipation {
            id: &Uuid::new_v4().to_string(),
            activity_id,
            user_id,
            now: &now,
        },
    )
    .await?;

    let mut photos = submission.photos.iter();
    let affected = participation_repo::record_submission(
        &state.pool,
        activity_id,
        user_id,
        SubmittedFeedback {
            appreciation: &submission.appreciation,
            suggestion: &submission.suggestion,
            rating: submission.rating,
            photo1: photos.next().map(String::as_str),
            photo2: photos.next().map(String::as_str),
            photo3: photos.next().map(String::as_str),
        },
        &now,
    )
    .await?;

    if affected == 0 {
        return Err(SubmitError::AlreadySubmitted);
    }

    state.gate.close(user_id, activity_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use sqlx::sqlite::SqlitePoolOptions;
    use sqlx::SqlitePool;

    use super::*;
    use crate::config::Config;
    use crate::database::schema;

    async fn test_state() -> AppState {
        let pool: SqlitePool = SqlitePoolOptions::new()
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

    fn feedback() -> FeedbackSubmission {
        FeedbackSubmission {
            appreciation: "great workshop".to_string(),
            suggestion: "more seats".to_string(),
            rating: Some(5),
            photos: Vec::new(),
        }
    }

    #[tokio::test]
    async fn get_or_create_is_idempotent() {
        let state = test_state().await;
        state.gate.open("u1", "a1");

        for _ in 0..3 {
            match access_form(&state, "u1", "a1").await.unwrap() {
                FormAccess::Open(row) => {
                    assert_eq!(row.verified, 0);
                    assert!(row.submitted_at.is_none());
                }
                _ => panic!("expected open form"),
            }
        }

        let rows = participation_repo::list_verified(&state.pool, Some("a1"), None)
            .await
            .unwrap();
        // Not verified yet, so the verified listing stays empty, but the
        // record itself must be unique.
        assert!(rows.is_empty());
        let row = participation_repo::load_participation(&state.pool, "a1", "u1")
            .await
            .unwrap();
        assert!(row.is_some());
    }

    #[tokio::test]
    async fn form_access_without_gate_redirects_to_verification() {
        let state = test_state().await;
        match access_form(&state, "u1", "a1").await.unwrap() {
            FormAccess::GateNotOpen => {}
            _ => panic!("expected gate-not-open"),
        }
    }

    #[tokio::test]
    async fn submit_without_gate_is_rejected_and_mutates_nothing() {
        let state = test_state().await;
        state.gate.open("u1", "a1");
        match access_form(&state, "u1", "a1").await.unwrap() {
            FormAccess::Open(_) => {}
            _ => panic!("expected open form"),
        }
        state.gate.close("u1", "a1");

        let err = submit_feedback(&state, "u1", "a1", feedback())
            .await
            .unwrap_err();
        assert!(matches!(err, SubmitError::GateNotOpen));

        let row = participation_repo::load_participation(&state.pool, "a1", "u1")
            .await
            .unwrap()
            .expect("record exists");
        assert_eq!(row.verified, 0);
        assert!(row.submitted_at.is_none());
        assert!(row.appreciation.is_empty());
    }

    #[tokio::test]
    async fn full_flow_reaches_complete_and_closes_gate() {
        let state = test_state().await;
        state.gate.open("u1", "a1");

        submit_feedback(&state, "u1", "a1", feedback())
            .await
            .unwrap();

        let row = participation_repo::load_participation(&state.pool, "a1", "u1")
            .await
            .unwrap()
            .expect("record exists");
        assert!(row.is_complete());
        assert_eq!(row.verified, 1);
        assert!(row.verified_at.is_some());
        assert!(row.submitted_at.is_some());
        assert_eq!(row.rating, Some(5));
        assert!(!state.gate.is_open("u1", "a1"));
    }

    #[tokio::test]
    async fn second_submission_surfaces_already_submitted() {
        let state = test_state().await;
        state.gate.open("u1", "a1");
        submit_feedback(&state, "u1", "a1", feedback())
            .await
            .unwrap();

        // Re-verifying after completion is allowed by the coarse gate, but
        // the record must not be overwritten.
        state.gate.open("u1", "a1");
        let mut second = feedback();
        second.appreciation = "changed my mind".to_string();
        let err = submit_feedback(&state, "u1", "a1", second)
            .await
            .unwrap_err();
        assert!(matches!(err, SubmitError::AlreadySubmitted));

        let row = participation_repo::load_participation(&state.pool, "a1", "u1")
            .await
            .unwrap()
            .expect("record exists");
        assert_eq!(row.appreciation, "great workshop");
    }

    #[tokio::test]
    async fn complete_record_redirects_on_reaccess() {
        let state = test_state().await;
        state.gate.open("u1", "a1");
        submit_feedback(&state, "u1", "a1", feedback())
            .await
            .unwrap();

        match access_form(&state, "u1", "a1").await.unwrap() {
            FormAccess::AlreadySubmitted => {}
            _ => panic!("expected already-submitted"),
        }
    }

    #[tokio::test]
    async fn out_of_range_rating_is_rejected() {
        let state = test_state().await;
        state.gate.open("u1", "a1");
        let mut bad = feedback();
        bad.rating = Some(9);
        let err = submit_feedback(&state, "u1", "a1", bad).await.unwrap_err();
        assert!(matches!(err, SubmitError::InvalidRating));
        // Gate stays open so the user can fix the form and resubmit.
        assert!(state.gate.is_open("u1", "a1"));
    }

    #[tokio::test]
    async fn photos_land_in_the_first_free_slots() {
        let state = test_state().await;
        state.gate.open("u1", "a1");
        let mut with_photos = feedback();
        with_photos.photos = vec![
            "participation/photos/a.jpg".to_string(),
            "participation/photos/b.jpg".to_string(),
        ];
        submit_feedback(&state, "u1", "a1", with_photos)
            .await
            .unwrap();

        let row = participation_repo::load_participation(&state.pool, "a1", "u1")
            .await
            .unwrap()
            .expect("record exists");
        assert_eq!(row.photo1.as_deref(), Some("participation/photos/a.jpg"));
        assert_eq!(row.photo2.as_deref(), Some("participation/photos/b.jpg"));
        assert_eq!(row.photo3, None);
    }
}
