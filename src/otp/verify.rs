//! Check-in code verification.

use super::store::CodeStore;

/// Outcome of comparing a submitted code against the stored one.
///
/// An activity without an active code and an activity whose code timed
/// out are deliberately the same outcome; the stored code is simply gone
/// in both cases and the participant's next step is identical.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyOutcome {
    Valid,
    ExpiredOrAbsent,
    Mismatch,
}

/// Compare `submitted` against the active code for the activity.
///
/// Stateless per call: opening the session gate on `Valid` is the
/// caller's job.
pub fn verify(store: &CodeStore, activity_id: &str, submitted: &str) -> VerifyOutcome {
    let Some(stored) = store.get(activity_id) else {
        return VerifyOutcome::ExpiredOrAbsent;
    };
    if stored == submitted.trim() {
        VerifyOutcome::Valid
    } else {
        VerifyOutcome::Mismatch
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::super::store::MemoryTtlStore;
    use super::*;

    fn store() -> CodeStore {
        CodeStore::new(Arc::new(MemoryTtlStore::new()))
    }

    #[test]
    fn valid_iff_stored_code_matches() {
        let store = store();
        store.put("10", "482913", Duration::from_secs(60));
        assert_eq!(verify(&store, "10", "482913"), VerifyOutcome::Valid);
        assert_eq!(verify(&store, "10", "000000"), VerifyOutcome::Mismatch);
    }

    #[test]
    fn submitted_code_is_trimmed() {
        let store = store();
        store.put("10", "482913", Duration::from_secs(60));
        assert_eq!(verify(&store, "10", " 482913\n"), VerifyOutcome::Valid);
    }

    #[test]
    fn never_issued_is_expired_or_absent() {
        let store = store();
        assert_eq!(
            verify(&store, "10", "482913"),
            VerifyOutcome::ExpiredOrAbsent
        );
    }

    #[test]
    fn full_window_scenario() {
        // Issue for activity 10, verify the happy and unhappy paths, then
        // let the window lapse (milliseconds standing in for minutes).
        let store = store();
        store.put("10", "482913", Duration::from_millis(60));
        assert_eq!(verify(&store, "10", "482913"), VerifyOutcome::Valid);
        assert_eq!(verify(&store, "10", "000000"), VerifyOutcome::Mismatch);
        std::thread::sleep(Duration::from_millis(90));
        assert_eq!(
            verify(&store, "10", "482913"),
            VerifyOutcome::ExpiredOrAbsent
        );
    }
}
