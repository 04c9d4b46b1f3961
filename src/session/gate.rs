//! Per-user access gate for the participation form.

use std::sync::Arc;
use std::time::Duration;

use crate::otp::TtlStore;

/// Records, per (user, activity) pair, that code verification succeeded.
///
/// The gate is coarse on purpose: it does not rate-limit verification
/// attempts and a user may re-verify after it closes. Entries carry their
/// own TTL standing in for the session lifetime, so an abandoned form
/// does not stay open forever.
#[derive(Clone)]
pub struct SessionGate {
    cache: Arc<dyn TtlStore>,
    ttl: Duration,
}

fn gate_key(user_id: &str, activity_id: &str) -> String {
    format!("otp_verified_{}_{}", activity_id, user_id)
}

impl SessionGate {
    pub fn new(cache: Arc<dyn TtlStore>, ttl: Duration) -> Self {
        Self { cache, ttl }
    }

    /// Mark (user, activity) as verified.
    pub fn open(&self, user_id: &str, activity_id: &str) {
        self.cache.put(&gate_key(user_id, activity_id), "1", self.ttl);
    }

    pub fn is_open(&self, user_id: &str, activity_id: &str) -> bool {
        self.cache.get(&gate_key(user_id, activity_id)).is_some()
    }

    /// Clear the gate, normally right after a successful submission.
    pub fn close(&self, user_id: &str, activity_id: &str) {
        self.cache.remove(&gate_key(user_id, activity_id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::otp::MemoryTtlStore;

    fn gate() -> SessionGate {
        SessionGate::new(Arc::new(MemoryTtlStore::new()), Duration::from_secs(60))
    }

    #[test]
    fn open_is_scoped_to_the_pair() {
        let gate = gate();
        gate.open("u1", "a1");
        assert!(gate.is_open("u1", "a1"));
        assert!(!gate.is_open("u1", "a2"));
        assert!(!gate.is_open("u2", "a1"));
    }

    #[test]
    fn close_clears_only_that_pair() {
        let gate = gate();
        gate.open("u1", "a1");
        gate.open("u1", "a2");
        gate.close("u1", "a1");
        assert!(!gate.is_open("u1", "a1"));
        assert!(gate.is_open("u1", "a2"));
    }

    #[test]
    fn gate_expires_with_its_ttl() {
        let gate = SessionGate::new(Arc::new(MemoryTtlStore::new()), Duration::from_millis(15));
        gate.open("u1", "a1");
        std::thread::sleep(Duration::from_millis(40));
        assert!(!gate.is_open("u1", "a1"));
    }

    #[test]
    fn reopen_after_close_is_allowed() {
        let gate = gate();
        gate.open("u1", "a1");
        gate.close("u1", "a1");
        gate.open("u1", "a1");
        assert!(gate.is_open("u1", "a1"));
    }
}
