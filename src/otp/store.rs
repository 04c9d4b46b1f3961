//! Expiring storage for active check-in codes.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

/// Key-value store with per-key time-to-live.
///
/// Each operation is atomic with respect to other operations on the same
/// key; nothing here needs multi-key transactions. Expiry is lazy: an
/// entry past its deadline is dropped the next time it is read.
pub trait TtlStore: Send + Sync {
    fn put(&self, key: &str, value: &str, ttl: Duration);
    fn get(&self, key: &str) -> Option<String>;
    fn remove(&self, key: &str);
}

struct Entry {
    value: String,
    deadline: Instant,
}

/// In-process `TtlStore` backing a single server instance.
#[derive(Default)]
pub struct MemoryTtlStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryTtlStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Entry>> {
        // A poisoned lock still holds usable data; keep serving rather than
        // failing every later request.
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl TtlStore for MemoryTtlStore {
    fn put(&self, key: &str, value: &str, ttl: Duration) {
        let entry = Entry {
            value: value.to_string(),
            deadline: Instant::now() + ttl,
        };
        self.lock().insert(key.to_string(), entry);
    }

    fn get(&self, key: &str) -> Option<String> {
        let mut entries = self.lock();
        match entries.get(key) {
            Some(entry) if entry.deadline > Instant::now() => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    fn remove(&self, key: &str) {
        self.lock().remove(key);
    }
}

fn code_key(activity_id: &str) -> String {
    format!("otp_activity_{}", activity_id)
}

fn expiry_key(activity_id: &str) -> String {
    format!("otp_expiry_{}", activity_id)
}

/// Active check-in codes, one per activity.
///
/// Storing a code for an activity that already has one overwrites it and
/// restarts the countdown; anyone still holding the old code is out of
/// luck. Call sites that care warn the organizer before regenerating.
#[derive(Clone)]
pub struct CodeStore {
    cache: Arc<dyn TtlStore>,
}

impl CodeStore {
    pub fn new(cache: Arc<dyn TtlStore>) -> Self {
        Self { cache }
    }

    /// Store `code` as the active code for `activity_id` and return the
    /// wall-clock moment it expires, which is also kept around for display
    /// on the code-entry page.
    pub fn put(&self, activity_id: &str, code: &str, ttl: Duration) -> DateTime<Utc> {
        let expiry = Utc::now()
            + chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::zero());
        self.cache.put(&code_key(activity_id), code, ttl);
        self.cache
            .put(&expiry_key(activity_id), &expiry.to_rfc3339(), ttl);
        expiry
    }

    /// Current code for the activity, or `None` once the TTL has elapsed
    /// or if no code was ever issued.
    pub fn get(&self, activity_id: &str) -> Option<String> {
        self.cache.get(&code_key(activity_id))
    }

    /// Expiry of the active code, for display only.
    pub fn expiry(&self, activity_id: &str) -> Option<DateTime<Utc>> {
        self.cache
            .get(&expiry_key(activity_id))
            .and_then(|raw| DateTime::parse_from_rfc3339(&raw).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// Drop the active code before its TTL runs out.
    pub fn clear(&self, activity_id: &str) {
        self.cache.remove(&code_key(activity_id));
        self.cache.remove(&expiry_key(activity_id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> CodeStore {
        CodeStore::new(Arc::new(MemoryTtlStore::new()))
    }

    #[test]
    fn put_then_get_within_ttl() {
        let store = store();
        store.put("10", "482913", Duration::from_secs(60));
        assert_eq!(store.get("10").as_deref(), Some("482913"));
    }

    #[test]
    fn get_after_ttl_is_absent() {
        let store = store();
        store.put("10", "482913", Duration::from_millis(15));
        std::thread::sleep(Duration::from_millis(40));
        assert_eq!(store.get("10"), None);
        assert_eq!(store.expiry("10"), None);
    }

    #[test]
    fn put_overwrites_previous_code() {
        let store = store();
        store.put("10", "111111", Duration::from_secs(60));
        store.put("10", "222222", Duration::from_secs(60));
        assert_eq!(store.get("10").as_deref(), Some("222222"));
    }

    #[test]
    fn activities_do_not_share_codes() {
        let store = store();
        store.put("10", "111111", Duration::from_secs(60));
        assert_eq!(store.get("11"), None);
    }

    #[test]
    fn clear_removes_code_and_expiry() {
        let store = store();
        store.put("10", "482913", Duration::from_secs(60));
        store.clear("10");
        assert_eq!(store.get("10"), None);
        assert_eq!(store.expiry("10"), None);
    }

    #[test]
    fn expiry_is_in_the_future() {
        let store = store();
        let expiry = store.put("10", "482913", Duration::from_secs(60));
        assert!(expiry > Utc::now());
        let stored = store.expiry("10").expect("expiry stored");
        assert_eq!(stored.timestamp(), expiry.timestamp());
    }
}
