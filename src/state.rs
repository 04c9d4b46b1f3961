use std::sync::Arc;
use std::time::Duration;

use sqlx::SqlitePool;

use crate::config::Config;
use crate::otp::{CodeStore, MemoryTtlStore, TtlStore};
use crate::session::SessionGate;

/// Everything request handlers need, cloned cheaply per request.
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub codes: CodeStore,
    pub gate: SessionGate,
    pub config: Config,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: Config) -> Self {
        let cache: Arc<dyn TtlStore> = Arc::new(MemoryTtlStore::new());
        Self::with_cache(pool, config, cache)
    }

    /// Build state over a caller-supplied store; the code store and the
    /// session gate intentionally share one cache.
    pub fn with_cache(pool: SqlitePool, config: Config, cache: Arc<dyn TtlStore>) -> Self {
        let gate_ttl = Duration::from_secs(config.gate_validity_minutes * 60);
        Self {
            codes: CodeStore::new(cache.clone()),
            gate: SessionGate::new(cache, gate_ttl),
            pool,
            config,
        }
    }

    /// TTL applied to freshly issued check-in codes.
    pub fn otp_ttl(&self) -> Duration {
        Duration::from_secs(self.config.otp_validity_minutes * 60)
    }
}
