//! Process-local quota store
//!
//! Counts live only as long as the process. Useful for tests and for a
//! single extraction run that does not share its budget.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use pardot_common::time::Clock;
use pardot_core::QuotaStore;
use pardot_domain::{QuotaKey, Result};
use parking_lot::Mutex;

#[derive(Debug, Clone, Copy)]
struct Counter {
    count: u64,
    expires_at: i64,
}

/// [`QuotaStore`] kept in a mutex-guarded map, with expiry evaluated against
/// the injected clock.
pub struct MemoryQuotaStore {
    counters: Mutex<HashMap<String, Counter>>,
    clock: Arc<dyn Clock>,
    default_ttl: Duration,
}

impl MemoryQuotaStore {
    pub fn new(clock: Arc<dyn Clock>, default_ttl: Duration) -> Self {
        Self { counters: Mutex::new(HashMap::new()), clock, default_ttl }
    }

    /// Number of live counters.
    pub fn len(&self) -> usize {
        let now = self.clock.secs_since_epoch();
        self.counters.lock().values().filter(|c| c.expires_at > now).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn expires_at(&self, ttl: Duration) -> i64 {
        let ttl_secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        self.clock.secs_since_epoch().saturating_add(ttl_secs)
    }
}

#[async_trait]
impl QuotaStore for MemoryQuotaStore {
    async fn get_count(&self, key: &QuotaKey) -> Result<u64> {
        let now = self.clock.secs_since_epoch();
        let counters = self.counters.lock();
        Ok(counters
            .get(&key.storage_key())
            .filter(|c| c.expires_at > now)
            .map_or(0, |c| c.count))
    }

    async fn init_if_absent(&self, key: &QuotaKey, ttl: Duration) -> Result<bool> {
        let now = self.clock.secs_since_epoch();
        let expires_at = self.expires_at(ttl);
        let mut counters = self.counters.lock();

        match counters.get(&key.storage_key()) {
            Some(existing) if existing.expires_at > now => Ok(false),
            _ => {
                counters.insert(key.storage_key(), Counter { count: 0, expires_at });
                Ok(true)
            }
        }
    }

    async fn increment(&self, key: &QuotaKey) -> Result<u64> {
        let now = self.clock.secs_since_epoch();
        let expires_at = self.expires_at(self.default_ttl);
        let mut counters = self.counters.lock();

        let counter =
            counters.entry(key.storage_key()).or_insert(Counter { count: 0, expires_at });
        if counter.expires_at <= now {
            *counter = Counter { count: 0, expires_at };
        }
        counter.count = counter.count.saturating_add(1);
        Ok(counter.count)
    }
}

impl std::fmt::Debug for MemoryQuotaStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryQuotaStore")
            .field("counters", &self.counters.lock().len())
            .field("default_ttl", &self.default_ttl)
            .finish()
    }
}
