//! In-memory `QuotaStore` mock

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use pardot_core::QuotaStore;
use pardot_domain::{QuotaKey, Result as DomainResult};
use parking_lot::Mutex;

/// Counter map without expiry; records every init call for assertions.
#[derive(Default)]
pub struct MockQuotaStore {
    counts: Mutex<HashMap<String, u64>>,
    inits: Mutex<Vec<(String, Duration)>>,
}

impl MockQuotaStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a counter as if other clients had already made calls.
    pub fn with_count(self, key: &str, count: u64) -> Self {
        self.counts.lock().insert(key.to_string(), count);
        self
    }

    pub fn count(&self, key: &str) -> u64 {
        self.counts.lock().get(key).copied().unwrap_or(0)
    }

    pub fn inits(&self) -> Vec<(String, Duration)> {
        self.inits.lock().clone()
    }
}

#[async_trait]
impl QuotaStore for MockQuotaStore {
    async fn get_count(&self, key: &QuotaKey) -> DomainResult<u64> {
        Ok(self.count(&key.storage_key()))
    }

    async fn init_if_absent(&self, key: &QuotaKey, ttl: Duration) -> DomainResult<bool> {
        let storage_key = key.storage_key();
        self.inits.lock().push((storage_key.clone(), ttl));
        let mut counts = self.counts.lock();
        if counts.contains_key(&storage_key) {
            return Ok(false);
        }
        counts.insert(storage_key, 0);
        Ok(true)
    }

    async fn increment(&self, key: &QuotaKey) -> DomainResult<u64> {
        let mut counts = self.counts.lock();
        let entry = counts.entry(key.storage_key()).or_insert(0);
        *entry += 1;
        Ok(*entry)
    }
}
