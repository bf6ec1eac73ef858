//! Daily call budget enforcement on top of a [`QuotaStore`]

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use pardot_common::time::Clock;
use pardot_domain::{PardotError, QuotaKey, Result};
use parking_lot::Mutex;
use tracing::{debug, warn};

use super::ports::QuotaStore;

/// Guards one account's daily call budget.
///
/// The counter key follows the UTC calendar date of the injected clock, so a
/// long-lived client moves to a fresh counter at midnight.
pub struct DailyQuota {
    store: Arc<dyn QuotaStore>,
    clock: Arc<dyn Clock>,
    account_id: String,
    daily_limit: Option<u64>,
    ttl: Duration,
    initialized_for: Mutex<Option<NaiveDate>>,
}

impl DailyQuota {
    pub fn new(
        store: Arc<dyn QuotaStore>,
        clock: Arc<dyn Clock>,
        account_id: impl Into<String>,
        daily_limit: Option<u64>,
        ttl: Duration,
    ) -> Self {
        Self {
            store,
            clock,
            account_id: account_id.into(),
            daily_limit,
            ttl,
            initialized_for: Mutex::new(None),
        }
    }

    /// Counter key for the current day.
    pub fn key(&self) -> QuotaKey {
        QuotaKey::new(self.account_id.clone(), self.clock.today())
    }

    pub fn daily_limit(&self) -> Option<u64> {
        self.daily_limit
    }

    /// Make sure today's record exists, creating it at 0 with the configured
    /// lifetime. Only touches the store once per day.
    pub async fn ensure_initialized(&self) -> Result<QuotaKey> {
        let key = self.key();
        if *self.initialized_for.lock() == Some(key.date) {
            return Ok(key);
        }

        if self.store.init_if_absent(&key, self.ttl).await? {
            debug!(quota_key = %key, ttl_secs = self.ttl.as_secs(), "Initialized daily quota counter");
        }
        *self.initialized_for.lock() = Some(key.date);
        Ok(key)
    }

    /// Calls recorded so far today.
    pub async fn current_count(&self) -> Result<u64> {
        let key = self.ensure_initialized().await?;
        self.store.get_count(&key).await
    }

    /// Fail with `QuotaExceeded` when today's count has reached the limit.
    /// Returns the count that was read.
    pub async fn check(&self) -> Result<u64> {
        let count = self.current_count().await?;
        match self.daily_limit {
            Some(limit) if count >= limit => {
                warn!(count, limit, account_id = %self.account_id, "Daily API call limit reached");
                Err(PardotError::daily_limit(count, limit))
            }
            _ => Ok(count),
        }
    }

    /// Count one call that reached the remote side successfully.
    pub async fn record_call(&self) -> Result<u64> {
        let key = self.ensure_initialized().await?;
        let count = self.store.increment(&key).await?;
        debug!(quota_key = %key, count, "Recorded API call");
        Ok(count)
    }
}

impl std::fmt::Debug for DailyQuota {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DailyQuota")
            .field("account_id", &self.account_id)
            .field("daily_limit", &self.daily_limit)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}
