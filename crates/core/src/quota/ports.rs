//! Port interfaces for the shared call counter

use std::time::Duration;

use async_trait::async_trait;
use pardot_domain::{QuotaKey, Result};

/// Durable per-account, per-day call counter shared by every client that
/// targets the same account.
///
/// Implementations must make `increment` atomic across processes. Expired
/// records behave exactly like absent ones.
#[async_trait]
pub trait QuotaStore: Send + Sync {
    /// Current count for `key`; an absent or expired record reads as 0.
    async fn get_count(&self, key: &QuotaKey) -> Result<u64>;

    /// Create the record at 0 with the given lifetime unless a live one
    /// exists. Returns `true` when a record was created.
    async fn init_if_absent(&self, key: &QuotaKey, ttl: Duration) -> Result<bool>;

    /// Atomically add one and return the new count. An absent record is
    /// created with the store's default lifetime.
    async fn increment(&self, key: &QuotaKey) -> Result<u64>;

    /// Verify the backing store is reachable.
    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}
