//! Redis-backed quota store
//!
//! Counters are plain integer keys with a server-side expiry, so any process
//! on any host that reaches the same Redis database shares the daily budget.
//! Expiry is enforced by Redis itself; an expired counter is simply gone.

use std::time::Duration;

use async_trait::async_trait;
use pardot_core::QuotaStore;
use pardot_domain::{PardotError, QuotaKey, QuotaStoreConfig, Result as DomainResult};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, Script};
use tracing::{debug, info};

use crate::errors::InfraError;

/// Adds one and, when that created the key, sets its lifetime. Runs
/// atomically on the server.
const INCREMENT_SCRIPT: &str = r#"
local count = redis.call('INCR', KEYS[1])
if count == 1 then
    redis.call('EXPIRE', KEYS[1], ARGV[1])
end
return count
"#;

/// [`QuotaStore`] kept in a shared Redis database.
pub struct RedisQuotaStore {
    conn: ConnectionManager,
    increment: Script,
    default_ttl: Duration,
    url: String,
}

impl RedisQuotaStore {
    /// Connect to the server named by `config`.
    pub async fn connect(config: &QuotaStoreConfig) -> DomainResult<Self> {
        Self::connect_url(&config.redis_url(), config.ttl()).await
    }

    /// Connect to `url`. `default_ttl` applies when `increment` has to
    /// create a record.
    pub async fn connect_url(url: &str, default_ttl: Duration) -> DomainResult<Self> {
        let client = Client::open(url).map_err(map_redis_error)?;
        let conn = ConnectionManager::new(client).await.map_err(map_redis_error)?;

        info!(url, "connected to redis quota store");

        Ok(Self {
            conn,
            increment: Script::new(INCREMENT_SCRIPT),
            default_ttl,
            url: url.to_string(),
        })
    }

    /// Remaining lifetime of `key`, or `None` when the key is absent or has
    /// no expiry.
    pub async fn time_to_live(&self, key: &QuotaKey) -> DomainResult<Option<Duration>> {
        let mut conn = self.conn.clone();
        let ttl: i64 = conn.ttl(key.storage_key()).await.map_err(map_redis_error)?;
        Ok(u64::try_from(ttl).ok().map(Duration::from_secs))
    }
}

#[async_trait]
impl QuotaStore for RedisQuotaStore {
    async fn get_count(&self, key: &QuotaKey) -> DomainResult<u64> {
        let mut conn = self.conn.clone();
        let count: Option<u64> = conn.get(key.storage_key()).await.map_err(map_redis_error)?;
        Ok(count.unwrap_or(0))
    }

    async fn init_if_absent(&self, key: &QuotaKey, ttl: Duration) -> DomainResult<bool> {
        let mut conn = self.conn.clone();
        let created: Option<String> = redis::cmd("SET")
            .arg(key.storage_key())
            .arg(0)
            .arg("NX")
            .arg("EX")
            .arg(ttl_secs(ttl))
            .query_async(&mut conn)
            .await
            .map_err(map_redis_error)?;

        debug!(key = %key, created = created.is_some(), "initialized quota counter");
        Ok(created.is_some())
    }

    async fn increment(&self, key: &QuotaKey) -> DomainResult<u64> {
        let mut conn = self.conn.clone();
        let count: i64 = self
            .increment
            .key(key.storage_key())
            .arg(ttl_secs(self.default_ttl))
            .invoke_async(&mut conn)
            .await
            .map_err(map_redis_error)?;

        u64::try_from(count)
            .map_err(|_| PardotError::Database(format!("negative quota count stored: {count}")))
    }

    async fn health_check(&self) -> DomainResult<()> {
        let mut conn = self.conn.clone();
        let pong: String =
            redis::cmd("PING").query_async(&mut conn).await.map_err(map_redis_error)?;
        if pong == "PONG" {
            Ok(())
        } else {
            Err(PardotError::Database(format!("unexpected PING reply: {pong}")))
        }
    }
}

impl std::fmt::Debug for RedisQuotaStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisQuotaStore")
            .field("url", &self.url)
            .field("default_ttl", &self.default_ttl)
            .finish()
    }
}

/// Redis rejects a zero expiry; round up to one second.
fn ttl_secs(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}

fn map_redis_error(err: redis::RedisError) -> PardotError {
    PardotError::from(InfraError::from(err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ttl_is_at_least_one_second() {
        assert_eq!(ttl_secs(Duration::ZERO), 1);
        assert_eq!(ttl_secs(Duration::from_millis(1_500)), 1);
        assert_eq!(ttl_secs(Duration::from_secs(30 * 86_400)), 2_592_000);
    }

    #[tokio::test]
    async fn unparseable_url_is_a_config_error() {
        let err = RedisQuotaStore::connect_url("not a url", Duration::from_secs(60))
            .await
            .unwrap_err();
        assert!(matches!(err, PardotError::Config(_)), "got {err:?}");
    }
}
