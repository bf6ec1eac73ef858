//! SQLite-backed quota store
//!
//! One row per counter key. Each operation is a single statement, so
//! concurrent writers from any process sharing the file serialize on SQLite's
//! write lock and no increment is lost.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use pardot_common::time::Clock;
use pardot_core::QuotaStore;
use pardot_domain::{PardotError, QuotaKey, Result as DomainResult};
use rusqlite::{params, OptionalExtension};
use tokio::task;
use tracing::debug;

use super::manager::{map_sql_error, QuotaConnection, QuotaDbManager};

/// [`QuotaStore`] persisted in a shared SQLite database.
pub struct SqliteQuotaStore {
    db: Arc<QuotaDbManager>,
    clock: Arc<dyn Clock>,
    default_ttl: Duration,
}

impl SqliteQuotaStore {
    /// `default_ttl` applies when `increment` has to create a record.
    pub fn new(db: Arc<QuotaDbManager>, clock: Arc<dyn Clock>, default_ttl: Duration) -> Self {
        Self { db, clock, default_ttl }
    }

    /// Delete every expired counter. Returns the number of rows removed.
    pub async fn purge_expired(&self) -> DomainResult<usize> {
        let db = Arc::clone(&self.db);
        let now = self.clock.secs_since_epoch();

        let removed = task::spawn_blocking(move || -> DomainResult<usize> {
            let conn = db.get_connection()?;
            conn.execute("DELETE FROM quota_counters WHERE expires_at <= ?1", params![now])
                .map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)??;

        debug!(removed, "purged expired quota counters");
        Ok(removed)
    }

    fn expiry(&self, ttl: Duration) -> (i64, i64) {
        let now = self.clock.secs_since_epoch();
        let ttl_secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        (now, now.saturating_add(ttl_secs))
    }
}

#[async_trait]
impl QuotaStore for SqliteQuotaStore {
    async fn get_count(&self, key: &QuotaKey) -> DomainResult<u64> {
        let db = Arc::clone(&self.db);
        let key = key.storage_key();
        let now = self.clock.secs_since_epoch();

        task::spawn_blocking(move || -> DomainResult<u64> {
            let conn = db.get_connection()?;
            query_live_count(&conn, &key, now)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn init_if_absent(&self, key: &QuotaKey, ttl: Duration) -> DomainResult<bool> {
        let db = Arc::clone(&self.db);
        let key = key.storage_key();
        let (now, expires_at) = self.expiry(ttl);

        task::spawn_blocking(move || -> DomainResult<bool> {
            let conn = db.get_connection()?;
            let changed = conn
                .execute(
                    "INSERT INTO quota_counters (key, count, expires_at) VALUES (?1, 0, ?3)
                     ON CONFLICT(key) DO UPDATE SET count = 0, expires_at = excluded.expires_at
                     WHERE quota_counters.expires_at <= ?2",
                    params![key, now, expires_at],
                )
                .map_err(map_sql_error)?;
            Ok(changed > 0)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn increment(&self, key: &QuotaKey) -> DomainResult<u64> {
        let db = Arc::clone(&self.db);
        let key = key.storage_key();
        let (now, expires_at) = self.expiry(self.default_ttl);

        task::spawn_blocking(move || -> DomainResult<u64> {
            let conn = db.get_connection()?;
            let count: i64 = conn
                .query_row(
                    "INSERT INTO quota_counters (key, count, expires_at) VALUES (?1, 1, ?3)
                     ON CONFLICT(key) DO UPDATE SET
                         count = CASE WHEN quota_counters.expires_at <= ?2
                                      THEN 1 ELSE quota_counters.count + 1 END,
                         expires_at = CASE WHEN quota_counters.expires_at <= ?2
                                           THEN excluded.expires_at
                                           ELSE quota_counters.expires_at END
                     RETURNING count",
                    params![key, now, expires_at],
                    |row| row.get(0),
                )
                .map_err(map_sql_error)?;
            to_count(count)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn health_check(&self) -> DomainResult<()> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || db.health_check()).await.map_err(map_join_error)?
    }
}

impl std::fmt::Debug for SqliteQuotaStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteQuotaStore")
            .field("db", &self.db)
            .field("default_ttl", &self.default_ttl)
            .finish()
    }
}

fn query_live_count(conn: &QuotaConnection, key: &str, now: i64) -> DomainResult<u64> {
    let count: Option<i64> = conn
        .query_row(
            "SELECT count FROM quota_counters WHERE key = ?1 AND expires_at > ?2",
            params![key, now],
            |row| row.get(0),
        )
        .optional()
        .map_err(map_sql_error)?;
    count.map_or(Ok(0), to_count)
}

fn to_count(value: i64) -> DomainResult<u64> {
    u64::try_from(value)
        .map_err(|_| PardotError::Database(format!("negative quota count stored: {value}")))
}

fn map_join_error(err: task::JoinError) -> PardotError {
    if err.is_cancelled() {
        PardotError::Internal("blocking task cancelled".into())
    } else {
        PardotError::Internal(format!("blocking task failed: {err}"))
    }
}
