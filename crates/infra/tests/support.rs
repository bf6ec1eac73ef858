//! Shared fixtures for `pardot-infra` integration tests.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use pardot_common::time::MockClock;
use pardot_domain::{
    HttpSettings, LogSettings, PardotConfig, QuotaStoreConfig, RetrySettings,
};
use pardot_infra::database::{QuotaDbManager, SqliteQuotaStore};
use tempfile::TempDir;

pub const ACCOUNT_ID: &str = "acct-1";
pub const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Temporary quota database that stays alive for the duration of a test.
pub struct TestDatabase {
    pub path: PathBuf,
    _temp_dir: TempDir,
}

impl TestDatabase {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("temp dir should be created");
        let path = temp_dir.path().join("quota.db");
        Self { path, _temp_dir: temp_dir }
    }

    /// Open a fresh pool on the shared file, as another process would.
    pub fn open(&self, clock: &MockClock) -> SqliteQuotaStore {
        let manager = QuotaDbManager::new(&self.path, 4, Duration::from_secs(5))
            .expect("db manager should be created");
        manager.run_migrations().expect("migrations should apply");
        SqliteQuotaStore::new(Arc::new(manager), Arc::new(clock.clone()), 30 * DAY)
    }
}

/// Mock clock pinned to 2024-03-07 12:00 UTC.
pub fn clock() -> MockClock {
    MockClock::at_utc(Utc.with_ymd_and_hms(2024, 3, 7, 12, 0, 0).unwrap())
}

/// Configuration pointing at a mock server and a temporary database, with
/// millisecond backoff.
pub fn config(server_uri: &str, db: &TestDatabase, daily_limit: Option<u64>) -> PardotConfig {
    PardotConfig {
        account_id: ACCOUNT_ID.to_string(),
        email: "etl@example.com".to_string(),
        password: "secret".to_string(),
        user_key: "user-key".to_string(),
        daily_limit,
        quota_store: QuotaStoreConfig::new(db.path.to_string_lossy()),
        http: HttpSettings {
            base_url: format!("{server_uri}/api"),
            auth_url: format!("{server_uri}/api/login/version/3"),
            timeout_secs: 5,
            user_agent: Some("pardot-infra-tests".to_string()),
            no_proxy: true,
        },
        retry: RetrySettings {
            max_attempts: 3,
            initial_delay_ms: 5,
            max_delay_ms: 20,
            max_total_secs: None,
        },
        logging: LogSettings::default(),
    }
}
