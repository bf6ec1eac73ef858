//! Shared test helpers for `pardot-core` integration tests.
//!
//! Lightweight fakes for the two ports plus configuration fixtures, so that
//! tests can focus on behaviour instead of boilerplate.

#![allow(dead_code)]

pub mod quota;
pub mod transport;

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use pardot_common::time::MockClock;
use pardot_core::PardotClient;
use pardot_domain::{
    HttpSettings, LogSettings, PardotConfig, QuotaStoreConfig, Result as DomainResult,
    RetrySettings,
};

pub use quota::MockQuotaStore;
pub use transport::ScriptedTransport;

pub const ACCOUNT_ID: &str = "acct-1";
pub const AUTH_URL: &str = "https://pi.test/api/login/version/3";
pub const BASE_URL: &str = "https://pi.test/api";
pub const USER_KEY: &str = "user-key";

/// Configuration pointing at the fake endpoints.
pub fn config(daily_limit: Option<u64>) -> PardotConfig {
    PardotConfig {
        account_id: ACCOUNT_ID.to_string(),
        email: "etl@example.com".to_string(),
        password: "secret".to_string(),
        user_key: USER_KEY.to_string(),
        daily_limit,
        quota_store: QuotaStoreConfig::new("unused.db"),
        http: HttpSettings {
            base_url: BASE_URL.to_string(),
            auth_url: AUTH_URL.to_string(),
            ..HttpSettings::default()
        },
        retry: RetrySettings::default(),
        logging: LogSettings::default(),
    }
}

/// Mock clock pinned to 2024-03-07 12:00 UTC.
pub fn clock() -> Arc<MockClock> {
    Arc::new(MockClock::at_utc(Utc.with_ymd_and_hms(2024, 3, 7, 12, 0, 0).unwrap()))
}

/// Storage key for the default account on the default clock's day.
pub fn today_key() -> String {
    format!("tap-pardot/{ACCOUNT_ID}/2024-03-07")
}

pub async fn connect(
    config: &PardotConfig,
    transport: &Arc<ScriptedTransport>,
    store: &Arc<MockQuotaStore>,
    clock: &Arc<MockClock>,
) -> DomainResult<PardotClient> {
    PardotClient::connect(config, transport.clone(), store.clone(), clock.clone()).await
}
