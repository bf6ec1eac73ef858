//! Configuration structures
//!
//! Supplied by the calling pipeline (environment or file, see
//! `pardot_infra::config`). Optional sections fall back to their defaults.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{AUTH_URL, DEFAULT_QUOTA_TTL_DAYS, ENDPOINT_BASE};
use crate::errors::{PardotError, Result};
use crate::types::Credentials;

/// Top-level client configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct PardotConfig {
    /// Account identifier the daily counter is keyed on
    pub account_id: String,
    pub email: String,
    pub password: String,
    pub user_key: String,
    /// Maximum remote calls per account per day; `None` means unlimited
    #[serde(default)]
    pub daily_limit: Option<u64>,
    pub quota_store: QuotaStoreConfig,
    #[serde(default)]
    pub http: HttpSettings,
    #[serde(default)]
    pub retry: RetrySettings,
    #[serde(default)]
    pub logging: LogSettings,
}

impl PardotConfig {
    /// Credentials held by the session manager.
    pub fn credentials(&self) -> Credentials {
        Credentials::new(&self.email, &self.password, &self.user_key)
    }

    /// Check the values a client cannot run without.
    pub fn validate(&self) -> Result<()> {
        if self.account_id.trim().is_empty() {
            return Err(PardotError::Config("account_id must not be empty".into()));
        }
        match self.quota_store.backend {
            QuotaBackend::Sqlite if self.quota_store.path.trim().is_empty() => {
                return Err(PardotError::Config("quota_store.path must not be empty".into()));
            }
            QuotaBackend::Redis if self.quota_store.host.trim().is_empty() => {
                return Err(PardotError::Config("quota_store.host must not be empty".into()));
            }
            _ => {}
        }
        if self.quota_store.ttl_days == 0 {
            return Err(PardotError::Config("quota_store.ttl_days must be greater than 0".into()));
        }
        if self.retry.max_attempts == 0 {
            return Err(PardotError::Config("retry.max_attempts must be greater than 0".into()));
        }
        self.credentials().validate()
    }
}

impl fmt::Debug for PardotConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PardotConfig")
            .field("account_id", &self.account_id)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("user_key", &"<redacted>")
            .field("daily_limit", &self.daily_limit)
            .field("quota_store", &self.quota_store)
            .field("http", &self.http)
            .field("retry", &self.retry)
            .field("logging", &self.logging)
            .finish()
    }
}

/// Where the shared daily counters live
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuotaBackend {
    /// A SQLite file; every process sharing the budget must reach the file
    #[default]
    Sqlite,
    /// A Redis server reachable over the network
    Redis,
}

impl FromStr for QuotaBackend {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "sqlite" => Ok(Self::Sqlite),
            "redis" => Ok(Self::Redis),
            other => Err(format!("unknown quota backend '{other}' (expected sqlite or redis)")),
        }
    }
}

/// Shared counter store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaStoreConfig {
    #[serde(default)]
    pub backend: QuotaBackend,
    /// SQLite file every process sharing the budget points at
    #[serde(default)]
    pub path: String,
    /// Redis host
    #[serde(default = "default_redis_host")]
    pub host: String,
    #[serde(default = "default_redis_port")]
    pub port: u16,
    /// Redis logical database index
    #[serde(default)]
    pub db: i64,
    #[serde(default = "default_ttl_days")]
    pub ttl_days: u32,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl QuotaStoreConfig {
    /// SQLite store at `path`.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            backend: QuotaBackend::Sqlite,
            path: path.into(),
            host: default_redis_host(),
            port: default_redis_port(),
            db: 0,
            ttl_days: default_ttl_days(),
            pool_size: default_pool_size(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }

    /// Redis store at `host:port`, logical database `db`.
    pub fn redis(host: impl Into<String>, port: u16, db: i64) -> Self {
        Self {
            backend: QuotaBackend::Redis,
            host: host.into(),
            port,
            db,
            ..Self::new("")
        }
    }

    /// Connection URL for the Redis backend.
    pub fn redis_url(&self) -> String {
        format!("redis://{}:{}/{}", self.host, self.port, self.db)
    }

    /// Lifetime of a daily counter.
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(u64::from(self.ttl_days) * 24 * 60 * 60)
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

/// HTTP transport settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_auth_url")]
    pub auth_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub user_agent: Option<String>,
    /// Ignore `HTTP_PROXY` and friends
    #[serde(default)]
    pub no_proxy: bool,
}

impl HttpSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            auth_url: default_auth_url(),
            timeout_secs: default_timeout_secs(),
            user_agent: None,
            no_proxy: false,
        }
    }
}

/// Backoff policy for retryable failures (exponential, no jitter)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Total attempts per logical call, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay before the first retry; doubles on each following retry
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// Optional ceiling on the time spent retrying one call
    #[serde(default)]
    pub max_total_secs: Option<u64>,
}

impl RetrySettings {
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    pub fn max_total_time(&self) -> Option<Duration> {
        self.max_total_secs.map(Duration::from_secs)
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            max_total_secs: None,
        }
    }
}

/// Tracing subscriber settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogSettings {
    /// Fallback filter directive when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self { level: default_log_level(), json: false }
    }
}

fn default_ttl_days() -> u32 {
    DEFAULT_QUOTA_TTL_DAYS
}

fn default_redis_host() -> String {
    "localhost".to_string()
}

fn default_redis_port() -> u16 {
    6379
}

fn default_pool_size() -> u32 {
    4
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

fn default_base_url() -> String {
    ENDPOINT_BASE.to_string()
}

fn default_auth_url() -> String {
    AUTH_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_attempts() -> u32 {
    8
}

fn default_initial_delay_ms() -> u64 {
    1_000
}

fn default_max_delay_ms() -> u64 {
    60_000
}

fn default_log_level() -> String {
    "info".to_string()
}
