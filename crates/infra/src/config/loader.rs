//! Configuration loader
//!
//! Loads client configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! Required:
//! - `PARDOT_ACCOUNT_ID`: Account the daily counter is keyed on
//! - `PARDOT_EMAIL`, `PARDOT_PASSWORD`, `PARDOT_USER_KEY`: Login credentials
//! - `PARDOT_QUOTA_DB_PATH`: Shared quota database file (SQLite backend)
//! - `PARDOT_REDIS_HOST`: Quota server host (Redis backend)
//!
//! Optional:
//! - `PARDOT_QUOTA_BACKEND`: `sqlite` (default) or `redis`
//! - `PARDOT_REDIS_PORT`, `PARDOT_REDIS_DB`: Quota server port and database
//!   index
//! - `PARDOT_DAILY_LIMIT`: Maximum calls per day (unset means unlimited)
//! - `PARDOT_QUOTA_TTL_DAYS`: Counter lifetime in days
//! - `PARDOT_HTTP_TIMEOUT_SECS`: Per-request timeout
//! - `PARDOT_HTTP_NO_PROXY`: Ignore proxy environment variables (true/false)
//! - `PARDOT_RETRY_MAX_ATTEMPTS`: Attempts per call, including the first
//! - `PARDOT_LOG_LEVEL`: Fallback log filter when `RUST_LOG` is unset
//! - `PARDOT_LOG_JSON`: Emit JSON log lines (true/false)
//!
//! ## File Locations
//! The loader probes `config.{json,toml}` and `pardot.{json,toml}` in the
//! current directory and its two parents, then next to the executable.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use pardot_domain::{
    HttpSettings, LogSettings, PardotConfig, PardotError, QuotaBackend, QuotaStoreConfig, Result,
    RetrySettings,
};

const CONFIG_FILE_NAMES: [&str; 4] = ["config.json", "config.toml", "pardot.json", "pardot.toml"];

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If any required
/// variables are missing, falls back to loading from a config file.
///
/// # Errors
/// Returns `PardotError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - Required fields are missing
pub fn load() -> Result<PardotConfig> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = %e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// All required environment variables must be present. Optional ones
/// override the defaults of their section.
///
/// # Errors
/// Returns `PardotError::Config` if required variables are missing
/// or any value fails to parse.
pub fn load_from_env() -> Result<PardotConfig> {
    let account_id = env_var("PARDOT_ACCOUNT_ID")?;
    let email = env_var("PARDOT_EMAIL")?;
    let password = env_var("PARDOT_PASSWORD")?;
    let user_key = env_var("PARDOT_USER_KEY")?;

    let backend: QuotaBackend = env_parse("PARDOT_QUOTA_BACKEND")?.unwrap_or_default();
    let mut quota_store = match backend {
        QuotaBackend::Sqlite => QuotaStoreConfig::new(env_var("PARDOT_QUOTA_DB_PATH")?),
        QuotaBackend::Redis => {
            let mut redis = QuotaStoreConfig::redis(env_var("PARDOT_REDIS_HOST")?, 6379, 0);
            if let Some(port) = env_parse("PARDOT_REDIS_PORT")? {
                redis.port = port;
            }
            if let Some(db) = env_parse("PARDOT_REDIS_DB")? {
                redis.db = db;
            }
            redis
        }
    };
    if let Some(days) = env_parse("PARDOT_QUOTA_TTL_DAYS")? {
        quota_store.ttl_days = days;
    }

    let mut http = HttpSettings::default();
    if let Some(secs) = env_parse("PARDOT_HTTP_TIMEOUT_SECS")? {
        http.timeout_secs = secs;
    }
    http.no_proxy = env_bool("PARDOT_HTTP_NO_PROXY", false);

    let mut retry = RetrySettings::default();
    if let Some(attempts) = env_parse("PARDOT_RETRY_MAX_ATTEMPTS")? {
        retry.max_attempts = attempts;
    }

    let mut logging = LogSettings::default();
    if let Ok(level) = std::env::var("PARDOT_LOG_LEVEL") {
        logging.level = level;
    }
    logging.json = env_bool("PARDOT_LOG_JSON", false);

    Ok(PardotConfig {
        account_id,
        email,
        password,
        user_key,
        daily_limit: env_parse("PARDOT_DAILY_LIMIT")?,
        quota_store,
        http,
        retry,
        logging,
    })
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `PardotError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
/// - Required fields are missing
pub fn load_from_file(path: Option<PathBuf>) -> Result<PardotConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(PardotError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            PardotError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| PardotError::Config(format!("Failed to read config file: {}", e)))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<PardotConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| PardotError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| PardotError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(PardotError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Probe multiple paths for configuration files
///
/// Searches the current working directory and up to two parents, then the
/// executable's directory and its two parents.
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut roots = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        roots.extend([cwd.clone(), cwd.join(".."), cwd.join("../..")]);
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            roots.extend([exe_dir.to_path_buf(), exe_dir.join(".."), exe_dir.join("../..")]);
        }
    }

    roots
        .iter()
        .flat_map(|root| CONFIG_FILE_NAMES.iter().map(move |name| root.join(name)))
        .find(|path| path.exists())
}

/// Get required environment variable
///
/// # Errors
/// Returns `PardotError::Config` if the variable is not set.
fn env_var(key: &str) -> Result<String> {
    std::env::var(key)
        .map_err(|_| PardotError::Config(format!("Missing required environment variable: {}", key)))
}

/// Parse an optional environment variable
///
/// # Errors
/// Returns `PardotError::Config` if the variable is set but does not parse.
fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| PardotError::Config(format!("Invalid value for {}: {}", key, e))),
        Err(_) => Ok(None),
    }
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
