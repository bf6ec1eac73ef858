//! Wire-level constants
//!
//! Endpoints, header scheme and the embedded error codes the remote API
//! reports inside HTTP 200 bodies.

/// Login endpoint (always API version 3).
pub const AUTH_URL: &str = "https://pi.pardot.com/api/login/version/3";
/// Base for every data and describe endpoint.
pub const ENDPOINT_BASE: &str = "https://pi.pardot.com/api";

/// Scheme token that prefixes the custom `Authorization` header.
pub const AUTH_SCHEME: &str = "Pardot";
/// API version assumed when the login response omits `version`.
pub const DEFAULT_API_VERSION: &str = "3";

/// Namespace prefix for quota counter keys.
pub const QUOTA_KEY_PREFIX: &str = "tap-pardot";
/// Days a daily counter lives before the store expires it.
pub const DEFAULT_QUOTA_TTL_DAYS: u32 = 30;

// Embedded error codes
// http://developer.pardot.com/kb/error-codes-messages/

/// Invalid API key or user key; the session must be renewed.
pub const ERR_INVALID_KEY: i64 = 1;
/// Too many concurrent API requests for the account.
pub const ERR_CONCURRENCY_LIMIT: i64 = 66;
/// Account-wide daily API request limit reached on the server.
pub const ERR_DAILY_LIMIT_EXCEEDED: i64 = 122;

/// Message attached to the locally enforced daily-limit error.
pub const USER_LIMIT_MESSAGE: &str = "Pardot API limit set in config has been met.";
