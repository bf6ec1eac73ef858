//! Error types used throughout the client

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{ERR_CONCURRENCY_LIMIT, USER_LIMIT_MESSAGE};

/// Why a request was refused for budget reasons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QuotaExceededReason {
    /// The shared local counter reached the configured daily limit.
    DailyLimit { count: u64, limit: u64 },
    /// The server reported the account-level limit inside a 200 body.
    ServerReported { code: i64, message: String },
}

impl std::fmt::Display for QuotaExceededReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DailyLimit { count, limit } => {
                write!(f, "{USER_LIMIT_MESSAGE} ({count}/{limit} calls made today)")
            }
            Self::ServerReported { code, message } => {
                write!(f, "server reported error code {code}: {message}")
            }
        }
    }
}

/// Coarse error categories used for logging and retry decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Login and credential failures
    Authentication,
    /// Local or server-side budget exhaustion
    Quota,
    /// Server asked us to slow down
    RateLimit,
    /// 5xx responses
    Server,
    /// Connection failures and timeouts
    Network,
    /// Terminal client-side errors (4xx, embedded API errors, bad bodies)
    Client,
    /// Configuration, storage and internal failures
    Internal,
}

/// Main error type for the Pardot client
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "details")]
pub enum PardotError {
    /// An error code embedded in a 2xx response body.
    #[error("Pardot returned error code {code}: {message}")]
    Api { code: i64, message: String, response: serde_json::Value },

    #[error("Authentication failed: {message}")]
    Auth { code: Option<i64>, message: String },

    #[error("Quota exceeded: {reason}")]
    QuotaExceeded { reason: QuotaExceededReason },

    #[error("Exceeded concurrent request limit (code {code}): {message}")]
    ConcurrencyLimited { code: i64, message: String },

    #[error("Server error: HTTP {status} from {url}")]
    Server { status: u16, url: String },

    #[error("Transport error: HTTP {status} from {url}")]
    Transport { status: u16, url: String, body: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response body: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PardotError {
    /// The error raised when the local counter has met the configured limit.
    pub fn daily_limit(count: u64, limit: u64) -> Self {
        Self::QuotaExceeded { reason: QuotaExceededReason::DailyLimit { count, limit } }
    }

    /// Get the error category for this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Auth { .. } => ErrorCategory::Authentication,
            Self::QuotaExceeded { .. } => ErrorCategory::Quota,
            Self::ConcurrencyLimited { .. } => ErrorCategory::RateLimit,
            Self::Server { .. } => ErrorCategory::Server,
            Self::Network(_) => ErrorCategory::Network,
            Self::Api { .. } | Self::Transport { .. } | Self::Decode(_) => ErrorCategory::Client,
            Self::Config(_) | Self::Database(_) | Self::Internal(_) => ErrorCategory::Internal,
        }
    }

    /// Embedded API error code, when the error carries one.
    pub fn code(&self) -> Option<i64> {
        match self {
            Self::Api { code, .. } | Self::ConcurrencyLimited { code, .. } => Some(*code),
            Self::Auth { code, .. } => *code,
            Self::QuotaExceeded { reason: QuotaExceededReason::ServerReported { code, .. } } => {
                Some(*code)
            }
            _ => None,
        }
    }

    /// Whether backing off and trying again can help.
    ///
    /// Quota exhaustion is never retryable. Embedded API errors are terminal
    /// unless they carry the concurrency-limit code.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Server { .. } | Self::Network(_) | Self::ConcurrencyLimited { .. } => true,
            Self::Api { code, .. } => *code == ERR_CONCURRENCY_LIMIT,
            _ => false,
        }
    }

    /// Whether the error signals an exhausted call budget.
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, Self::QuotaExceeded { .. })
    }

    /// Stable label suitable for structured logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Api { .. } => "api",
            Self::Auth { .. } => "auth",
            Self::QuotaExceeded { .. } => "quota_exceeded",
            Self::ConcurrencyLimited { .. } => "concurrency_limited",
            Self::Server { .. } => "server",
            Self::Transport { .. } => "transport",
            Self::Network(_) => "network",
            Self::Decode(_) => "decode",
            Self::Config(_) => "config",
            Self::Database(_) => "database",
            Self::Internal(_) => "internal",
        }
    }
}

/// Result type alias for Pardot operations
pub type Result<T> = std::result::Result<T, PardotError>;
