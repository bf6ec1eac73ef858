//! Request shapes and the classified outcome of a raw response

use std::fmt;

use serde::{Deserialize, Serialize};

/// HTTP verbs the API surface uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final path segment of a data endpoint (`.../do/<operation>`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiOperation {
    Query,
    Describe,
}

impl ApiOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Describe => "describe",
        }
    }
}

/// Error reported inside a 2xx body: `{"err": "...", "@attributes": {"err_code": N}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddedError {
    pub code: i64,
    pub message: String,
}

/// Classification of one raw response.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestOutcome {
    /// 2xx with no embedded error.
    Success(serde_json::Value),
    /// Embedded "invalid key": log in again and resend once.
    ReauthRequired(EmbeddedError),
    /// Embedded concurrency-limit code: back off and retry.
    RateLimited(EmbeddedError),
    /// HTTP 5xx: back off and retry.
    ServerError { status: u16 },
    /// Non-2xx, non-5xx HTTP status. Terminal.
    TransportError { status: u16, body: String },
    /// Any other embedded error. Terminal.
    ClientError { error: EmbeddedError, response: serde_json::Value },
    /// Embedded account-level daily limit code. Terminal.
    QuotaExceeded(EmbeddedError),
}

impl RequestOutcome {
    /// Whether the remote side accepted the call.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Success(_) => "success",
            Self::ReauthRequired(_) => "reauth_required",
            Self::RateLimited(_) => "rate_limited",
            Self::ServerError { .. } => "server_error",
            Self::TransportError { .. } => "transport_error",
            Self::ClientError { .. } => "client_error",
            Self::QuotaExceeded(_) => "quota_exceeded",
        }
    }
}
