//! Response classification and the retry predicate
//!
//! The remote API reports most failures inside HTTP 200 bodies:
//!
//! ```json
//! {"@attributes": {"stat": "fail", "err_code": 66}, "err": "..."}
//! ```
//!
//! [`classify`] turns a raw response into a [`RequestOutcome`] without side
//! effects; [`PardotRetryPolicy`] decides which resulting errors the backoff
//! loop may retry.

use pardot_common::resilience::{RetryDecision, RetryPolicy};
use pardot_domain::constants::{ERR_CONCURRENCY_LIMIT, ERR_DAILY_LIMIT_EXCEEDED, ERR_INVALID_KEY};
use pardot_domain::{EmbeddedError, PardotError, RequestOutcome, Result};
use serde_json::Value;
use tracing::warn;

/// Extract the embedded error indicator from a decoded body.
///
/// The indicator is a truthy `err` field: null, `false`, zero, blank strings
/// and empty arrays or objects all mean no error. The code comes from
/// `@attributes.err_code`, falling back to a top-level `err_code`; either may
/// be a number or a numeric string. A missing code reads as 0.
pub fn embedded_error(body: &Value) -> Option<EmbeddedError> {
    let message = match body.get("err")? {
        Value::Null | Value::Bool(false) => return None,
        Value::Number(n) if n.as_f64() == Some(0.0) => return None,
        Value::String(s) if s.trim().is_empty() => return None,
        Value::Array(items) if items.is_empty() => return None,
        Value::Object(fields) if fields.is_empty() => return None,
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };

    let code = body
        .get("@attributes")
        .and_then(|attrs| attrs.get("err_code"))
        .or_else(|| body.get("err_code"))
        .and_then(parse_code)
        .unwrap_or(0);

    Some(EmbeddedError { code, message })
}

fn parse_code(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Classify a raw response.
///
/// Fails only when a 2xx body is not valid JSON.
pub fn classify(status: u16, body: &str) -> Result<RequestOutcome> {
    if status >= 500 {
        return Ok(RequestOutcome::ServerError { status });
    }
    if !(200..300).contains(&status) {
        return Ok(RequestOutcome::TransportError { status, body: body.to_string() });
    }

    let value: Value = serde_json::from_str(body)
        .map_err(|e| PardotError::Decode(format!("HTTP {status} body is not JSON: {e}")))?;

    let outcome = match embedded_error(&value) {
        None => RequestOutcome::Success(value),
        Some(error) => match error.code {
            ERR_INVALID_KEY => RequestOutcome::ReauthRequired(error),
            ERR_CONCURRENCY_LIMIT => RequestOutcome::RateLimited(error),
            ERR_DAILY_LIMIT_EXCEEDED => RequestOutcome::QuotaExceeded(error),
            _ => RequestOutcome::ClientError { error, response: value },
        },
    };
    Ok(outcome)
}

/// Retry predicate for the backoff loop.
///
/// Quota exhaustion and terminal API errors stop immediately; server errors,
/// network failures and the concurrency-limit code are retried.
#[derive(Debug, Clone, Copy, Default)]
pub struct PardotRetryPolicy;

impl RetryPolicy<PardotError> for PardotRetryPolicy {
    fn should_retry(&self, error: &PardotError, attempt: u32) -> RetryDecision {
        if !error.is_retryable() {
            return RetryDecision::Stop;
        }
        if let PardotError::ConcurrencyLimited { .. } = error {
            warn!(attempt, "Exceeded concurrent request limit, backing off exponentially");
        }
        RetryDecision::Retry
    }
}
