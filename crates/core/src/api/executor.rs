//! Quota-governed, self-healing request execution

use std::sync::Arc;

use pardot_common::resilience::{RetryConfig, RetryError, RetryExecutor};
use pardot_domain::{PardotError, QuotaExceededReason, RequestOutcome, Result, RetrySettings};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::classification::{classify, PardotRetryPolicy};
use super::endpoint::ApiCall;
use super::ports::{ApiRequest, ApiTransport, RawResponse};
use crate::quota::DailyQuota;
use crate::session::SessionManager;

/// Backoff configuration derived from [`RetrySettings`]: exponential, base 2,
/// no jitter.
pub fn retry_config(settings: &RetrySettings) -> Result<RetryConfig> {
    let mut builder = RetryConfig::builder()
        .max_attempts(settings.max_attempts)
        .exponential_backoff(settings.initial_delay(), 2.0, settings.max_delay());
    if let Some(limit) = settings.max_total_time() {
        builder = builder.max_total_time(limit);
    }
    builder.build().map_err(|err| match err {
        RetryError::InvalidConfiguration { message } => PardotError::Config(message),
        _ => PardotError::Config("invalid retry configuration".to_string()),
    })
}

/// Issues logical calls: checks the daily budget, sends, classifies,
/// re-authenticates once on an expired key and backs off on retryable
/// failures.
pub struct RequestExecutor {
    transport: Arc<dyn ApiTransport>,
    session: Arc<SessionManager>,
    quota: Arc<DailyQuota>,
    base_url: Url,
    retry: RetryExecutor<PardotRetryPolicy>,
}

impl RequestExecutor {
    pub fn new(
        transport: Arc<dyn ApiTransport>,
        session: Arc<SessionManager>,
        quota: Arc<DailyQuota>,
        base_url: Url,
        retry: RetryConfig,
    ) -> Self {
        Self {
            transport,
            session,
            quota,
            base_url,
            retry: RetryExecutor::new(retry, PardotRetryPolicy),
        }
    }

    /// Run one logical call with exponential backoff on retryable errors.
    ///
    /// When attempts run out the last retryable error is returned.
    #[instrument(
        skip(self, call),
        fields(method = %call.method, endpoint = %call.endpoint, operation = call.operation.as_str())
    )]
    pub async fn execute(&self, call: &ApiCall) -> Result<Value> {
        self.retry.execute(|| self.execute_once(call)).await.map_err(into_pardot_error)
    }

    /// Run one attempt of a logical call, without backoff.
    pub async fn execute_once(&self, call: &ApiCall) -> Result<Value> {
        self.quota.check().await?;

        let session = self.session.current()?;
        let url = call.url(&self.base_url, &session.api_version)?;
        let query = call.query_params();

        info!(method = %call.method, url = %url, params = ?call.params, "Making request");
        let response = self.send(call, &url, &query).await?;

        match classify(response.status, &response.body)? {
            RequestOutcome::ReauthRequired(error) => {
                info!(code = error.code, "API key or user key expired -- reauthenticating once");
                self.session.login().await?;

                // same URL; a changed API version is picked up by the next attempt
                let retried = self.send(call, &url, &query).await?;
                match classify(retried.status, &retried.body)? {
                    RequestOutcome::ReauthRequired(error) => {
                        warn!(code = error.code, "Key rejected again after reauthenticating");
                        Err(PardotError::Api {
                            code: error.code,
                            message: error.message,
                            response: decoded_body(&retried),
                        })
                    }
                    outcome => self.settle(outcome, &url).await,
                }
            }
            outcome => self.settle(outcome, &url).await,
        }
    }

    async fn send(
        &self,
        call: &ApiCall,
        url: &str,
        query: &[(String, String)],
    ) -> Result<RawResponse> {
        let request = ApiRequest::new(call.method, url)
            .with_query(query.to_vec())
            .with_authorization(self.session.auth_header()?);
        let response = self.transport.send(request).await?;
        debug!(status = response.status, bytes = response.body.len(), "Received response");
        Ok(response)
    }

    /// Turn a classified outcome into the caller-visible result. Only
    /// `Success` counts against the daily quota.
    async fn settle(&self, outcome: RequestOutcome, url: &str) -> Result<Value> {
        match outcome {
            RequestOutcome::Success(payload) => {
                self.quota.record_call().await?;
                Ok(payload)
            }
            RequestOutcome::RateLimited(error) => {
                Err(PardotError::ConcurrencyLimited { code: error.code, message: error.message })
            }
            RequestOutcome::ServerError { status } => {
                warn!(status, url, "Server error");
                Err(PardotError::Server { status, url: url.to_string() })
            }
            RequestOutcome::TransportError { status, body } => {
                Err(PardotError::Transport { status, url: url.to_string(), body })
            }
            RequestOutcome::QuotaExceeded(error) => {
                warn!(code = error.code, "Server reported the account daily limit");
                Err(PardotError::QuotaExceeded {
                    reason: QuotaExceededReason::ServerReported {
                        code: error.code,
                        message: error.message,
                    },
                })
            }
            RequestOutcome::ClientError { error, response } => {
                Err(PardotError::Api { code: error.code, message: error.message, response })
            }
            RequestOutcome::ReauthRequired(error) => Err(PardotError::Api {
                code: error.code,
                message: error.message,
                response: Value::Null,
            }),
        }
    }
}

fn decoded_body(response: &RawResponse) -> Value {
    serde_json::from_str(&response.body).unwrap_or(Value::Null)
}

fn into_pardot_error(err: RetryError<PardotError>) -> PardotError {
    match err {
        RetryError::InvalidConfiguration { message } => PardotError::Config(message),
        other => other
            .into_source()
            .unwrap_or_else(|| PardotError::Internal("retry ended without an error".to_string())),
    }
}

impl std::fmt::Debug for RequestExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestExecutor")
            .field("base_url", &self.base_url.as_str())
            .field("retry", self.retry.config())
            .finish_non_exhaustive()
    }
}
