//! Client facade used by the extraction pipeline

use std::sync::Arc;

use pardot_common::time::Clock;
use pardot_domain::{HttpMethod, PardotConfig, Result, Session};
use serde_json::Value;
use tracing::info;

use super::endpoint::{parse_base_url, ApiCall};
use super::executor::{retry_config, RequestExecutor};
use super::ports::ApiTransport;
use crate::quota::{DailyQuota, QuotaStore};
use crate::session::SessionManager;

/// Quota-governed, self-healing client for the Pardot API.
///
/// Construction initializes today's counter, refuses to start when the daily
/// limit is already met, and logs in. Every call afterwards goes through the
/// shared [`RequestExecutor`].
#[derive(Debug)]
pub struct PardotClient {
    executor: RequestExecutor,
    session: Arc<SessionManager>,
    quota: Arc<DailyQuota>,
}

impl PardotClient {
    /// Build a client from configuration and injected adapters.
    pub async fn connect(
        config: &PardotConfig,
        transport: Arc<dyn ApiTransport>,
        store: Arc<dyn QuotaStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config.validate()?;
        let base_url = parse_base_url(&config.http.base_url)?;
        let retry = retry_config(&config.retry)?;

        let quota = Arc::new(DailyQuota::new(
            store,
            clock,
            config.account_id.clone(),
            config.daily_limit,
            config.quota_store.ttl(),
        ));
        let count = quota.check().await?;

        let session = Arc::new(SessionManager::new(
            Arc::clone(&transport),
            Arc::clone(&quota),
            config.credentials(),
            config.http.auth_url.clone(),
        ));
        session.login().await?;

        info!(
            account_id = %config.account_id,
            calls_made_today = count,
            daily_limit = ?config.daily_limit,
            "Pardot client ready"
        );

        let executor = RequestExecutor::new(
            transport,
            Arc::clone(&session),
            Arc::clone(&quota),
            base_url,
            retry,
        );
        Ok(Self { executor, session, quota })
    }

    /// Query an endpoint with GET.
    pub async fn get(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<Value> {
        self.get_with_segments(endpoint, &[], params).await
    }

    /// Query an endpoint with GET, appending extra path segments after
    /// `do/query`.
    pub async fn get_with_segments(
        &self,
        endpoint: &str,
        segments: &[&str],
        params: &[(&str, &str)],
    ) -> Result<Value> {
        let call = ApiCall::query(HttpMethod::Get, endpoint)
            .with_segments(segments.iter().copied())
            .with_params(params.iter().copied());
        self.executor.execute(&call).await
    }

    /// Query an endpoint with POST. Parameters still travel in the query
    /// string.
    pub async fn post(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<Value> {
        self.post_with_segments(endpoint, &[], params).await
    }

    pub async fn post_with_segments(
        &self,
        endpoint: &str,
        segments: &[&str],
        params: &[(&str, &str)],
    ) -> Result<Value> {
        let call = ApiCall::query(HttpMethod::Post, endpoint)
            .with_segments(segments.iter().copied())
            .with_params(params.iter().copied());
        self.executor.execute(&call).await
    }

    /// Fetch schema metadata for an endpoint.
    pub async fn describe(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<Value> {
        let call = ApiCall::describe(endpoint).with_params(params.iter().copied());
        self.executor.execute(&call).await
    }

    /// Run a prepared call.
    pub async fn execute(&self, call: &ApiCall) -> Result<Value> {
        self.executor.execute(call).await
    }

    /// The live session.
    pub fn session(&self) -> Result<Session> {
        self.session.current()
    }

    /// Calls recorded against the account today, across every client sharing
    /// the store.
    pub async fn calls_made_today(&self) -> Result<u64> {
        self.quota.current_count().await
    }

    pub fn daily_limit(&self) -> Option<u64> {
        self.quota.daily_limit()
    }
}
