use std::time::Duration;

use async_trait::async_trait;
use pardot_core::{ApiRequest, ApiTransport, RawResponse};
use pardot_domain::{HttpMethod, HttpSettings, PardotError, Result};
use reqwest::header::AUTHORIZATION;
use reqwest::{Client as ReqwestClient, Method};
use tracing::debug;

use crate::errors::InfraError;

/// [`ApiTransport`] backed by a shared reqwest client.
///
/// Every response that arrives is handed back untouched; status handling
/// belongs to the request executor.
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: ReqwestClient,
}

impl ReqwestTransport {
    /// Start building a new transport.
    pub fn builder() -> ReqwestTransportBuilder {
        ReqwestTransportBuilder::default()
    }

    /// Convenience constructor with default configuration.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Build a transport from the HTTP section of the client configuration.
    pub fn from_settings(settings: &HttpSettings) -> Result<Self> {
        let mut builder = Self::builder().timeout(settings.timeout());
        if let Some(agent) = &settings.user_agent {
            builder = builder.user_agent(agent.clone());
        }
        if settings.no_proxy {
            builder = builder.no_proxy();
        }
        builder.build()
    }
}

#[async_trait]
impl ApiTransport for ReqwestTransport {
    async fn send(&self, request: ApiRequest) -> Result<RawResponse> {
        let method = match request.method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
        };

        let mut builder = self.client.request(method.clone(), &request.url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if !request.form.is_empty() {
            builder = builder.form(&request.form);
        }
        if let Some(authorization) = &request.authorization {
            builder = builder.header(AUTHORIZATION, authorization.as_str());
        }

        debug!(%method, url = %request.url, "sending HTTP request");

        let response = builder.send().await.map_err(map_http_error)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(map_http_error)?;

        debug!(%method, url = %request.url, status, bytes = body.len(), "received HTTP response");

        Ok(RawResponse::new(status, body))
    }
}

/// Builder for [`ReqwestTransport`].
///
/// System proxy settings (`HTTP_PROXY`, `HTTPS_PROXY`, `NO_PROXY`) are
/// honoured unless [`no_proxy`](Self::no_proxy) is called.
#[derive(Debug)]
pub struct ReqwestTransportBuilder {
    timeout: Duration,
    user_agent: Option<String>,
    no_proxy: bool,
}

impl Default for ReqwestTransportBuilder {
    fn default() -> Self {
        Self { timeout: Duration::from_secs(30), user_agent: None, no_proxy: false }
    }
}

impl ReqwestTransportBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Connect directly, ignoring proxy environment variables.
    pub fn no_proxy(mut self) -> Self {
        self.no_proxy = true;
        self
    }

    pub fn build(self) -> Result<ReqwestTransport> {
        let mut builder = ReqwestClient::builder().timeout(self.timeout);

        if self.no_proxy {
            builder = builder.no_proxy();
        }

        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }

        let client = builder.build().map_err(map_http_error)?;

        Ok(ReqwestTransport { client })
    }
}

fn map_http_error(err: reqwest::Error) -> PardotError {
    PardotError::from(InfraError::from(err))
}
