//! Endpoint URL templates and default query parameters

use pardot_domain::{ApiOperation, HttpMethod, PardotError, Result};
use url::Url;

/// One logical call against a data or describe endpoint.
///
/// The URL is resolved once per backoff attempt from the session's API
/// version at that moment. The resend after a re-login reuses the URL of the
/// attempt that triggered it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiCall {
    pub method: HttpMethod,
    pub endpoint: String,
    pub operation: ApiOperation,
    /// Extra path segments appended after the operation
    pub segments: Vec<String>,
    /// Caller-supplied query filters
    pub params: Vec<(String, String)>,
}

impl ApiCall {
    pub fn query(method: HttpMethod, endpoint: impl Into<String>) -> Self {
        Self {
            method,
            endpoint: endpoint.into(),
            operation: ApiOperation::Query,
            segments: Vec::new(),
            params: Vec::new(),
        }
    }

    pub fn describe(endpoint: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            endpoint: endpoint.into(),
            operation: ApiOperation::Describe,
            segments: Vec::new(),
            params: Vec::new(),
        }
    }

    pub fn with_segments<I, S>(mut self, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.segments = segments.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_params<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.params = params.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        self
    }

    /// `<base>/<endpoint>/version/<api_version>/do/<operation>[/<segment>...]`
    ///
    /// Every segment is percent-encoded on its own, so a `/` inside a
    /// caller value cannot change the path shape.
    pub fn url(&self, base: &Url, api_version: &str) -> Result<String> {
        if self.endpoint.trim().is_empty() {
            return Err(PardotError::Config("endpoint name must not be empty".into()));
        }

        let mut url = base.clone();
        {
            let mut path = url.path_segments_mut().map_err(|()| {
                PardotError::Config(format!("base URL cannot carry a path: {base}"))
            })?;
            path.pop_if_empty();
            path.push(&self.endpoint);
            path.extend(["version", api_version, "do", self.operation.as_str()]);
            path.extend(self.segments.iter().map(String::as_str));
        }
        Ok(url.into())
    }

    /// `format=json&output=bulk` followed by the caller's filters. A filter
    /// with the same name replaces the default value in place.
    pub fn query_params(&self) -> Vec<(String, String)> {
        let mut query = vec![
            ("format".to_string(), "json".to_string()),
            ("output".to_string(), "bulk".to_string()),
        ];
        for (key, value) in &self.params {
            match query.iter_mut().find(|(existing, _)| existing == key) {
                Some(slot) => slot.1 = value.clone(),
                None => query.push((key.clone(), value.clone())),
            }
        }
        query
    }
}

/// Parse the configured base URL for data endpoints.
pub fn parse_base_url(raw: &str) -> Result<Url> {
    Url::parse(raw).map_err(|e| PardotError::Config(format!("invalid base URL '{raw}': {e}")))
}
