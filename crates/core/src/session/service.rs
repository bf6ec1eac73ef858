//! Login and session ownership

use std::sync::Arc;

use pardot_domain::{Credentials, HttpMethod, PardotError, Result, Session};
use parking_lot::RwLock;
use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::api::classification::embedded_error;
use crate::api::ports::{ApiRequest, ApiTransport};
use crate::quota::DailyQuota;

/// Owns the credentials and the live session derived from them.
///
/// The session is replaced wholesale after each successful login; readers
/// always see either the old or the new session, never a mix.
pub struct SessionManager {
    transport: Arc<dyn ApiTransport>,
    quota: Arc<DailyQuota>,
    credentials: Credentials,
    auth_url: String,
    session: RwLock<Option<Session>>,
}

impl SessionManager {
    pub fn new(
        transport: Arc<dyn ApiTransport>,
        quota: Arc<DailyQuota>,
        credentials: Credentials,
        auth_url: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            quota,
            credentials,
            auth_url: auth_url.into(),
            session: RwLock::new(None),
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Authenticate and replace the current session.
    ///
    /// Every failure is reported as `PardotError::Auth`; login is never
    /// retried. A successful login counts against the daily quota.
    #[instrument(skip(self), fields(email = %self.credentials.email))]
    pub async fn login(&self) -> Result<Session> {
        self.credentials.validate()?;

        let request = ApiRequest::new(HttpMethod::Post, self.auth_url.clone())
            .with_query(vec![("format".to_string(), "json".to_string())])
            .with_form(self.credentials.form_fields());

        let response = self.transport.send(request).await.map_err(|e| PardotError::Auth {
            code: None,
            message: format!("login request failed: {e}"),
        })?;

        if !response.is_success() {
            warn!(status = response.status, "Authentication endpoint rejected the request");
            return Err(PardotError::Auth {
                code: None,
                message: format!("authentication endpoint returned HTTP {}", response.status),
            });
        }

        let content: Value = serde_json::from_str(&response.body).map_err(|e| PardotError::Auth {
            code: None,
            message: format!("authentication response is not JSON: {e}"),
        })?;

        if let Some(error) = embedded_error(&content) {
            warn!(code = error.code, "Authentication failed");
            return Err(PardotError::Auth {
                code: Some(error.code),
                message: format!(
                    "Pardot returned error code {} while authenticating. Message: {}",
                    error.code, error.message
                ),
            });
        }

        let api_key = content
            .get("api_key")
            .and_then(Value::as_str)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| PardotError::Auth {
                code: None,
                message: "authentication response has no api_key".to_string(),
            })?;
        let api_version = content.get("version").and_then(version_string);

        self.quota.record_call().await?;

        let session = Session::new(api_key, api_version);
        info!(api_version = %session.api_version, "Authenticated");
        *self.session.write() = Some(session.clone());
        Ok(session)
    }

    /// The live session, or an `Auth` error when no login has succeeded.
    pub fn current(&self) -> Result<Session> {
        self.session.read().clone().ok_or_else(|| PardotError::Auth {
            code: None,
            message: "not logged in".to_string(),
        })
    }

    /// `Authorization` header value for the live session.
    pub fn auth_header(&self) -> Result<String> {
        Ok(self.current()?.auth_header(&self.credentials.user_key))
    }
}

fn version_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("credentials", &self.credentials)
            .field("auth_url", &self.auth_url)
            .field("session", &*self.session.read())
            .finish_non_exhaustive()
    }
}
