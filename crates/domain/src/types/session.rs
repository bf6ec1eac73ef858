//! Credentials and the session derived from them

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{AUTH_SCHEME, DEFAULT_API_VERSION};
use crate::errors::{PardotError, Result};

/// Login credentials, held unchanged for the lifetime of a client.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
    pub user_key: String,
}

impl Credentials {
    pub fn new(
        email: impl Into<String>,
        password: impl Into<String>,
        user_key: impl Into<String>,
    ) -> Self {
        Self { email: email.into(), password: password.into(), user_key: user_key.into() }
    }

    /// Reject credentials that cannot possibly authenticate.
    pub fn validate(&self) -> Result<()> {
        let missing: Vec<&str> = [
            ("email", &self.email),
            ("password", &self.password),
            ("user_key", &self.user_key),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(PardotError::Auth {
                code: None,
                message: format!("malformed credentials: empty {}", missing.join(", ")),
            })
        }
    }

    /// Form fields posted to the login endpoint.
    pub fn form_fields(&self) -> Vec<(String, String)> {
        vec![
            ("email".to_string(), self.email.clone()),
            ("password".to_string(), self.password.clone()),
            ("user_key".to_string(), self.user_key.clone()),
        ]
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("user_key", &"<redacted>")
            .finish()
    }
}

/// Session obtained from a successful login. Replaced wholesale on re-login.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub api_key: String,
    pub api_version: String,
}

impl Session {
    /// Build a session; an absent or blank version falls back to `"3"`.
    pub fn new(api_key: impl Into<String>, api_version: Option<String>) -> Self {
        let api_version = api_version
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_VERSION.to_string());
        Self { api_key: api_key.into(), api_version }
    }

    /// Value of the `Authorization` header for this session.
    pub fn auth_header(&self, user_key: &str) -> String {
        auth_header_value(&self.api_key, user_key)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("api_key", &"<redacted>")
            .field("api_version", &self.api_version)
            .finish()
    }
}

/// `Pardot api_key=<api_key>, user_key=<user_key>`
pub fn auth_header_value(api_key: &str, user_key: &str) -> String {
    format!("{AUTH_SCHEME} api_key={api_key}, user_key={user_key}")
}
