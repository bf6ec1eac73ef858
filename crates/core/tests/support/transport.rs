//! Scripted `ApiTransport` mock
//!
//! Login requests and data requests are answered from two separate queues.
//! An empty login queue answers with a fresh api key; an empty data queue is
//! a test bug and fails loudly through an `Internal` error.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use pardot_core::{ApiRequest, ApiTransport, RawResponse};
use pardot_domain::{PardotError, Result as DomainResult};
use parking_lot::Mutex;
use serde_json::{json, Value};

use super::AUTH_URL;

#[derive(Default)]
pub struct ScriptedTransport {
    logins: Mutex<VecDeque<DomainResult<RawResponse>>>,
    responses: Mutex<VecDeque<DomainResult<RawResponse>>>,
    requests: Mutex<Vec<ApiRequest>>,
    issued_keys: AtomicU32,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_login(&self, response: DomainResult<RawResponse>) {
        self.logins.lock().push_back(response);
    }

    pub fn push(&self, response: DomainResult<RawResponse>) {
        self.responses.lock().push_back(response);
    }

    pub fn push_many(&self, responses: impl IntoIterator<Item = DomainResult<RawResponse>>) {
        self.responses.lock().extend(responses);
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().clone()
    }

    pub fn login_requests(&self) -> Vec<ApiRequest> {
        self.requests().into_iter().filter(|r| r.url == AUTH_URL).collect()
    }

    pub fn data_requests(&self) -> Vec<ApiRequest> {
        self.requests().into_iter().filter(|r| r.url != AUTH_URL).collect()
    }
}

#[async_trait]
impl ApiTransport for ScriptedTransport {
    async fn send(&self, request: ApiRequest) -> DomainResult<RawResponse> {
        let is_login = request.url == AUTH_URL;
        self.requests.lock().push(request);

        if is_login {
            let scripted = self.logins.lock().pop_front();
            return scripted.unwrap_or_else(|| {
                let n = self.issued_keys.fetch_add(1, Ordering::SeqCst) + 1;
                Ok(login_ok(&format!("api-key-{n}"), "3"))
            });
        }

        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(PardotError::Internal("no scripted response left".into())))
    }
}

pub fn json_response(status: u16, value: Value) -> RawResponse {
    RawResponse::new(status, value.to_string())
}

pub fn login_ok(api_key: &str, version: &str) -> RawResponse {
    json_response(200, json!({"api_key": api_key, "version": version}))
}

pub fn success(value: Value) -> DomainResult<RawResponse> {
    Ok(json_response(200, value))
}

/// HTTP 200 carrying an embedded error.
pub fn embedded(code: i64, message: &str) -> DomainResult<RawResponse> {
    Ok(json_response(
        200,
        json!({"@attributes": {"stat": "fail", "version": 1, "err_code": code}, "err": message}),
    ))
}

pub fn status(code: u16) -> DomainResult<RawResponse> {
    Ok(RawResponse::new(code, "<html>error</html>"))
}
