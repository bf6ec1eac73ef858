//! `SessionManager` login handling

mod support;

use std::sync::Arc;
use std::time::Duration;

use pardot_core::{DailyQuota, RawResponse, SessionManager};
use pardot_domain::{Credentials, PardotError};
use serde_json::json;
use support::transport::{json_response, login_ok};
use support::{clock, today_key, MockQuotaStore, ScriptedTransport, ACCOUNT_ID, AUTH_URL};

fn manager(transport: &Arc<ScriptedTransport>, store: &Arc<MockQuotaStore>) -> SessionManager {
    let quota = Arc::new(DailyQuota::new(
        store.clone(),
        clock(),
        ACCOUNT_ID,
        None,
        Duration::from_secs(86_400),
    ));
    SessionManager::new(
        transport.clone(),
        quota,
        Credentials::new("etl@example.com", "secret", "user-key"),
        AUTH_URL,
    )
}

#[tokio::test]
async fn current_fails_before_first_login() {
    let transport = Arc::new(ScriptedTransport::new());
    let store = Arc::new(MockQuotaStore::new());
    let sessions = manager(&transport, &store);

    assert!(matches!(sessions.current(), Err(PardotError::Auth { code: None, .. })));
    assert!(sessions.auth_header().is_err());
}

#[tokio::test]
async fn login_replaces_the_session_wholesale() {
    let transport = Arc::new(ScriptedTransport::new());
    let store = Arc::new(MockQuotaStore::new());
    transport.push_login(Ok(login_ok("first", "4")));
    transport.push_login(Ok(json_response(200, json!({"api_key": "second"}))));
    let sessions = manager(&transport, &store);

    let first = sessions.login().await.unwrap();
    assert_eq!((first.api_key.as_str(), first.api_version.as_str()), ("first", "4"));

    let second = sessions.login().await.unwrap();
    assert_eq!(second.api_key, "second");
    // No version in the response falls back to 3, not to the previous one.
    assert_eq!(second.api_version, "3");
    assert_eq!(sessions.auth_header().unwrap(), "Pardot api_key=second, user_key=user-key");
    assert_eq!(store.count(&today_key()), 2);
}

#[tokio::test]
async fn numeric_version_is_accepted() {
    let transport = Arc::new(ScriptedTransport::new());
    let store = Arc::new(MockQuotaStore::new());
    transport.push_login(Ok(json_response(200, json!({"api_key": "k", "version": 4}))));

    let session = manager(&transport, &store).login().await.unwrap();
    assert_eq!(session.api_version, "4");
}

#[tokio::test]
async fn missing_api_key_is_an_auth_error() {
    let transport = Arc::new(ScriptedTransport::new());
    let store = Arc::new(MockQuotaStore::new());
    transport.push_login(Ok(json_response(200, json!({"version": "3"}))));

    let err = manager(&transport, &store).login().await.unwrap_err();
    assert!(matches!(err, PardotError::Auth { .. }));
    assert_eq!(store.count(&today_key()), 0);
}

#[tokio::test]
async fn failed_login_keeps_the_previous_session() {
    let transport = Arc::new(ScriptedTransport::new());
    let store = Arc::new(MockQuotaStore::new());
    transport.push_login(Ok(login_ok("good", "3")));
    transport.push_login(Ok(RawResponse::new(500, "down")));
    let sessions = manager(&transport, &store);

    sessions.login().await.unwrap();
    assert!(sessions.login().await.is_err());
    assert_eq!(sessions.current().unwrap().api_key, "good");
}

#[tokio::test]
async fn transport_failure_during_login_is_terminal_auth_error() {
    let transport = Arc::new(ScriptedTransport::new());
    let store = Arc::new(MockQuotaStore::new());
    transport.push_login(Err(PardotError::Network("timed out".into())));

    let err = manager(&transport, &store).login().await.unwrap_err();
    assert!(matches!(err, PardotError::Auth { .. }));
    assert!(!err.is_retryable());
}
