//! End-to-end client behaviour over HTTP against a mock Pardot server, with
//! the real SQLite quota store underneath.

mod support;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;
use pardot_core::QuotaStore;
use pardot_domain::{PardotError, QuotaExceededReason, QuotaKey};
use pardot_infra::connect_with_clock;
use serde_json::json;
use support::{clock, config, TestDatabase, ACCOUNT_ID};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LOGIN_PATH: &str = "/api/login/version/3";
const QUERY_PATH: &str = "/api/prospect/version/3/do/query";

fn key() -> QuotaKey {
    QuotaKey::new(ACCOUNT_ID, NaiveDate::from_ymd_opt(2024, 3, 7).unwrap())
}

fn embedded(code: i64, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "@attributes": {"stat": "fail", "version": 1, "err_code": code},
        "err": message,
    }))
}

async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(LOGIN_PATH))
        .and(query_param("format", "json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"api_key": "live-key", "version": 3})),
        )
        .mount(server)
        .await;
}

async fn stored_count(db: &TestDatabase) -> u64 {
    db.open(&clock()).get_count(&key()).await.unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn query_round_trip_counts_login_and_call() {
    let server = MockServer::start().await;
    let db = TestDatabase::new();
    mount_login(&server).await;
    Mock::given(method("GET"))
        .and(path(QUERY_PATH))
        .and(query_param("format", "json"))
        .and(query_param("created_after", "2024-01-01"))
        .and(header("user-agent", "pardot-infra-tests"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"result": {"total_results": 2}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = connect_with_clock(&config(&server.uri(), &db, None), Arc::new(clock()))
        .await
        .expect("client connects");
    let payload = client.get("prospect", &[("created_after", "2024-01-01")]).await.unwrap();

    assert_eq!(payload["result"]["total_results"], 2);
    assert_eq!(client.calls_made_today().await.unwrap(), 2);
    assert_eq!(stored_count(&db).await, 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn invalid_key_triggers_one_relogin_then_succeeds() {
    let server = MockServer::start().await;
    let db = TestDatabase::new();
    mount_login(&server).await;

    let attempts = Arc::new(AtomicUsize::new(0));
    let attempts_clone = attempts.clone();
    Mock::given(method("GET"))
        .and(path(QUERY_PATH))
        .respond_with(move |_req: &wiremock::Request| -> ResponseTemplate {
            if attempts_clone.fetch_add(1, Ordering::SeqCst) == 0 {
                embedded(1, "Invalid API key or user key")
            } else {
                ResponseTemplate::new(200).set_body_json(json!({"result": {"ok": true}}))
            }
        })
        .expect(2)
        .mount(&server)
        .await;

    let client = connect_with_clock(&config(&server.uri(), &db, None), Arc::new(clock()))
        .await
        .unwrap();
    let payload = client.get("prospect", &[]).await.unwrap();

    assert_eq!(payload["result"]["ok"], true);
    let logins = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path() == LOGIN_PATH)
        .count();
    assert_eq!(logins, 2);
    // Two logins and one successful call; the rejected call is free.
    assert_eq!(stored_count(&db).await, 3);
}

#[tokio::test(flavor = "multi_thread")]
async fn server_errors_are_retried_until_success() {
    let server = MockServer::start().await;
    let db = TestDatabase::new();
    mount_login(&server).await;

    let attempts = Arc::new(AtomicUsize::new(0));
    let attempts_clone = attempts.clone();
    Mock::given(method("GET"))
        .and(path(QUERY_PATH))
        .respond_with(move |_req: &wiremock::Request| -> ResponseTemplate {
            if attempts_clone.fetch_add(1, Ordering::SeqCst) < 2 {
                ResponseTemplate::new(503)
            } else {
                ResponseTemplate::new(200).set_body_json(json!({"result": {}}))
            }
        })
        .expect(3)
        .mount(&server)
        .await;

    let client = connect_with_clock(&config(&server.uri(), &db, None), Arc::new(clock()))
        .await
        .unwrap();
    client.get("prospect", &[]).await.expect("third attempt succeeds");

    assert_eq!(attempts.load(Ordering::SeqCst), 3);
    assert_eq!(stored_count(&db).await, 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn server_reported_daily_limit_is_terminal() {
    let server = MockServer::start().await;
    let db = TestDatabase::new();
    mount_login(&server).await;
    Mock::given(method("GET"))
        .and(path(QUERY_PATH))
        .respond_with(embedded(122, "Daily API rate limit met"))
        .expect(1)
        .mount(&server)
        .await;

    let client = connect_with_clock(&config(&server.uri(), &db, None), Arc::new(clock()))
        .await
        .unwrap();
    let err = client.get("prospect", &[]).await.unwrap_err();

    match err {
        PardotError::QuotaExceeded { reason: QuotaExceededReason::ServerReported { code, .. } } => {
            assert_eq!(code, 122);
        }
        other => panic!("expected server-reported quota error, got {other:?}"),
    }
    assert_eq!(stored_count(&db).await, 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn clients_sharing_a_database_share_the_budget() {
    let server = MockServer::start().await;
    let db = TestDatabase::new();
    mount_login(&server).await;
    Mock::given(method("GET"))
        .and(path(QUERY_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": {}})))
        .mount(&server)
        .await;

    let settings = config(&server.uri(), &db, Some(6));
    let first = connect_with_clock(&settings, Arc::new(clock())).await.unwrap();
    let second = connect_with_clock(&settings, Arc::new(clock())).await.unwrap();

    first.get("prospect", &[]).await.unwrap();
    second.get("prospect", &[]).await.unwrap();
    first.get("prospect", &[]).await.unwrap();
    second.get("prospect", &[]).await.unwrap();
    assert_eq!(stored_count(&db).await, 6);

    let sent_before = server.received_requests().await.unwrap().len();
    let err = first.get("prospect", &[]).await.unwrap_err();
    assert!(matches!(
        err,
        PardotError::QuotaExceeded { reason: QuotaExceededReason::DailyLimit { count: 6, limit: 6 } }
    ));
    assert_eq!(server.received_requests().await.unwrap().len(), sent_before);
}

#[tokio::test(flavor = "multi_thread")]
async fn construction_refused_when_budget_already_spent() {
    let server = MockServer::start().await;
    let db = TestDatabase::new();
    mount_login(&server).await;

    let store = db.open(&clock());
    for _ in 0..3 {
        store.increment(&key()).await.unwrap();
    }

    let err = connect_with_clock(&config(&server.uri(), &db, Some(3)), Arc::new(clock()))
        .await
        .unwrap_err();

    assert!(err.is_quota_exceeded());
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn rejected_login_fails_construction() {
    let server = MockServer::start().await;
    let db = TestDatabase::new();
    Mock::given(method("POST"))
        .and(path(LOGIN_PATH))
        .respond_with(embedded(15, "Invalid credentials"))
        .expect(1)
        .mount(&server)
        .await;

    let err = connect_with_clock(&config(&server.uri(), &db, None), Arc::new(clock()))
        .await
        .unwrap_err();

    assert!(matches!(err, PardotError::Auth { code: Some(15), .. }));
    assert_eq!(stored_count(&db).await, 0);
}
