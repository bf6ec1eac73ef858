//! SQLite quota store behaviour across pools sharing one database file.

mod support;

use std::sync::Arc;

use chrono::NaiveDate;
use pardot_core::QuotaStore;
use pardot_domain::QuotaKey;
use support::{clock, TestDatabase, ACCOUNT_ID, DAY};

fn key() -> QuotaKey {
    QuotaKey::new(ACCOUNT_ID, NaiveDate::from_ymd_opt(2024, 3, 7).unwrap())
}

#[tokio::test(flavor = "multi_thread")]
async fn counts_survive_reopening_the_database() {
    let db = TestDatabase::new();
    let clock = clock();

    {
        let store = db.open(&clock);
        store.init_if_absent(&key(), 30 * DAY).await.unwrap();
        for _ in 0..4 {
            store.increment(&key()).await.unwrap();
        }
    }

    let reopened = db.open(&clock);
    assert_eq!(reopened.get_count(&key()).await.unwrap(), 4);
    assert!(!reopened.init_if_absent(&key(), 30 * DAY).await.unwrap());
}

#[tokio::test(flavor = "multi_thread")]
async fn separate_pools_see_each_others_writes() {
    let db = TestDatabase::new();
    let clock = clock();
    let first = db.open(&clock);
    let second = db.open(&clock);

    first.increment(&key()).await.unwrap();
    assert_eq!(second.increment(&key()).await.unwrap(), 2);
    assert_eq!(first.get_count(&key()).await.unwrap(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_increments_from_several_pools_lose_nothing() {
    let db = TestDatabase::new();
    let clock = clock();
    let stores: Vec<_> = (0..3).map(|_| Arc::new(db.open(&clock))).collect();

    let mut handles = Vec::new();
    for store in &stores {
        for _ in 0..20 {
            let store = Arc::clone(store);
            handles.push(tokio::spawn(async move { store.increment(&key()).await }));
        }
    }

    let mut seen = Vec::new();
    for handle in handles {
        seen.push(handle.await.unwrap().unwrap());
    }
    seen.sort_unstable();

    assert_eq!(seen, (1..=60).collect::<Vec<u64>>());
    assert_eq!(stores[0].get_count(&key()).await.unwrap(), 60);
}

#[tokio::test(flavor = "multi_thread")]
async fn next_day_uses_a_fresh_counter() {
    let db = TestDatabase::new();
    let clock = clock();
    let store = db.open(&clock);
    let tomorrow = QuotaKey::new(ACCOUNT_ID, NaiveDate::from_ymd_opt(2024, 3, 8).unwrap());

    store.increment(&key()).await.unwrap();
    store.increment(&key()).await.unwrap();

    assert_eq!(store.get_count(&tomorrow).await.unwrap(), 0);
    assert!(store.init_if_absent(&tomorrow, 30 * DAY).await.unwrap());
    assert_eq!(store.get_count(&key()).await.unwrap(), 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn counters_expire_after_their_ttl() {
    let db = TestDatabase::new();
    let clock = clock();
    let store = db.open(&clock);

    store.init_if_absent(&key(), 30 * DAY).await.unwrap();
    store.increment(&key()).await.unwrap();

    clock.advance(29 * DAY);
    assert_eq!(store.get_count(&key()).await.unwrap(), 1);

    clock.advance(DAY);
    assert_eq!(store.get_count(&key()).await.unwrap(), 0);
    assert_eq!(store.purge_expired().await.unwrap(), 1);
}
