//! End-to-end refresh cycles over the in-memory store.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use leaderboard::api::build_router;
use leaderboard::cache::Caches;
use leaderboard::engine::{ErrorPolicy, Refresher};
use leaderboard::types::{is_ranked, Rate};

use crate::memory_store::{MemoryStore, Step, WinnerRow};

fn default_rates() -> Vec<Rate> {
    vec![Rate::new("eth", 2000.0), Rate::new("bnb", 300.0)]
}

fn setup(store: MemoryStore, policy: ErrorPolicy) -> (Arc<MemoryStore>, Arc<Caches>, Refresher) {
    let store = Arc::new(store);
    let caches = Arc::new(Caches::new());
    let refresher = Refresher::new(store.clone(), Arc::clone(&caches), policy);
    (store, caches, refresher)
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[tokio::test]
async fn test_eth_profit_derived_from_current_rates() {
    let store = MemoryStore::new(default_rates(), vec![WinnerRow::new("0xabc", 1.5, 0.0)]);
    let (store, caches, refresher) = setup(store, ErrorPolicy::SkipCycle);

    tokio_test::assert_ok!(refresher.run_cycle().await);

    let leaders = caches.leaders.snapshot().await;
    assert_eq!(leaders.len(), 1);
    assert!(approx(leaders[0].profit_usd, 3000.0));
    assert!(approx(leaders[0].profit_eth, 1.5));
    assert_eq!(leaders[0].profit_bnb, 0.0);
    assert_eq!(store.calls(), [Step::ReadRates, Step::ApplyProfit, Step::ReadScores]);
}

#[tokio::test]
async fn test_bnb_statement_runs_last() {
    let store = MemoryStore::new(default_rates(), vec![WinnerRow::new("0xabc", 1.0, 2.0)]);
    let (_, caches, refresher) = setup(store, ErrorPolicy::SkipCycle);

    refresher.run_cycle().await.unwrap();

    // Both amounts positive: the bnb rewrite overwrites the eth one.
    let leaders = caches.leaders.snapshot().await;
    assert!(approx(leaders[0].profit_usd, 600.0));
}

#[tokio::test]
async fn test_missing_rate_clears_stale_profit() {
    let store = MemoryStore::new(
        default_rates(),
        vec![WinnerRow::new("0xabc", 0.0, 2.0), WinnerRow::new("0xdef", 1.0, 0.0)],
    );
    let (store, caches, refresher) = setup(store, ErrorPolicy::SkipCycle);

    refresher.run_cycle().await.unwrap();
    let leaders = caches.leaders.snapshot().await;
    let abc = leaders.iter().find(|s| s.address == "0xabc").unwrap();
    assert!(approx(abc.profit_usd, 600.0));

    // bnb drops out of the rates table before the next cycle.
    store.set_rates(vec![Rate::new("eth", 2000.0)]);
    refresher.run_cycle().await.unwrap();

    let rows = store.winners();
    assert_eq!(rows[0].profit_usd, None);
    assert_eq!(rows[1].profit_usd, Some(2000.0));

    let leaders = caches.leaders.snapshot().await;
    let order: Vec<_> = leaders.iter().map(|s| s.address.as_str()).collect();
    assert_eq!(order, ["0xdef", "0xabc"]);
    assert_eq!(leaders[1].profit_usd, 0.0);
    assert!(approx(leaders[0].profit_usd, 2000.0));
    assert_eq!(*caches.rates.snapshot().await, vec![Rate::new("eth", 2000.0)]);
}

#[tokio::test]
async fn test_new_rates_reprice_same_cycle() {
    let store = MemoryStore::new(default_rates(), vec![WinnerRow::new("0xabc", 1.5, 0.0)]);
    let (store, caches, refresher) = setup(store, ErrorPolicy::SkipCycle);

    refresher.run_cycle().await.unwrap();
    store.set_rates(vec![Rate::new("eth", 3000.0), Rate::new("bnb", 300.0)]);
    refresher.run_cycle().await.unwrap();

    let leaders = caches.leaders.snapshot().await;
    assert!(approx(leaders[0].profit_usd, 4500.0));
    assert_eq!(caches.rates.snapshot().await[0].price, 3000.0);
}

#[tokio::test]
async fn test_leaderboard_one_entry_per_address_in_rank_order() {
    let rows = vec![
        WinnerRow::new("0xa", 0.1, 0.0),
        WinnerRow::new("0xb", 0.0, 1.0),
        WinnerRow::new("0xa", 0.2, 0.0),
        WinnerRow::new("0xc", 5.0, 0.0),
        WinnerRow::new("0xb", 0.0, 0.5),
        WinnerRow::new("0xd", 0.0, 0.0),
        WinnerRow::new("0xb", 0.3, 0.0),
    ];
    let distinct: HashSet<_> = rows.iter().map(|r| r.address.clone()).collect();
    let (_, caches, refresher) = setup(MemoryStore::new(default_rates(), rows), ErrorPolicy::SkipCycle);

    refresher.run_cycle().await.unwrap();

    let leaders = caches.leaders.snapshot().await;
    assert_eq!(leaders.len(), distinct.len());
    assert!(is_ranked(&leaders));

    let order: Vec<_> = leaders.iter().map(|s| s.address.as_str()).collect();
    assert_eq!(order, ["0xb", "0xa", "0xc", "0xd"]);
    assert_eq!(leaders[0].rounds, 3);
    assert!(approx(leaders[0].profit_bnb, 1.5));
}

#[tokio::test]
async fn test_secondary_sums_rounded_to_cents() {
    let rows = vec![
        WinnerRow::new("0xa", 0.333, 0.0),
        WinnerRow::new("0xa", 0.333, 0.0),
    ];
    let (_, caches, refresher) = setup(MemoryStore::new(default_rates(), rows), ErrorPolicy::SkipCycle);

    refresher.run_cycle().await.unwrap();

    assert_eq!(caches.leaders.snapshot().await[0].profit_eth, 0.67);
}

#[tokio::test]
async fn test_cycle_is_idempotent() {
    let rows = vec![
        WinnerRow::new("0xa", 1.25, 0.0),
        WinnerRow::new("0xb", 0.0, 3.0),
        WinnerRow::new("0xa", 0.0, 0.75),
    ];
    let (_, caches, refresher) = setup(MemoryStore::new(default_rates(), rows), ErrorPolicy::SkipCycle);

    refresher.run_cycle().await.unwrap();
    let first_rates = serde_json::to_vec(&*caches.rates.snapshot().await).unwrap();
    let first_leaders = serde_json::to_vec(&*caches.leaders.snapshot().await).unwrap();

    refresher.run_cycle().await.unwrap();
    let second_rates = serde_json::to_vec(&*caches.rates.snapshot().await).unwrap();
    let second_leaders = serde_json::to_vec(&*caches.leaders.snapshot().await).unwrap();

    assert_eq!(first_rates, second_rates);
    assert_eq!(first_leaders, second_leaders);
}

#[tokio::test]
async fn test_failed_cycle_keeps_previous_snapshot() {
    let store = MemoryStore::new(default_rates(), vec![WinnerRow::new("0xabc", 1.5, 0.0)]);
    let (store, caches, refresher) = setup(store, ErrorPolicy::SkipCycle);

    refresher.run_cycle().await.unwrap();

    // New data lands in the store, then the cycle fails mid-way.
    store.set_rates(vec![Rate::new("eth", 1.0)]);
    store.push_winner(WinnerRow::new("0xnew", 9.0, 0.0));
    store.fail_on(Step::ReadScores);
    tokio_test::assert_err!(refresher.run_cycle().await);

    assert_eq!(*caches.rates.snapshot().await, default_rates());
    let leaders = caches.leaders.snapshot().await;
    assert_eq!(leaders.len(), 1);
    assert!(approx(leaders[0].profit_usd, 3000.0));

    let status = caches.status().await;
    assert_eq!(status.cycles_completed, 1);

    // Recovery publishes the new data.
    store.clear_failure();
    refresher.run_cycle().await.unwrap();
    assert_eq!(caches.leaders.snapshot().await.len(), 2);
}

#[tokio::test]
async fn test_fail_fast_loop_terminates() {
    let store = MemoryStore::new(default_rates(), Vec::new());
    store.fail_on(Step::ApplyProfit);
    let (store, caches, refresher) = setup(store, ErrorPolicy::Abort);

    let result = tokio::time::timeout(Duration::from_secs(5), refresher.run())
        .await
        .expect("fail-fast loop should stop");

    assert!(result.is_err());
    // Nothing published and the scores read never happened.
    assert!(caches.rates.snapshot().await.is_empty());
    assert_eq!(store.calls(), [Step::ReadRates, Step::ApplyProfit]);
}

#[tokio::test]
async fn test_api_serves_refreshed_snapshot() {
    let store = MemoryStore::new(default_rates(), vec![WinnerRow::new("0xabc", 1.5, 0.0)]);
    let (_, caches, refresher) = setup(store, ErrorPolicy::SkipCycle);
    let app = build_router(Arc::clone(&caches));

    let resp = app
        .clone()
        .oneshot(Request::builder().uri("/rates").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let body = axum::body::to_bytes(resp.into_body(), 10_000).await.unwrap();
    assert_eq!(&body[..], b"[]");

    refresher.run_cycle().await.unwrap();

    let resp = app
        .oneshot(Request::builder().uri("/leaders").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = axum::body::to_bytes(resp.into_body(), 10_000).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json[0]["address"], "0xabc");
    assert_eq!(json[0]["rounds"], 1);
    assert_eq!(json[0]["profit_usd"].as_f64(), Some(3000.0));
}
