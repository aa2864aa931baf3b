#![allow(clippy::unwrap_used)]

//! Restart recovery and expiry sweeps against a migrated `PostgreSQL`
//! database.
//!
//! Recovery and sweeps act on every pending offer in the database, so these
//! tests run in their own binary.
//!
//! Run with: cargo test -p uephone-integration-tests --test offer_recovery -- --ignored

use std::time::Duration;

use axum::Router;
use axum::http::StatusCode;
use serde_json::json;
use sqlx::PgPool;

use uephone_core::{OfferId, OfferStatus, ResolvedBy};
use uephone_integration_tests::{Customer, create_item, database_app_with};
use uephone_storefront::config::OfferConfig;

async fn submit(app: &Router, customer: &Customer, price: &str) -> OfferId {
    let item_id = create_item(app, "200.00", 30).await;
    let offer = customer
        .call(
            app,
            "POST",
            "/api/offers",
            Some(&json!({ "stock_item_id": item_id, "quantity": 5, "price": price })),
            StatusCode::CREATED,
        )
        .await;
    OfferId::new(i32::try_from(offer["id"].as_i64().unwrap()).unwrap())
}

async fn backdate(pool: &PgPool, id: OfferId, hours: i32) {
    sqlx::query("UPDATE shop.offer SET created_at = NOW() - make_interval(hours => $2) WHERE id = $1")
        .bind(id)
        .bind(hours)
        .execute(pool)
        .await
        .unwrap();
}

async fn offer_json(app: &Router, customer: &Customer, id: OfferId) -> serde_json::Value {
    customer
        .call(app, "GET", &format!("/api/offers/{id}"), None, StatusCode::OK)
        .await
}

#[tokio::test]
#[ignore = "Requires a migrated PostgreSQL database"]
async fn test_recover_rearms_timers_with_remaining_delay() {
    let offers = OfferConfig {
        auto_accept_after: Duration::from_secs(3),
        ..OfferConfig::default()
    };
    let (app, before) = database_app_with(offers).await;
    let customer = Customer::register(&app).await;
    let id = submit(&app, &customer, "180.00").await;

    // The process stops before the timer fires
    assert!(before.offer_scheduler().cancel(id));
    tokio::time::sleep(Duration::from_secs(2)).await;

    let (_app, after) = database_app_with(offers).await;
    let report = after
        .offer_resolver()
        .recover(after.offer_scheduler())
        .await
        .unwrap();
    assert!(report.rescheduled >= 1);
    assert!(after.offer_scheduler().is_scheduled(id));

    // About one second was left, not the full delay
    tokio::time::sleep(Duration::from_millis(1800)).await;
    let offer = offer_json(&app, &customer, id).await;
    assert_eq!(offer["status"], "accepted");
    assert_eq!(offer["decided_by"], "auto");
}

#[tokio::test]
#[ignore = "Requires a migrated PostgreSQL database"]
async fn test_offers_past_ttl_expire() {
    let (app, state) = database_app_with(OfferConfig::default()).await;
    let customer = Customer::register(&app).await;

    let swept = submit(&app, &customer, "180.00").await;
    state.offer_scheduler().cancel(swept);
    backdate(state.pool(), swept, 48).await;

    state.offer_resolver().sweep().await.unwrap();
    let offer = offer_json(&app, &customer, swept).await;
    assert_eq!(offer["status"], "expired");
    assert_eq!(offer["decided_by"], "expiry");

    // A timer that fires on a stale offer expires it instead of deciding it
    let timed = submit(&app, &customer, "180.00").await;
    state.offer_scheduler().cancel(timed);
    backdate(state.pool(), timed, 25).await;

    let resolved = state
        .offer_resolver()
        .auto_resolve(timed)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(resolved.status, OfferStatus::Expired);
    assert_eq!(resolved.decided_by, Some(ResolvedBy::Expiry));

    let cart = customer
        .call(&app, "GET", "/api/cart", None, StatusCode::OK)
        .await;
    assert!(cart["lines"].as_array().unwrap().is_empty());
}
