#![allow(clippy::unwrap_used)]

//! Offer resolution races against a migrated `PostgreSQL` database.
//!
//! Timers, admins and customers all try to resolve the same offers here;
//! exactly one of them may win.
//!
//! Run with: cargo test -p uephone-integration-tests --test offer_flow -- --ignored

use std::time::Duration;

use axum::Router;
use axum::http::StatusCode;
use serde_json::json;

use uephone_core::OfferId;
use uephone_integration_tests::{
    Customer, admin_request, create_item, database_app_with, expect_status, send,
};
use uephone_storefront::config::OfferConfig;

async fn submit(app: &Router, customer: &Customer, item_id: i64, price: &str) -> i64 {
    let offer = customer
        .call(
            app,
            "POST",
            "/api/offers",
            Some(&json!({ "stock_item_id": item_id, "quantity": 5, "price": price })),
            StatusCode::CREATED,
        )
        .await;
    assert_eq!(offer["status"], "pending");
    offer["id"].as_i64().unwrap()
}

async fn admin_decide(app: &Router, offer_id: i64, decision: &str, status: StatusCode) {
    let response = send(
        app,
        admin_request("POST", &format!("/api/admin/offers/{offer_id}/{decision}"), None),
    )
    .await;
    expect_status(response, status).await;
}

fn offer_id(id: i64) -> OfferId {
    OfferId::new(i32::try_from(id).unwrap())
}

#[tokio::test]
#[ignore = "Requires a migrated PostgreSQL database"]
async fn test_admin_accept_after_timer_is_conflict() {
    let (app, _state) = database_app_with(OfferConfig {
        auto_accept_after: Duration::from_millis(200),
        ..OfferConfig::default()
    })
    .await;
    let item_id = create_item(&app, "200.00", 30).await;
    let customer = Customer::register(&app).await;

    // 90% of list clears the auto-accept floor
    let id = submit(&app, &customer, item_id, "180.00").await;
    tokio::time::sleep(Duration::from_secs(1)).await;

    let offer = customer
        .call(&app, "GET", &format!("/api/offers/{id}"), None, StatusCode::OK)
        .await;
    assert_eq!(offer["status"], "accepted");
    assert_eq!(offer["decided_by"], "auto");

    admin_decide(&app, id, "accept", StatusCode::CONFLICT).await;

    // Accepted once, so the cart holds the offered units once
    let cart = customer
        .call(&app, "GET", "/api/cart", None, StatusCode::OK)
        .await;
    let lines = cart["lines"].as_array().unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["quantity"], 5);
}

#[tokio::test]
#[ignore = "Requires a migrated PostgreSQL database"]
async fn test_timer_after_admin_changes_nothing() {
    let (app, state) = database_app_with(OfferConfig::default()).await;
    let item_id = create_item(&app, "200.00", 30).await;
    let customer = Customer::register(&app).await;

    // Half of list, which the timer would reject
    let id = submit(&app, &customer, item_id, "100.00").await;
    assert!(state.offer_scheduler().is_scheduled(offer_id(id)));

    admin_decide(&app, id, "accept", StatusCode::OK).await;
    assert!(!state.offer_scheduler().is_scheduled(offer_id(id)));

    // A timer that fires anyway finds nothing to do
    let fired = state
        .offer_resolver()
        .auto_resolve(offer_id(id))
        .await
        .unwrap();
    assert!(fired.is_none());

    let offer = customer
        .call(&app, "GET", &format!("/api/offers/{id}"), None, StatusCode::OK)
        .await;
    assert_eq!(offer["status"], "accepted");
    assert_eq!(offer["decided_by"], "admin");
}

#[tokio::test]
#[ignore = "Requires a migrated PostgreSQL database"]
async fn test_customer_cancel_of_resolved_offer_is_conflict() {
    let (app, state) = database_app_with(OfferConfig::default()).await;
    let item_id = create_item(&app, "200.00", 30).await;
    let customer = Customer::register(&app).await;

    let rejected = submit(&app, &customer, item_id, "150.00").await;
    admin_decide(&app, rejected, "reject", StatusCode::OK).await;
    let body = customer
        .call(
            &app,
            "POST",
            &format!("/api/offers/{rejected}/cancel"),
            None,
            StatusCode::CONFLICT,
        )
        .await;
    assert_eq!(body["error"], "Offer is no longer pending");

    let pending = submit(&app, &customer, item_id, "150.00").await;
    let withdrawn = customer
        .call(
            &app,
            "POST",
            &format!("/api/offers/{pending}/cancel"),
            None,
            StatusCode::OK,
        )
        .await;
    assert_eq!(withdrawn["status"], "rejected");
    assert_eq!(withdrawn["decided_by"], "customer");
    assert!(!state.offer_scheduler().is_scheduled(offer_id(pending)));

    // Someone else's offer is invisible
    let stranger = Customer::register(&app).await;
    stranger
        .call(
            &app,
            "POST",
            &format!("/api/offers/{rejected}/cancel"),
            None,
            StatusCode::NOT_FOUND,
        )
        .await;
}
