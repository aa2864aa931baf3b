#![allow(clippy::unwrap_used)]

//! Catalogue re-import against a migrated `PostgreSQL` database.
//!
//! An import retires every phone it does not list, so this test runs in its
//! own binary.
//!
//! Run with: cargo test -p uephone-integration-tests --test catalogue_import -- --ignored

use axum::Router;
use axum::body::Body;
use axum::http::StatusCode;
use serde_json::json;

use uephone_integration_tests::{
    Customer, admin_request, create_item, database_app, expect_status, request, send,
};

async fn accepted_offer(app: &Router, customer: &Customer, item_id: i64, price: &str) -> i64 {
    let offer = customer
        .call(
            app,
            "POST",
            "/api/offers",
            Some(&json!({ "stock_item_id": item_id, "quantity": 5, "price": price })),
            StatusCode::CREATED,
        )
        .await;
    let id = offer["id"].as_i64().unwrap();
    let response = send(
        app,
        admin_request("POST", &format!("/api/admin/offers/{id}/accept"), None),
    )
    .await;
    expect_status(response, StatusCode::OK).await;
    id
}

#[tokio::test]
#[ignore = "Requires a migrated PostgreSQL database"]
async fn test_reimport_keeps_carts_and_offer_history() {
    let (app, _pool) = database_app().await;
    let kept = create_item(&app, "200.00", 30).await;
    let dropped = create_item(&app, "120.00", 30).await;
    let customer = Customer::register(&app).await;

    customer
        .call(
            &app,
            "POST",
            "/api/cart/items",
            Some(&json!({ "stock_item_id": kept, "quantity": 5 })),
            StatusCode::CREATED,
        )
        .await;
    let kept_offer = accepted_offer(&app, &customer, kept, "180.00").await;
    let dropped_offer = accepted_offer(&app, &customer, dropped, "100.00").await;

    let imported = expect_status(
        send(
            &app,
            admin_request(
                "POST",
                "/api/import-stock",
                Some(&json!([{
                    "id": kept,
                    "name": "iPhone 13 128GB",
                    "price": "190.00",
                    "quantity": 40,
                    "grade": "A",
                    "location": "Hong Kong"
                }])),
            ),
        )
        .await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(imported["count"], 1);
    assert!(imported["retired"].as_u64().unwrap() >= 1);

    let item = expect_status(
        send(
            &app,
            request("GET", &format!("/api/stock/{kept}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(item["quantity"], 40);

    // Both lines on the listed phone survive; the dropped phone's line is gone
    let cart = customer
        .call(&app, "GET", "/api/cart", None, StatusCode::OK)
        .await;
    let lines = cart["lines"].as_array().unwrap();
    assert_eq!(lines.len(), 2);
    assert!(lines.iter().all(|line| line["stock_item_id"] == kept));
    assert!(lines.iter().any(|line| line["offer_id"] == kept_offer));

    let offer = customer
        .call(&app, "GET", &format!("/api/offers/{kept_offer}"), None, StatusCode::OK)
        .await;
    assert_eq!(offer["stock_item_id"], kept);
    assert_eq!(offer["status"], "accepted");

    let offer = customer
        .call(&app, "GET", &format!("/api/offers/{dropped_offer}"), None, StatusCode::OK)
        .await;
    assert!(offer["stock_item_id"].is_null());
    assert_eq!(offer["status"], "accepted");
    assert_eq!(offer["product_name"], "iPhone 13 128GB");
}
