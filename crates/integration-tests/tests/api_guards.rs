#![allow(clippy::unwrap_used)]

//! Router-level tests that never reach the database.
//!
//! The app runs over a lazily connected pool pointing at a closed port, so
//! every assertion here is about behaviour decided before a query runs.

use axum::body::{Body, to_bytes};
use axum::http::{StatusCode, header};
use serde_json::json;

use uephone_integration_tests::{
    admin_request, body_json, expect_status, json_request, offline_app, request, send,
};

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health_is_ok() {
    let app = offline_app();
    let response = send(&app, request("GET", "/health").body(Body::empty()).unwrap()).await;

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"ok");
}

#[tokio::test]
async fn test_readiness_reports_unreachable_database() {
    let app = offline_app();
    let response = send(
        &app,
        request("GET", "/health/ready").body(Body::empty()).unwrap(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let app = offline_app();
    let response = send(
        &app,
        request("GET", "/api/nothing-here").body(Body::empty()).unwrap(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ============================================================================
// Middleware
// ============================================================================

#[tokio::test]
async fn test_responses_carry_security_headers_and_request_id() {
    let app = offline_app();
    let response = send(
        &app,
        request("GET", "/health")
            .header("x-request-id", "edge-123")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    let headers = response.headers();
    assert_eq!(headers["x-request-id"], "edge-123");
    assert_eq!(headers["x-frame-options"], "DENY");
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers[header::CACHE_CONTROL], "no-store");
}

#[tokio::test]
async fn test_cors_preflight_allows_configured_origin() {
    let app = offline_app();
    let response = send(
        &app,
        request("OPTIONS", "/api/stock")
            .header(header::ORIGIN, "http://localhost:5173")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    let headers = response.headers();
    assert_eq!(
        headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://localhost:5173"
    );
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
}

#[tokio::test]
async fn test_cors_ignores_unknown_origin() {
    let app = offline_app();
    let response = send(
        &app,
        request("OPTIONS", "/api/stock")
            .header(header::ORIGIN, "https://evil.example")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none()
    );
}

// ============================================================================
// Customer session guard
// ============================================================================

#[tokio::test]
async fn test_customer_routes_require_session() {
    let app = offline_app();

    let cases = [
        ("GET", "/api/cart", None),
        ("DELETE", "/api/cart", None),
        (
            "POST",
            "/api/cart/items",
            Some(json!({ "stock_item_id": 1, "quantity": 5 })),
        ),
        ("GET", "/api/offers", None),
        (
            "POST",
            "/api/offers",
            Some(json!({ "stock_item_id": 1, "quantity": 5, "price": "90.00" })),
        ),
        ("POST", "/api/offers/1/cancel", None),
        ("GET", "/api/orders", None),
        ("POST", "/api/orders", None),
        (
            "POST",
            "/api/payments",
            Some(json!({ "order_id": 1, "payment_method": "usdt" })),
        ),
        ("GET", "/api/auth/me", None),
    ];

    for (method, uri, body) in cases {
        let req = match body {
            Some(body) => json_request(method, uri, &body),
            None => request(method, uri).body(Body::empty()).unwrap(),
        };
        let body = expect_status(send(&app, req).await, StatusCode::UNAUTHORIZED).await;
        assert_eq!(
            body,
            json!({ "error": "Authentication required" }),
            "{method} {uri}"
        );
    }
}

#[tokio::test]
async fn test_order_detail_requires_owner_or_admin() {
    let app = offline_app();
    let response = send(
        &app,
        request("GET", "/api/orders/1").body(Body::empty()).unwrap(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_without_session_is_no_content() {
    let app = offline_app();
    let response = send(
        &app,
        request("POST", "/api/auth/logout").body(Body::empty()).unwrap(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

// ============================================================================
// Admin token guard
// ============================================================================

#[tokio::test]
async fn test_admin_routes_require_token() {
    let app = offline_app();

    for (method, uri) in [
        ("GET", "/api/admin/dashboard"),
        ("GET", "/api/admin/offers"),
        ("POST", "/api/admin/offers/1/accept"),
        ("POST", "/api/admin/offers/1/reject"),
        ("GET", "/api/chat/admin/messages"),
        ("GET", "/api/orders/by-user/1"),
        ("DELETE", "/api/stock/1"),
    ] {
        let response = send(&app, request(method, uri).body(Body::empty()).unwrap()).await;
        let body = expect_status(response, StatusCode::UNAUTHORIZED).await;
        assert_eq!(body, json!({ "error": "Admin token required" }), "{method} {uri}");
    }
}

#[tokio::test]
async fn test_admin_routes_reject_wrong_token() {
    let app = offline_app();
    let response = send(
        &app,
        request("GET", "/api/admin/dashboard")
            .header(header::AUTHORIZATION, "Bearer not-the-admin-token")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    let body = expect_status(response, StatusCode::FORBIDDEN).await;
    assert_eq!(body, json!({ "error": "Invalid admin token" }));
}

#[tokio::test]
async fn test_settings_update_requires_token() {
    let app = offline_app();
    let response = send(
        &app,
        json_request("PUT", "/api/settings", &json!({ "email": "ops@uephone.example" })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Input validation
// ============================================================================

#[tokio::test]
async fn test_stock_create_rejects_non_positive_price() {
    let app = offline_app();
    let response = send(
        &app,
        admin_request(
            "POST",
            "/api/stock",
            Some(&json!({
                "name": "iPhone 12 64GB",
                "price": "0",
                "quantity": 10,
                "grade": "A",
                "location": "Hong Kong"
            })),
        ),
    )
    .await;

    let body = expect_status(response, StatusCode::BAD_REQUEST).await;
    assert!(body["error"].as_str().unwrap().contains("price"));
}

#[tokio::test]
async fn test_stock_import_rejects_negative_quantity() {
    let app = offline_app();
    let response = send(
        &app,
        admin_request(
            "POST",
            "/api/import-stock",
            Some(&json!([{
                "id": 3,
                "name": "Galaxy S21",
                "price": "180.00",
                "quantity": -1,
                "grade": "B",
                "location": "Dubai"
            }])),
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_stock_list_rejects_unknown_currency() {
    let app = offline_app();
    let response = send(
        &app,
        request("GET", "/api/stock?currency=GBP")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    let body = expect_status(response, StatusCode::BAD_REQUEST).await;
    assert_eq!(body, json!({ "error": "Unsupported currency: GBP" }));
}

#[tokio::test]
async fn test_register_rejects_short_password() {
    let app = offline_app();
    let response = send(
        &app,
        json_request(
            "POST",
            "/api/auth/register",
            &json!({
                "email": "buyer@wholesale.example",
                "password": "short",
                "first_name": "Ana",
                "last_name": "Ruiz"
            }),
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_register_rejects_invalid_email() {
    let app = offline_app();
    let response = send(
        &app,
        json_request(
            "POST",
            "/api/auth/register",
            &json!({
                "email": "not-an-email",
                "password": "long-enough-password",
                "first_name": "Ana",
                "last_name": "Ruiz"
            }),
        ),
    )
    .await;

    let body = expect_status(response, StatusCode::BAD_REQUEST).await;
    assert_eq!(body, json!({ "error": "Invalid email address" }));
}

#[tokio::test]
async fn test_chat_rejects_empty_message() {
    let app = offline_app();
    let response = send(
        &app,
        json_request(
            "POST",
            "/api/chat/messages",
            &json!({
                "conversation_id": "conv-1",
                "user_id": "guest-1",
                "message": "   "
            }),
        ),
    )
    .await;

    let body = expect_status(response, StatusCode::BAD_REQUEST).await;
    assert_eq!(body, json!({ "error": "Message must not be empty" }));
}

#[tokio::test]
async fn test_chat_history_rejects_blank_conversation() {
    let app = offline_app();
    let response = send(
        &app,
        request("GET", "/api/chat/messages/%20%20")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    let body = expect_status(response, StatusCode::BAD_REQUEST).await;
    assert_eq!(body, json!({ "error": "conversation_id is required" }));
}

#[tokio::test]
async fn test_contact_validates_then_accepts() {
    let app = offline_app();

    let response = send(
        &app,
        json_request(
            "POST",
            "/api/contact",
            &json!({ "name": "Ana", "email": "nope", "message": "Hi" }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(
        &app,
        json_request(
            "POST",
            "/api/contact",
            &json!({
                "name": "Ana Ruiz",
                "email": "ana@wholesale.example",
                "subject": "Bulk pricing",
                "message": "Do you ship 200 units to Lima?"
            }),
        ),
    )
    .await;
    let body = expect_status(response, StatusCode::OK).await;
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn test_contact_rate_limit_returns_json_error() {
    let app = offline_app();
    let contact = json!({
        "name": "Ana Ruiz",
        "email": "ana@wholesale.example",
        "message": "Do you ship 200 units to Lima?"
    });

    // Burst of five per client address
    for _ in 0..5 {
        let response = send(&app, json_request("POST", "/api/contact", &contact)).await;
        expect_status(response, StatusCode::OK).await;
    }

    let response = send(&app, json_request("POST", "/api/contact", &contact)).await;
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/json"
    );
    let body = expect_status(response, StatusCode::TOO_MANY_REQUESTS).await;
    assert_eq!(body, json!({ "error": "Too many requests" }));
}

// ============================================================================
// Static catalogues
// ============================================================================

#[tokio::test]
async fn test_payment_methods_list() {
    let app = offline_app();
    let response = send(
        &app,
        request("GET", "/api/payments/methods")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    let body = body_json(response).await;
    let methods = body.as_array().unwrap();
    assert_eq!(methods.len(), 11);
    assert_eq!(methods[0]["id"], "bank_transfer");
    assert_eq!(methods[0]["group"], "bank");
    assert!(methods.iter().any(|m| m["id"] == "usdt" && m["group"] == "crypto"));
}
