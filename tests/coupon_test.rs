//! Coupon grants, quoting, and consumption inside checkout.

mod common;

use axum::http::{Method, StatusCode};
use chrono::{Duration, Utc};
use common::{decimal_field, response_json, TestApp};
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use uuid::Uuid;

async fn create_coupon(app: &TestApp, admin: &str, body: Value) -> Uuid {
    let response = app
        .request(Method::POST, "/api/v1/admin/coupons", Some(admin), Some(body))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_json(response).await;
    Uuid::parse_str(body["data"]["id"].as_str().unwrap()).unwrap()
}

async fn grant(app: &TestApp, admin: &str, coupon_id: Uuid, user_id: Uuid) {
    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/admin/coupons/{coupon_id}/grant"),
            Some(admin),
            Some(json!({"user_id": user_id})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

fn percentage_coupon(code: &str) -> Value {
    json!({
        "code": code,
        "discount_type": "percentage",
        "discount_value": "10",
        "max_discount_amount": "15.00",
        "min_order_value": "50.00",
        "usage_limit_per_user": 1,
        "starts_at": Utc::now() - Duration::hours(1),
        "expires_at": Utc::now() + Duration::days(7),
    })
}

#[tokio::test]
async fn quote_is_a_pure_read() {
    let app = TestApp::new().await;
    let admin = app.admin_token();
    let (user_id, token) = app.register_and_login("quote@test.com", "password123").await;
    let coupon_id = create_coupon(&app, &admin, percentage_coupon("SAVE10")).await;
    grant(&app, &admin, coupon_id, user_id).await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/coupons/quote",
            Some(&token),
            Some(json!({"code": "SAVE10", "subtotal": "100.00"})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(decimal_field(&body["data"]["discount_amount"]), dec!(10.00));
    assert_eq!(decimal_field(&body["data"]["final_amount"]), dec!(90.00));

    // Quoting twice works: nothing was consumed.
    let response = app
        .request(
            Method::POST,
            "/api/v1/coupons/quote",
            Some(&token),
            Some(json!({"code": "SAVE10", "subtotal": "100.00"})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    // Below the minimum order value the quote fails.
    let response = app
        .request(
            Method::POST,
            "/api/v1/coupons/quote",
            Some(&token),
            Some(json!({"code": "SAVE10", "subtotal": "30.00"})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn quote_requires_a_grant() {
    let app = TestApp::new().await;
    let admin = app.admin_token();
    let (_, token) = app.register_and_login("nogrant@test.com", "password123").await;
    create_coupon(&app, &admin, percentage_coupon("UNGRANTED")).await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/coupons/quote",
            Some(&token),
            Some(json!({"code": "UNGRANTED", "subtotal": "100.00"})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn checkout_consumes_the_grant_exactly_once() {
    let app = TestApp::new().await;
    let admin = app.admin_token();
    let (user_id, token) = app.register_and_login("redeem@test.com", "password123").await;
    let coupon_id = create_coupon(&app, &admin, percentage_coupon("REDEEM10")).await;
    grant(&app, &admin, coupon_id, user_id).await;

    let seeded = app.seed_sku("Leather Belt", dec!(60.00), 10).await;
    let address_id = app.seed_address(&token).await;

    app.request(
        Method::POST,
        "/api/v1/cart/items",
        Some(&token),
        Some(json!({"size_stock_id": seeded.size_stock.id, "quantity": 1})),
    )
    .await;
    let response = app
        .request(
            Method::POST,
            "/api/v1/checkout",
            Some(&token),
            Some(json!({
                "address_id": address_id,
                "payment_method": "card",
                "coupon_code": "REDEEM10",
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_json(response).await;
    assert_eq!(decimal_field(&body["data"]["discount_total"]), dec!(6.00));
    assert_eq!(decimal_field(&body["data"]["total"]), dec!(54.00));
    assert_eq!(body["data"]["coupon_code"], "REDEEM10");

    // usage_limit_per_user = 1, so the grant is now used up.
    let response = app
        .request(Method::GET, "/api/v1/coupons/mine", Some(&token), None)
        .await;
    let body = response_json(response).await;
    let mine = body["data"].as_array().unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0]["status"], "used");
    assert_eq!(mine[0]["usage_left"], 0);

    // Further quotes fail.
    let response = app
        .request(
            Method::POST,
            "/api/v1/coupons/quote",
            Some(&token),
            Some(json!({"code": "REDEEM10", "subtotal": "100.00"})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn percentage_discount_is_capped() {
    let app = TestApp::new().await;
    let admin = app.admin_token();
    let (user_id, token) = app.register_and_login("capped@test.com", "password123").await;
    let coupon_id = create_coupon(&app, &admin, percentage_coupon("CAP15")).await;
    grant(&app, &admin, coupon_id, user_id).await;

    // 10% of 400 would be 40, but the cap is 15.
    let response = app
        .request(
            Method::POST,
            "/api/v1/coupons/quote",
            Some(&token),
            Some(json!({"code": "CAP15", "subtotal": "400.00"})),
        )
        .await;
    let body = response_json(response).await;
    assert_eq!(decimal_field(&body["data"]["discount_amount"]), dec!(15.00));
}

#[tokio::test]
async fn duplicate_grant_is_rejected() {
    let app = TestApp::new().await;
    let admin = app.admin_token();
    let (user_id, _) = app.register_and_login("twice@test.com", "password123").await;
    let coupon_id = create_coupon(&app, &admin, percentage_coupon("ONCE")).await;
    grant(&app, &admin, coupon_id, user_id).await;

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/admin/coupons/{coupon_id}/grant"),
            Some(&admin),
            Some(json!({"user_id": user_id})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}
