//! Favorites, addresses, notifications and the review pipeline.

mod common;

use axum::http::{Method, StatusCode};
use common::{decimal_field, response_json, TestApp};
use rust_decimal_macros::dec;
use serde_json::json;

fn address_body(recipient: &str, is_default: bool) -> serde_json::Value {
    json!({
        "recipient": recipient,
        "phone": "555-0100",
        "line1": "1 Main St",
        "city": "Springfield",
        "region": "IL",
        "postal_code": "62704",
        "country": "us",
        "is_default": is_default,
    })
}

#[tokio::test]
async fn favorites_are_idempotent() {
    let app = TestApp::new().await;
    let (_, token) = app.register_and_login("fav@test.com", "password-123").await;
    let sku = app.seed_sku("Canvas Tote", dec!(25.00), 3).await;

    let uri = format!("/api/v1/favorites/{}", sku.product.id);
    let response = app
        .request(Method::POST, &uri, Some(&token), None)
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let first = response_json(response).await;

    // Adding again returns the same row instead of erroring.
    let response = app
        .request(Method::POST, &uri, Some(&token), None)
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let second = response_json(response).await;
    assert_eq!(first["data"]["id"], second["data"]["id"]);

    let response = app
        .request(Method::GET, "/api/v1/favorites", Some(&token), None)
        .await;
    let body = response_json(response).await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["product"]["name"], "Canvas Tote");

    let response = app
        .request(Method::DELETE, &uri, Some(&token), None)
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .request(Method::DELETE, &uri, Some(&token), None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn removing_a_color_retires_its_stock() {
    let app = TestApp::new().await;
    let (_, token) = app
        .register_and_login("shopper@test.com", "password-123")
        .await;
    let admin = app.admin_token();
    let sku = app.seed_sku("Rain Jacket", dec!(80.00), 5).await;

    let response = app
        .request(
            Method::DELETE,
            &format!("/api/v1/admin/colors/{}", sku.color.id),
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // The color's stock units went with it.
    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/colors/{}/sizes", sku.color.id),
            None,
            None,
        )
        .await;
    let body = response_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);

    let response = app
        .request(
            Method::POST,
            "/api/v1/cart/items",
            Some(&token),
            Some(json!({"size_stock_id": sku.size_stock.id, "quantity": 1})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn a_new_default_address_demotes_the_old_one() {
    let app = TestApp::new().await;
    let (_, token) = app.register_and_login("addr@test.com", "password-123").await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/addresses",
            Some(&token),
            Some(address_body("Home", true)),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let home = response_json(response).await;
    assert_eq!(home["data"]["is_default"], true);
    // Country codes are normalised to uppercase.
    assert_eq!(home["data"]["country"], "US");

    let response = app
        .request(
            Method::POST,
            "/api/v1/addresses",
            Some(&token),
            Some(address_body("Office", true)),
        )
        .await;
    let office = response_json(response).await;
    assert_eq!(office["data"]["is_default"], true);

    let response = app
        .request(Method::GET, "/api/v1/addresses", Some(&token), None)
        .await;
    let body = response_json(response).await;
    let listed = body["data"].as_array().unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0]["recipient"], "Office");
    assert_eq!(listed[0]["is_default"], true);
    assert_eq!(listed[1]["recipient"], "Home");
    assert_eq!(listed[1]["is_default"], false);
}

#[tokio::test]
async fn addresses_are_scoped_to_their_owner() {
    let app = TestApp::new().await;
    let (_, alice) = app.register_and_login("alice@test.com", "password-123").await;
    let (_, bob) = app.register_and_login("bob@test.com", "password-123").await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/addresses",
            Some(&alice),
            Some(address_body("Alice", false)),
        )
        .await;
    let body = response_json(response).await;
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let uri = format!("/api/v1/addresses/{id}");
    let response = app.request(Method::GET, &uri, Some(&bob), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let response = app.request(Method::DELETE, &uri, Some(&bob), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn broadcast_reaches_every_active_user() {
    let app = TestApp::new().await;
    let (_, alice) = app.register_and_login("alice@test.com", "password-123").await;
    let (_, bob) = app.register_and_login("bob@test.com", "password-123").await;
    let admin = app.admin_token();

    let response = app
        .request(
            Method::POST,
            "/api/v1/admin/notifications/broadcast",
            Some(&admin),
            Some(json!({"title": "Summer sale", "body": "Everything 20% off this week."})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    for token in [&alice, &bob] {
        let response = app
            .request(
                Method::GET,
                "/api/v1/notifications/unread-count",
                Some(token),
                None,
            )
            .await;
        let body = response_json(response).await;
        assert_eq!(body["data"]["unread"], 1);
    }

    // Alice reads hers one by one, Bob sweeps all at once.
    let response = app
        .request(Method::GET, "/api/v1/notifications", Some(&alice), None)
        .await;
    let body = response_json(response).await;
    assert_eq!(body["data"]["total"], 1);
    let id = body["data"]["items"][0]["id"].as_str().unwrap().to_string();

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/notifications/{id}/read"),
            Some(&alice),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .request(
            Method::POST,
            "/api/v1/notifications/read-all",
            Some(&bob),
            None,
        )
        .await;
    let body = response_json(response).await;
    assert_eq!(body["data"]["updated"], 1);

    for token in [&alice, &bob] {
        let response = app
            .request(
                Method::GET,
                "/api/v1/notifications/unread-count",
                Some(token),
                None,
            )
            .await;
        let body = response_json(response).await;
        assert_eq!(body["data"]["unread"], 0);
    }
}

#[tokio::test]
async fn broadcast_requires_the_admin_role() {
    let app = TestApp::new().await;
    let (_, token) = app.register_and_login("user@test.com", "password-123").await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/admin/notifications/broadcast",
            Some(&token),
            Some(json!({"title": "Fake", "body": "Nope."})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

async fn place_completed_order(app: &TestApp, token: &str, sku: &common::SeededSku) -> String {
    let response = app
        .request(
            Method::POST,
            "/api/v1/cart/items",
            Some(token),
            Some(json!({"size_stock_id": sku.size_stock.id, "quantity": 1})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let address_id = app.seed_address(token).await;
    let response = app
        .request(
            Method::POST,
            "/api/v1/checkout",
            Some(token),
            Some(json!({"address_id": address_id, "payment_method": "card"})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_json(response).await;
    let order_id = body["data"]["id"].as_str().unwrap().to_string();

    let admin = app.admin_token();
    for status in ["confirmed", "processing", "shipping", "completed"] {
        let response = app
            .request(
                Method::PUT,
                &format!("/api/v1/admin/orders/{order_id}/status"),
                Some(&admin),
                Some(json!({"status": status})),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK, "transition to {status}");
    }
    order_id
}

#[tokio::test]
async fn reviews_appear_publicly_only_after_approval() {
    let app = TestApp::new().await;
    let (_, token) = app.register_and_login("buyer@test.com", "password-123").await;
    let sku = app.seed_sku("Trail Shoe", dec!(120.00), 5).await;
    let order_id = place_completed_order(&app, &token, &sku).await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/reviews",
            Some(&token),
            Some(json!({
                "product_id": sku.product.id,
                "order_id": order_id,
                "rating": 4,
                "title": "Solid",
                "body": "Comfortable out of the box.",
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_json(response).await;
    assert_eq!(body["data"]["is_approved"], false);
    let review_id = body["data"]["id"].as_str().unwrap().to_string();

    // Unapproved reviews stay out of the public listing.
    let public_uri = format!("/api/v1/products/{}/reviews", sku.product.id);
    let response = app.request(Method::GET, &public_uri, None, None).await;
    let body = response_json(response).await;
    assert_eq!(body["data"]["total"], 0);
    assert!(body["data"]["average_rating"].is_null());

    let admin = app.admin_token();
    let response = app
        .request(
            Method::GET,
            "/api/v1/admin/reviews/pending",
            Some(&admin),
            None,
        )
        .await;
    let body = response_json(response).await;
    assert_eq!(body["data"]["total"], 1);

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/admin/reviews/{review_id}/approve"),
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.request(Method::GET, &public_uri, None, None).await;
    let body = response_json(response).await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["reviews"][0]["rating"], 4);
    assert_eq!(decimal_field(&body["data"]["average_rating"]), dec!(4));

    // One review per product per order.
    let response = app
        .request(
            Method::POST,
            "/api/v1/reviews",
            Some(&token),
            Some(json!({
                "product_id": sku.product.id,
                "order_id": order_id,
                "rating": 5,
                "body": "Second thoughts.",
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn reviews_require_a_completed_purchase() {
    let app = TestApp::new().await;
    let (_, token) = app.register_and_login("early@test.com", "password-123").await;
    let sku = app.seed_sku("Wool Scarf", dec!(35.00), 5).await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/cart/items",
            Some(&token),
            Some(json!({"size_stock_id": sku.size_stock.id, "quantity": 1})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let address_id = app.seed_address(&token).await;
    let response = app
        .request(
            Method::POST,
            "/api/v1/checkout",
            Some(&token),
            Some(json!({"address_id": address_id, "payment_method": "card"})),
        )
        .await;
    let body = response_json(response).await;
    let order_id = body["data"]["id"].as_str().unwrap().to_string();

    // The order is still pending.
    let response = app
        .request(
            Method::POST,
            "/api/v1/reviews",
            Some(&token),
            Some(json!({
                "product_id": sku.product.id,
                "order_id": order_id,
                "rating": 5,
                "body": "Too soon.",
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Nor can a review target an order that never contained the product.
    let other = app.seed_sku("Unrelated Hat", dec!(15.00), 5).await;
    let response = app
        .request(
            Method::POST,
            "/api/v1/reviews",
            Some(&token),
            Some(json!({
                "product_id": other.product.id,
                "order_id": order_id,
                "rating": 5,
                "body": "Never bought this.",
            })),
        )
        .await;
    assert_ne!(response.status(), StatusCode::CREATED);
}
