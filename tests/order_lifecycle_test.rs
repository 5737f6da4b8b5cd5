//! End-to-end order flow: checkout, stock movement, cancellation, and
//! the admin status machine.

mod common;

use axum::http::{Method, StatusCode};
use common::{decimal_field, response_json, TestApp};
use rust_decimal_macros::dec;
use serde_json::json;

#[tokio::test]
async fn checkout_places_order_and_decrements_stock() {
    let app = TestApp::new().await;
    let (_, token) = app.register_and_login("buyer@test.com", "password123").await;
    let seeded = app.seed_sku("Linen Shirt", dec!(40.00), 10).await;
    let address_id = app.seed_address(&token).await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/cart/items",
            Some(&token),
            Some(json!({"size_stock_id": seeded.size_stock.id, "quantity": 2})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .request(
            Method::POST,
            "/api/v1/checkout",
            Some(&token),
            Some(json!({"address_id": address_id, "payment_method": "card"})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_json(response).await;
    assert_eq!(body["data"]["status"], "pending");
    assert_eq!(decimal_field(&body["data"]["subtotal"]), dec!(80.00));
    assert_eq!(decimal_field(&body["data"]["total"]), dec!(80.00));

    let stocks = app
        .state
        .services
        .catalog
        .list_size_stocks(seeded.color.id)
        .await
        .unwrap();
    assert_eq!(stocks[0].stock, 8);

    // The active cart was converted; a fresh empty one takes its place.
    let response = app
        .request(Method::GET, "/api/v1/cart", Some(&token), None)
        .await;
    let body = response_json(response).await;
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn checkout_with_empty_cart_is_rejected() {
    let app = TestApp::new().await;
    let (_, token) = app.register_and_login("empty@test.com", "password123").await;
    let address_id = app.seed_address(&token).await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/checkout",
            Some(&token),
            Some(json!({"address_id": address_id, "payment_method": "card"})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn failed_checkout_leaves_no_partial_stock_mutation() {
    let app = TestApp::new().await;
    let (_, token) = app.register_and_login("atomic@test.com", "password123").await;
    let plentiful = app.seed_sku("Wool Coat", dec!(120.00), 5).await;
    let scarce = app.seed_sku("Silk Scarf", dec!(25.00), 1).await;
    let address_id = app.seed_address(&token).await;

    for (sku, qty) in [(&plentiful, 2), (&scarce, 1)] {
        let response = app
            .request(
                Method::POST,
                "/api/v1/cart/items",
                Some(&token),
                Some(json!({"size_stock_id": sku.size_stock.id, "quantity": qty})),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    // Someone else takes the last scarce unit before checkout.
    app.state
        .services
        .inventory
        .adjust_stock(scarce.size_stock.id, -1)
        .await
        .unwrap();

    let response = app
        .request(
            Method::POST,
            "/api/v1/checkout",
            Some(&token),
            Some(json!({"address_id": address_id, "payment_method": "card"})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // The first line's decrement must have been rolled back.
    let stocks = app
        .state
        .services
        .catalog
        .list_size_stocks(plentiful.color.id)
        .await
        .unwrap();
    assert_eq!(stocks[0].stock, 5);

    let response = app
        .request(Method::GET, "/api/v1/orders", Some(&token), None)
        .await;
    let body = response_json(response).await;
    assert_eq!(body["data"]["total"], 0);
}

#[tokio::test]
async fn cancelling_a_pending_order_restores_stock() {
    let app = TestApp::new().await;
    let (_, token) = app.register_and_login("cancel@test.com", "password123").await;
    let seeded = app.seed_sku("Denim Jacket", dec!(90.00), 4).await;
    let address_id = app.seed_address(&token).await;

    app.request(
        Method::POST,
        "/api/v1/cart/items",
        Some(&token),
        Some(json!({"size_stock_id": seeded.size_stock.id, "quantity": 3})),
    )
    .await;
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

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/orders/{order_id}/cancel"),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["data"]["status"], "cancelled");

    let stocks = app
        .state
        .services
        .catalog
        .list_size_stocks(seeded.color.id)
        .await
        .unwrap();
    assert_eq!(stocks[0].stock, 4);

    // A cancelled order cannot be cancelled again.
    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/orders/{order_id}/cancel"),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn customers_cannot_see_or_cancel_foreign_orders() {
    let app = TestApp::new().await;
    let (_, owner) = app.register_and_login("owner@test.com", "password123").await;
    let (_, other) = app.register_and_login("other@test.com", "password123").await;
    let seeded = app.seed_sku("Canvas Tote", dec!(15.00), 5).await;
    let address_id = app.seed_address(&owner).await;

    app.request(
        Method::POST,
        "/api/v1/cart/items",
        Some(&owner),
        Some(json!({"size_stock_id": seeded.size_stock.id, "quantity": 1})),
    )
    .await;
    let response = app
        .request(
            Method::POST,
            "/api/v1/checkout",
            Some(&owner),
            Some(json!({"address_id": address_id, "payment_method": "card"})),
        )
        .await;
    let body = response_json(response).await;
    let order_id = body["data"]["id"].as_str().unwrap().to_string();

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/orders/{order_id}"),
            Some(&other),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/orders/{order_id}/cancel"),
            Some(&other),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_status_machine_enforces_the_linear_chain() {
    let app = TestApp::new().await;
    let (_, token) = app.register_and_login("chain@test.com", "password123").await;
    let admin = app.admin_token();
    let seeded = app.seed_sku("Knit Sweater", dec!(60.00), 5).await;
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
            Some(json!({"address_id": address_id, "payment_method": "card"})),
        )
        .await;
    let body = response_json(response).await;
    let order_id = body["data"]["id"].as_str().unwrap().to_string();
    let status_uri = format!("/api/v1/admin/orders/{order_id}/status");
    let shipping_uri = format!("/api/v1/admin/orders/{order_id}/shipping-status");

    // Customers cannot reach the admin surface.
    let response = app
        .request(
            Method::PUT,
            &status_uri,
            Some(&token),
            Some(json!({"status": "confirmed"})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Skipping ahead is rejected.
    let response = app
        .request(
            Method::PUT,
            &status_uri,
            Some(&admin),
            Some(json!({"status": "completed"})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Delivered before the order ships is rejected.
    let response = app
        .request(
            Method::PUT,
            &shipping_uri,
            Some(&admin),
            Some(json!({"shipping_status": "delivered"})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    for status in ["confirmed", "processing", "shipping"] {
        let response = app
            .request(
                Method::PUT,
                &status_uri,
                Some(&admin),
                Some(json!({"status": status})),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK, "transition to {status}");
    }

    for shipping in ["in_transit", "delivered"] {
        let response = app
            .request(
                Method::PUT,
                &shipping_uri,
                Some(&admin),
                Some(json!({"shipping_status": shipping})),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK, "shipping to {shipping}");
    }

    let response = app
        .request(
            Method::PUT,
            &status_uri,
            Some(&admin),
            Some(json!({"status": "completed"})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    // Completed orders cannot move backwards.
    let response = app
        .request(
            Method::PUT,
            &status_uri,
            Some(&admin),
            Some(json!({"status": "processing"})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
