//! Login lockout state machine and the OTP password-reset flow.

mod common;

use axum::http::{Method, StatusCode};
use chrono::{Duration, Utc};
use common::{response_json, TestApp};
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use serde_json::json;
use storefront_api::entities::user;

const EMAIL: &str = "lock@test.com";
const PASSWORD: &str = "correct-horse-battery";

async fn login(app: &TestApp, email: &str, password: &str) -> StatusCode {
    app.request(
        Method::POST,
        "/api/v1/auth/login",
        None,
        Some(json!({"email": email, "password": password})),
    )
    .await
    .status()
}

#[tokio::test]
async fn five_failures_lock_the_account() {
    let app = TestApp::new().await;
    app.register_and_login(EMAIL, PASSWORD).await;

    for attempt in 1..=5 {
        let status = login(&app, EMAIL, "wrong-password").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "attempt {attempt}");
    }

    // Even the correct password is refused while the lock holds.
    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({"email": EMAIL, "password": PASSWORD})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = response_json(response).await;
    assert!(body["message"]
        .as_str()
        .unwrap()
        .to_lowercase()
        .contains("locked"));
}

#[tokio::test]
async fn successful_login_resets_the_failure_counter() {
    let app = TestApp::new().await;
    app.register_and_login(EMAIL, PASSWORD).await;

    for _ in 0..4 {
        assert_eq!(login(&app, EMAIL, "nope").await, StatusCode::UNAUTHORIZED);
    }
    assert_eq!(login(&app, EMAIL, PASSWORD).await, StatusCode::OK);

    // The counter restarted: four more failures still do not lock.
    for _ in 0..4 {
        assert_eq!(login(&app, EMAIL, "nope").await, StatusCode::UNAUTHORIZED);
    }
    assert_eq!(login(&app, EMAIL, PASSWORD).await, StatusCode::OK);
}

#[tokio::test]
async fn an_expired_lock_starts_a_fresh_failure_count() {
    let app = TestApp::new().await;
    let (user_id, _) = app.register_and_login(EMAIL, PASSWORD).await;

    // Age a full lock past its deadline.
    let row = user::Entity::find_by_id(user_id)
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap();
    let mut model: user::ActiveModel = row.into();
    model.failed_login_attempts = Set(5);
    model.locked_until = Set(Some(Utc::now() - Duration::minutes(1)));
    model.update(&*app.state.db).await.unwrap();

    // The first failure after expiry is failure one of five, not six;
    // it must not re-lock the account.
    assert_eq!(login(&app, EMAIL, "nope").await, StatusCode::UNAUTHORIZED);
    assert_eq!(login(&app, EMAIL, PASSWORD).await, StatusCode::OK);
}

#[tokio::test]
async fn otp_reset_flow_is_single_use() {
    let app = TestApp::new().await;
    app.register_and_login(EMAIL, PASSWORD).await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/forgot-password",
            None,
            Some(json!({"email": EMAIL})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    // In tests the mail transport is the cache itself.
    let otp = app
        .cache
        .get(&format!("otp:{EMAIL}"))
        .await
        .unwrap()
        .expect("otp stored");

    // A wrong code is rejected and does not burn the stored one.
    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/reset-password",
            None,
            Some(json!({"email": EMAIL, "otp": "000000", "new_password": "fresh-password-1"})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/reset-password",
            None,
            Some(json!({"email": EMAIL, "otp": otp, "new_password": "fresh-password-1"})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(login(&app, EMAIL, PASSWORD).await, StatusCode::UNAUTHORIZED);
    assert_eq!(login(&app, EMAIL, "fresh-password-1").await, StatusCode::OK);

    // The code was deleted on success; replaying it fails.
    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/reset-password",
            None,
            Some(json!({"email": EMAIL, "otp": otp, "new_password": "another-password-2"})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn forgot_password_does_not_reveal_unknown_accounts() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/forgot-password",
            None,
            Some(json!({"email": "ghost@test.com"})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(app
        .cache
        .get("otp:ghost@test.com")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn refresh_rotates_the_token_pair() {
    let app = TestApp::new().await;
    app.register_and_login(EMAIL, PASSWORD).await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({"email": EMAIL, "password": PASSWORD})),
        )
        .await;
    let body = response_json(response).await;
    let refresh_token = body["data"]["refresh_token"].as_str().unwrap().to_string();
    let access_token = body["data"]["access_token"].as_str().unwrap().to_string();

    // An access token is not accepted as a refresh token.
    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/refresh",
            None,
            Some(json!({"refresh_token": access_token})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/refresh",
            None,
            Some(json!({"refresh_token": refresh_token})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    let new_access = body["data"]["access_token"].as_str().unwrap();

    let response = app
        .request(Method::GET, "/api/v1/auth/me", Some(new_access), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["data"]["email"], EMAIL);
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let app = TestApp::new().await;
    app.register_and_login(EMAIL, PASSWORD).await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/register",
            None,
            Some(json!({
                "email": EMAIL,
                "password": "whatever-else-1",
                "full_name": "Impostor",
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}
