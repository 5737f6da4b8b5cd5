//! Storefront backend: catalog with color/size stock units, carts,
//! checkout with atomic inventory movement, coupons, orders, and the
//! customer-facing engagement surfaces (favorites, notifications,
//! addresses, reviews).

pub mod auth;
pub mod cache;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod services;

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::auth::AuthService;
use crate::config::AppConfig;
use crate::db::DbPool;
use crate::events::EventSender;
use crate::handlers::AppServices;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: Arc<DbPool>,
    pub event_sender: Arc<EventSender>,
    pub auth_service: Arc<AuthService>,
    pub services: AppServices,
}

/// Standard JSON envelope for successful responses.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.into()),
        }
    }
}

/// The full `/api/v1` surface. Admin endpoints live under `/admin` and
/// are role-gated; customer endpoints require a bearer token.
pub fn api_v1_routes() -> Router<AppState> {
    let admin = Router::new()
        .merge(handlers::products::admin_routes())
        .merge(handlers::orders::admin_routes())
        .merge(handlers::coupons::admin_routes())
        .merge(handlers::notifications::admin_routes())
        .merge(handlers::reviews::admin_routes())
        .merge(handlers::users::admin_routes());

    Router::new()
        .merge(handlers::auth::routes())
        .merge(handlers::products::routes())
        .merge(handlers::reviews::public_routes())
        .merge(handlers::carts::routes())
        .merge(handlers::checkout::routes())
        .merge(handlers::orders::routes())
        .merge(handlers::coupons::routes())
        .merge(handlers::favorites::routes())
        .merge(handlers::notifications::routes())
        .merge(handlers::addresses::routes())
        .merge(handlers::reviews::routes())
        .nest("/admin", admin)
}

/// Assembles the application router. CORS and request tracing layers are
/// applied by the binary; tests mount this router directly.
pub fn build_router(state: AppState) -> Router {
    let auth_service = state.auth_service.clone();

    Router::new()
        .route("/status", get(status))
        .route("/health", get(health))
        .nest("/api/v1", api_v1_routes())
        .layer(axum::Extension(auth_service))
        .with_state(state)
}

async fn status() -> impl IntoResponse {
    Json(serde_json::json!({
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "status": "ok",
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    match db::check_connection(&state.db).await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({"status": "healthy", "database": "up"})),
        ),
        Err(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({"status": "unhealthy", "database": "down"})),
        ),
    }
}
