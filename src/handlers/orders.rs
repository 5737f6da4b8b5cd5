use axum::{
    extract::{Path, Query, State},
    response::Response,
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::auth::{AuthRouterExt, AuthUser, ADMIN_ROLE};
use crate::entities::order::{OrderStatus, ShippingStatus};
use crate::errors::ApiError;
use crate::handlers::common::{success_response, PaginatedResponse, PaginationParams};
use crate::services::orders::OrderActor;
use crate::AppState;

#[derive(Debug, Deserialize, IntoParams)]
pub struct OrderListQuery {
    pub status: Option<OrderStatus>,
    #[serde(default)]
    pub page: u64,
    #[serde(default)]
    pub limit: u64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusInput {
    pub status: OrderStatus,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateShippingStatusInput {
    pub shipping_status: ShippingStatus,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_my_orders))
        .route("/orders/{id}", get(get_my_order))
        .route("/orders/{id}/cancel", post(cancel_my_order))
        .with_auth()
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_all_orders))
        .route("/orders/{id}", get(get_any_order))
        .route("/orders/{id}/status", put(update_status))
        .route("/orders/{id}/shipping-status", put(update_shipping_status))
        .with_role(ADMIN_ROLE)
}

fn list_params(query: &OrderListQuery) -> PaginationParams {
    PaginationParams {
        page: query.page.max(1),
        limit: if query.limit == 0 { 20 } else { query.limit },
    }
}

async fn list_my_orders(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<OrderListQuery>,
) -> Result<Response, ApiError> {
    let params = list_params(&query);
    let (items, total) = state
        .services
        .orders
        .list_orders(
            OrderActor::Customer(auth.id),
            query.status,
            params.page,
            params.limit,
        )
        .await?;
    Ok(success_response(PaginatedResponse::new(items, total, &params)))
}

async fn get_my_order(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let view = state
        .services
        .orders
        .get_order(id, OrderActor::Customer(auth.id))
        .await?;
    Ok(success_response(view))
}

async fn cancel_my_order(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let order = state
        .services
        .orders
        .cancel_order(id, OrderActor::Customer(auth.id))
        .await?;
    Ok(success_response(order))
}

async fn list_all_orders(
    State(state): State<AppState>,
    Query(query): Query<OrderListQuery>,
) -> Result<Response, ApiError> {
    let params = list_params(&query);
    let (items, total) = state
        .services
        .orders
        .list_orders(OrderActor::Admin, query.status, params.page, params.limit)
        .await?;
    Ok(success_response(PaginatedResponse::new(items, total, &params)))
}

async fn get_any_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let view = state
        .services
        .orders
        .get_order(id, OrderActor::Admin)
        .await?;
    Ok(success_response(view))
}

async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateStatusInput>,
) -> Result<Response, ApiError> {
    let order = state.services.orders.update_status(id, input.status).await?;
    Ok(success_response(order))
}

async fn update_shipping_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateShippingStatusInput>,
) -> Result<Response, ApiError> {
    let order = state
        .services
        .orders
        .update_shipping_status(id, input.shipping_status)
        .await?;
    Ok(success_response(order))
}
