use axum::{
    extract::{Path, Query, State},
    response::Response,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::auth::{AuthRouterExt, ADMIN_ROLE};
use crate::errors::ApiError;
use crate::handlers::common::{
    created_response, no_content_response, success_response, validate_input, PaginatedResponse,
    PaginationParams,
};
use crate::services::catalog::{
    CreateCategoryInput, CreateColorInput, CreateProductInput, CreateSizeStockInput,
    CreateTargetInput, ProductFilters, UpdateCategoryInput, UpdateProductInput, UpdateTargetInput,
};
use crate::AppState;

#[derive(Debug, Deserialize, IntoParams)]
pub struct ProductListQuery {
    pub search: Option<String>,
    pub category_id: Option<Uuid>,
    pub target_id: Option<Uuid>,
    #[serde(default)]
    pub page: u64,
    #[serde(default)]
    pub limit: u64,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AdjustStockInput {
    #[validate(range(min = -999, max = 999))]
    pub delta: i32,
}

/// Public catalog reads.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products))
        .route("/products/{id}", get(get_product))
        .route("/products/{id}/colors", get(list_colors))
        .route("/colors/{id}/sizes", get(list_sizes))
        .route("/categories", get(list_categories))
        .route("/targets", get(list_targets))
}

/// Admin catalog management.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/products", post(create_product))
        .route("/products/{id}", put(update_product))
        .route("/products/{id}", delete(delete_product))
        .route("/products/{id}/colors", post(add_color))
        .route("/colors/{id}", delete(remove_color))
        .route("/colors/{id}/sizes", post(add_size_stock))
        .route("/size-stocks/{id}", delete(remove_size_stock))
        .route("/size-stocks/{id}/adjust", post(adjust_stock))
        .route("/categories", post(create_category))
        .route("/categories/{id}", put(update_category))
        .route("/categories/{id}", delete(delete_category))
        .route("/targets", post(create_target))
        .route("/targets/{id}", put(update_target))
        .route("/targets/{id}", delete(delete_target))
        .with_role(ADMIN_ROLE)
}

async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductListQuery>,
) -> Result<Response, ApiError> {
    let filters = ProductFilters {
        search: query.search,
        category_id: query.category_id,
        target_id: query.target_id,
        include_inactive: false,
    };
    let params = PaginationParams {
        page: query.page.max(1),
        limit: if query.limit == 0 {
            state.config.default_page_size
        } else {
            query.limit.min(state.config.max_page_size)
        },
    };
    let (items, total) = state
        .services
        .catalog
        .list_products(filters, params.page, params.limit)
        .await?;
    Ok(success_response(PaginatedResponse::new(items, total, &params)))
}

async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let detail = state.services.catalog.get_product_detail(id).await?;
    Ok(success_response(detail))
}

async fn list_colors(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let colors = state.services.catalog.list_colors(id).await?;
    Ok(success_response(colors))
}

async fn list_sizes(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let sizes = state.services.catalog.list_size_stocks(id).await?;
    Ok(success_response(sizes))
}

async fn list_categories(State(state): State<AppState>) -> Result<Response, ApiError> {
    let categories = state.services.catalog.list_categories().await?;
    Ok(success_response(categories))
}

async fn list_targets(State(state): State<AppState>) -> Result<Response, ApiError> {
    let targets = state.services.catalog.list_targets().await?;
    Ok(success_response(targets))
}

async fn create_product(
    State(state): State<AppState>,
    Json(input): Json<CreateProductInput>,
) -> Result<Response, ApiError> {
    validate_input(&input)?;
    let product = state.services.catalog.create_product(input).await?;
    Ok(created_response(product))
}

async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateProductInput>,
) -> Result<Response, ApiError> {
    validate_input(&input)?;
    let product = state.services.catalog.update_product(id, input).await?;
    Ok(success_response(product))
}

async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    state.services.catalog.delete_product(id).await?;
    Ok(no_content_response())
}

async fn add_color(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<CreateColorInput>,
) -> Result<Response, ApiError> {
    validate_input(&input)?;
    let color = state.services.catalog.add_color(id, input).await?;
    Ok(created_response(color))
}

async fn remove_color(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    state.services.catalog.remove_color(id).await?;
    Ok(no_content_response())
}

async fn add_size_stock(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<CreateSizeStockInput>,
) -> Result<Response, ApiError> {
    validate_input(&input)?;
    let size_stock = state.services.catalog.add_size_stock(id, input).await?;
    Ok(created_response(size_stock))
}

async fn remove_size_stock(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    state.services.catalog.remove_size_stock(id).await?;
    Ok(no_content_response())
}

async fn adjust_stock(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<AdjustStockInput>,
) -> Result<Response, ApiError> {
    validate_input(&input)?;
    let size_stock = state
        .services
        .inventory
        .adjust_stock(id, input.delta)
        .await?;
    Ok(success_response(size_stock))
}

async fn create_category(
    State(state): State<AppState>,
    Json(input): Json<CreateCategoryInput>,
) -> Result<Response, ApiError> {
    validate_input(&input)?;
    let category = state.services.catalog.create_category(input).await?;
    Ok(created_response(category))
}

async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateCategoryInput>,
) -> Result<Response, ApiError> {
    validate_input(&input)?;
    let category = state.services.catalog.update_category(id, input).await?;
    Ok(success_response(category))
}

async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    state.services.catalog.delete_category(id).await?;
    Ok(no_content_response())
}

async fn create_target(
    State(state): State<AppState>,
    Json(input): Json<CreateTargetInput>,
) -> Result<Response, ApiError> {
    validate_input(&input)?;
    let target = state.services.catalog.create_target(input).await?;
    Ok(created_response(target))
}

async fn update_target(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateTargetInput>,
) -> Result<Response, ApiError> {
    validate_input(&input)?;
    let target = state.services.catalog.update_target(id, input).await?;
    Ok(success_response(target))
}

async fn delete_target(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    state.services.catalog.delete_target(id).await?;
    Ok(no_content_response())
}
