use axum::{
    extract::{Path, State},
    response::Response,
    routing::{delete, get, post, put},
    Extension, Json, Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::auth::{AuthRouterExt, AuthUser};
use crate::errors::ApiError;
use crate::handlers::common::{success_response, validate_input};
use crate::services::cart::AddItemInput;
use crate::AppState;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateQuantityInput {
    #[validate(range(min = 0, max = 999))]
    pub quantity: i32,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/cart", get(get_cart))
        .route("/cart/items", post(add_item))
        .route("/cart/items/{id}", put(update_item))
        .route("/cart/items/{id}", delete(remove_item))
        .route("/cart/clear", post(clear_cart))
        .with_auth()
}

async fn get_cart(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Response, ApiError> {
    let view = state.services.cart.get_cart_view(auth.id).await?;
    Ok(success_response(view))
}

async fn add_item(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(input): Json<AddItemInput>,
) -> Result<Response, ApiError> {
    validate_input(&input)?;
    let view = state.services.cart.add_item(auth.id, input).await?;
    Ok(success_response(view))
}

async fn update_item(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateQuantityInput>,
) -> Result<Response, ApiError> {
    validate_input(&input)?;
    let view = state
        .services
        .cart
        .update_item_quantity(auth.id, id, input.quantity)
        .await?;
    Ok(success_response(view))
}

async fn remove_item(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let view = state.services.cart.remove_item(auth.id, id).await?;
    Ok(success_response(view))
}

async fn clear_cart(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Response, ApiError> {
    let view = state.services.cart.clear_cart(auth.id).await?;
    Ok(success_response(view))
}
