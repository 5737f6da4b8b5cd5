use axum::{
    extract::{Path, Query, State},
    response::Response,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::auth::{AuthRouterExt, AuthUser, ADMIN_ROLE};
use crate::errors::ApiError;
use crate::handlers::common::{
    created_response, no_content_response, success_response, validate_input, PaginatedResponse,
    PaginationParams,
};
use crate::services::reviews::SubmitReviewInput;
use crate::AppState;

/// Public: approved reviews for a product.
pub fn public_routes() -> Router<AppState> {
    Router::new().route("/products/{id}/reviews", get(list_for_product))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/reviews", post(submit))
        .route("/reviews/mine", get(list_mine))
        .with_auth()
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/reviews/pending", get(list_pending))
        .route("/reviews/{id}/approve", post(approve))
        .route("/reviews/{id}", delete(remove))
        .with_role(ADMIN_ROLE)
}

async fn list_for_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<PaginationParams>,
) -> Result<Response, ApiError> {
    let summary = state
        .services
        .reviews
        .list_for_product(id, params.page, params.limit)
        .await?;
    Ok(success_response(summary))
}

async fn submit(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(input): Json<SubmitReviewInput>,
) -> Result<Response, ApiError> {
    validate_input(&input)?;
    let review = state.services.reviews.submit(auth.id, input).await?;
    Ok(created_response(review))
}

async fn list_mine(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Query(params): Query<PaginationParams>,
) -> Result<Response, ApiError> {
    let (items, total) = state
        .services
        .reviews
        .list_mine(auth.id, params.page, params.limit)
        .await?;
    Ok(success_response(PaginatedResponse::new(items, total, &params)))
}

async fn list_pending(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> Result<Response, ApiError> {
    let (items, total) = state
        .services
        .reviews
        .list_pending(params.page, params.limit)
        .await?;
    Ok(success_response(PaginatedResponse::new(items, total, &params)))
}

async fn approve(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let review = state.services.reviews.approve(id).await?;
    Ok(success_response(review))
}

async fn remove(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    state.services.reviews.delete(id).await?;
    Ok(no_content_response())
}
