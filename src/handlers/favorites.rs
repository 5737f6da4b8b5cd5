use axum::{
    extract::{Path, Query, State},
    response::Response,
    routing::{delete, get, post},
    Extension, Router,
};
use uuid::Uuid;

use crate::auth::{AuthRouterExt, AuthUser};
use crate::errors::ApiError;
use crate::handlers::common::{
    created_response, no_content_response, success_response, PaginatedResponse, PaginationParams,
};
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/favorites", get(list))
        .route("/favorites/{product_id}", post(add))
        .route("/favorites/{product_id}", delete(remove))
        .with_auth()
}

async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Query(params): Query<PaginationParams>,
) -> Result<Response, ApiError> {
    let (items, total) = state
        .services
        .favorites
        .list(auth.id, params.page, params.limit)
        .await?;
    Ok(success_response(PaginatedResponse::new(items, total, &params)))
}

async fn add(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(product_id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let favorite = state.services.favorites.add(auth.id, product_id).await?;
    Ok(created_response(favorite))
}

async fn remove(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(product_id): Path<Uuid>,
) -> Result<Response, ApiError> {
    state.services.favorites.remove(auth.id, product_id).await?;
    Ok(no_content_response())
}
