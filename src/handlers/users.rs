use axum::{
    extract::{Path, Query, State},
    response::Response,
    routing::{get, put},
    Json, Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::{AuthRouterExt, ADMIN_ROLE};
use crate::errors::ApiError;
use crate::handlers::common::{success_response, PaginatedResponse, PaginationParams};
use crate::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetActiveInput {
    pub is_active: bool,
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/{id}/active", put(set_active))
        .with_role(ADMIN_ROLE)
}

async fn list_users(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> Result<Response, ApiError> {
    let (items, total) = state
        .services
        .users
        .list_users(params.page, params.limit)
        .await?;
    Ok(success_response(PaginatedResponse::new(items, total, &params)))
}

async fn set_active(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<SetActiveInput>,
) -> Result<Response, ApiError> {
    let user = state.services.users.set_active(id, input.is_active).await?;
    Ok(success_response(user))
}
