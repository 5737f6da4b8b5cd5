use axum::{
    extract::{Path, Query, State},
    response::Response,
    routing::{get, post},
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::auth::{AuthRouterExt, AuthUser, ADMIN_ROLE};
use crate::errors::ApiError;
use crate::handlers::common::{
    created_response, success_response, validate_input, PaginatedResponse, PaginationParams,
};
use crate::services::notifications::BroadcastInput;
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/notifications", get(list))
        .route("/notifications/unread-count", get(unread_count))
        .route("/notifications/{id}/read", post(mark_read))
        .route("/notifications/read-all", post(mark_all_read))
        .with_auth()
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/notifications/broadcast", post(broadcast))
        .with_role(ADMIN_ROLE)
}

async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Query(params): Query<PaginationParams>,
) -> Result<Response, ApiError> {
    let (items, total) = state
        .services
        .notifications
        .list_for_user(auth.id, params.page, params.limit)
        .await?;
    Ok(success_response(PaginatedResponse::new(items, total, &params)))
}

async fn unread_count(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Response, ApiError> {
    let unread = state.services.notifications.unread_count(auth.id).await?;
    Ok(success_response(serde_json::json!({ "unread": unread })))
}

async fn mark_read(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let row = state.services.notifications.mark_read(auth.id, id).await?;
    Ok(success_response(row))
}

async fn mark_all_read(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Response, ApiError> {
    let updated = state.services.notifications.mark_all_read(auth.id).await?;
    Ok(success_response(serde_json::json!({ "updated": updated })))
}

async fn broadcast(
    State(state): State<AppState>,
    Json(input): Json<BroadcastInput>,
) -> Result<Response, ApiError> {
    validate_input(&input)?;
    let notification = state.services.notifications.broadcast(input).await?;
    Ok(created_response(notification))
}
