use axum::{
    extract::{Path, State},
    response::Response,
    routing::{delete, get, post, put},
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::auth::{AuthRouterExt, AuthUser};
use crate::errors::ApiError;
use crate::handlers::common::{
    created_response, no_content_response, success_response, validate_input,
};
use crate::services::addresses::{CreateAddressInput, UpdateAddressInput};
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/addresses", get(list))
        .route("/addresses", post(create))
        .route("/addresses/{id}", get(get_one))
        .route("/addresses/{id}", put(update))
        .route("/addresses/{id}", delete(remove))
        .with_auth()
}

async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Response, ApiError> {
    let addresses = state.services.addresses.list(auth.id).await?;
    Ok(success_response(addresses))
}

async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(input): Json<CreateAddressInput>,
) -> Result<Response, ApiError> {
    validate_input(&input)?;
    let address = state.services.addresses.create(auth.id, input).await?;
    Ok(created_response(address))
}

async fn get_one(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let address = state.services.addresses.get(auth.id, id).await?;
    Ok(success_response(address))
}

async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateAddressInput>,
) -> Result<Response, ApiError> {
    validate_input(&input)?;
    let address = state.services.addresses.update(auth.id, id, input).await?;
    Ok(success_response(address))
}

async fn remove(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    state.services.addresses.delete(auth.id, id).await?;
    Ok(no_content_response())
}
