use axum::{
    extract::{Path, State},
    response::Response,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::auth::{AuthRouterExt, AuthUser, ADMIN_ROLE};
use crate::entities::{coupon, user_coupon};
use crate::errors::ApiError;
use crate::handlers::common::{
    created_response, no_content_response, success_response, validate_input,
};
use crate::services::coupons::CreateCouponInput;
use crate::AppState;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct QuoteInput {
    #[validate(length(min = 1, max = 50))]
    pub code: String,
    pub subtotal: Decimal,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct GrantInput {
    pub user_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserCouponView {
    #[serde(flatten)]
    pub grant: user_coupon::Model,
    pub coupon: Option<coupon::Model>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/coupons/quote", post(quote))
        .route("/coupons/mine", get(list_mine))
        .with_auth()
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/coupons", post(create_coupon))
        .route("/coupons", get(list_coupons))
        .route("/coupons/{id}", get(get_coupon))
        .route("/coupons/{id}", delete(deactivate_coupon))
        .route("/coupons/{id}/grant", post(grant_coupon))
        .with_role(ADMIN_ROLE)
}

async fn quote(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(input): Json<QuoteInput>,
) -> Result<Response, ApiError> {
    validate_input(&input)?;
    let quote = state
        .services
        .coupons
        .quote(&input.code, auth.id, input.subtotal)
        .await?;
    Ok(success_response(quote))
}

async fn list_mine(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Response, ApiError> {
    let grants = state.services.coupons.list_user_coupons(auth.id).await?;
    let views: Vec<UserCouponView> = grants
        .into_iter()
        .map(|(grant, coupon)| UserCouponView { grant, coupon })
        .collect();
    Ok(success_response(views))
}

async fn create_coupon(
    State(state): State<AppState>,
    Json(input): Json<CreateCouponInput>,
) -> Result<Response, ApiError> {
    validate_input(&input)?;
    let coupon = state.services.coupons.create_coupon(input).await?;
    Ok(created_response(coupon))
}

async fn list_coupons(State(state): State<AppState>) -> Result<Response, ApiError> {
    let coupons = state.services.coupons.list_coupons().await?;
    Ok(success_response(coupons))
}

async fn get_coupon(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let coupon = state.services.coupons.get_coupon(id).await?;
    Ok(success_response(coupon))
}

async fn deactivate_coupon(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    state.services.coupons.deactivate_coupon(id).await?;
    Ok(no_content_response())
}

async fn grant_coupon(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<GrantInput>,
) -> Result<Response, ApiError> {
    let grant = state
        .services
        .coupons
        .grant_to_user(id, input.user_id)
        .await?;
    Ok(created_response(grant))
}
