use axum::{
    extract::State,
    response::Response,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::auth::{AuthRouterExt, AuthUser};
use crate::errors::ApiError;
use crate::handlers::common::{created_response, success_response, validate_input};
use crate::services::users::{LoginInput, RegisterInput, ResetPasswordInput};
use crate::AppState;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RefreshInput {
    #[validate(length(min = 1))]
    pub refresh_token: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ForgotPasswordInput {
    #[validate(email)]
    pub email: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/forgot-password", post(forgot_password))
        .route("/auth/reset-password", post(reset_password))
        .merge(Router::new().route("/auth/me", get(me)).with_auth())
}

async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterInput>,
) -> Result<Response, ApiError> {
    validate_input(&input)?;
    let user = state.services.users.register(input).await?;
    Ok(created_response(user))
}

async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginInput>,
) -> Result<Response, ApiError> {
    validate_input(&input)?;
    let response = state.services.users.login(input).await?;
    Ok(success_response(response))
}

async fn refresh(
    State(state): State<AppState>,
    Json(input): Json<RefreshInput>,
) -> Result<Response, ApiError> {
    validate_input(&input)?;
    let tokens = state.services.users.refresh(&input.refresh_token).await?;
    Ok(success_response(tokens))
}

async fn forgot_password(
    State(state): State<AppState>,
    Json(input): Json<ForgotPasswordInput>,
) -> Result<Response, ApiError> {
    validate_input(&input)?;
    state.services.users.forgot_password(&input.email).await?;
    Ok(success_response(serde_json::json!({
        "message": "If the account exists, a reset code has been sent"
    })))
}

async fn reset_password(
    State(state): State<AppState>,
    Json(input): Json<ResetPasswordInput>,
) -> Result<Response, ApiError> {
    validate_input(&input)?;
    state.services.users.reset_password(input).await?;
    Ok(success_response(serde_json::json!({
        "message": "Password has been reset"
    })))
}

async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Response, ApiError> {
    let user = state.services.users.get_user(auth.id).await?;
    Ok(success_response(user))
}
