use axum::{extract::State, response::Response, routing::post, Extension, Json, Router};

use crate::auth::{AuthRouterExt, AuthUser};
use crate::errors::ApiError;
use crate::handlers::common::{created_response, validate_input};
use crate::services::checkout::PlaceOrderInput;
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/checkout", post(place_order))
        .with_auth()
}

async fn place_order(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(input): Json<PlaceOrderInput>,
) -> Result<Response, ApiError> {
    validate_input(&input)?;
    let order = state.services.checkout.place_order(auth.id, input).await?;
    Ok(created_response(order))
}
