use axum::extract::State;
use foodscanner_core::domain::subscription::{
    entities::CheckoutSession, ports::SubscriptionService, value_objects::CreateCheckoutInput,
};

use crate::application::http::{
    server::{
        api_entities::{
            api_error::{ApiError, ApiErrorResponse, ValidateJson},
            response::Response,
        },
        app_state::AppState,
    },
    subscription::validators::CreateCheckoutRequest,
};

#[utoipa::path(
    post,
    path = "/create-checkout",
    tag = "subscription",
    summary = "Start a subscription checkout",
    description = "Creates a hosted checkout session for the requested tier, creating the payment customer on first purchase.",
    request_body = CreateCheckoutRequest,
    responses(
        (status = 200, body = CheckoutSession),
        (status = 400, body = ApiErrorResponse),
        (status = 500, body = ApiErrorResponse),
    )
)]
pub async fn create_checkout(
    State(state): State<AppState>,
    ValidateJson(payload): ValidateJson<CreateCheckoutRequest>,
) -> Result<Response<CheckoutSession>, ApiError> {
    let session = state
        .service
        .create_checkout(CreateCheckoutInput {
            user_id: payload.user_id,
            tier: payload.tier,
        })
        .await
        .map_err(ApiError::from)?;

    Ok(Response::OK(session))
}
