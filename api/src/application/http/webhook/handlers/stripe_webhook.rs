use axum::{extract::State, http::HeaderMap};
use bytes::Bytes;
use foodscanner_core::domain::subscription::{
    ports::SubscriptionService, value_objects::HandleWebhookInput,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::application::http::server::{
    api_entities::{
        api_error::{ApiError, ApiErrorResponse},
        response::Response,
    },
    app_state::AppState,
};

pub const SIGNATURE_HEADER: &str = "stripe-signature";

#[derive(Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct WebhookAcknowledgement {
    pub status: String,
}

#[utoipa::path(
    post,
    path = "/webhook",
    tag = "stripe",
    summary = "Receive payment provider events",
    description = "Verifies the `Stripe-Signature` header against the raw body, then syncs subscription state onto the user profile.",
    request_body(content = String, content_type = "application/json"),
    params(
        ("Stripe-Signature" = String, Header, description = "`t=<unix>,v1=<hex hmac>`"),
    ),
    responses(
        (status = 200, body = WebhookAcknowledgement),
        (status = 400, body = ApiErrorResponse),
        (status = 500, body = ApiErrorResponse),
    )
)]
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Bytes,
) -> Result<Response<WebhookAcknowledgement>, ApiError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    state
        .service
        .handle_webhook(HandleWebhookInput { payload, signature })
        .await
        .map_err(ApiError::from)?;

    Ok(Response::OK(WebhookAcknowledgement {
        status: "success".to_string(),
    }))
}
