use axum::extract::State;
use foodscanner_core::domain::subscription::{
    entities::PortalSession, ports::SubscriptionService, value_objects::CreatePortalInput,
};

use crate::application::http::{
    server::{
        api_entities::{
            api_error::{ApiError, ApiErrorResponse, ValidateJson},
            response::Response,
        },
        app_state::AppState,
    },
    subscription::validators::CreatePortalRequest,
};

#[utoipa::path(
    post,
    path = "/create-portal",
    tag = "subscription",
    summary = "Open the billing portal",
    request_body = CreatePortalRequest,
    responses(
        (status = 200, body = PortalSession),
        (status = 500, body = ApiErrorResponse),
    )
)]
pub async fn create_portal(
    State(state): State<AppState>,
    ValidateJson(payload): ValidateJson<CreatePortalRequest>,
) -> Result<Response<PortalSession>, ApiError> {
    let session = state
        .service
        .create_portal(CreatePortalInput {
            user_id: payload.user_id,
        })
        .await
        .map_err(ApiError::from)?;

    Ok(Response::OK(session))
}
