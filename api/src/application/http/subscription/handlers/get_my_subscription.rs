use axum::extract::State;
use foodscanner_core::domain::subscription::{
    entities::SubscriptionSnapshot, ports::SubscriptionService,
};

use crate::application::{
    auth::AuthenticatedUser,
    http::server::{
        api_entities::{api_error::ApiErrorResponse, response::Response},
        app_state::AppState,
    },
};

#[utoipa::path(
    get,
    path = "/me",
    tag = "subscription",
    summary = "Get the subscription status of the signed-in user",
    security(("bearer" = [])),
    responses(
        (status = 200, body = SubscriptionSnapshot),
        (status = 401, body = ApiErrorResponse),
    )
)]
pub async fn get_my_subscription(
    user: AuthenticatedUser,
    State(state): State<AppState>,
) -> Response<SubscriptionSnapshot> {
    tracing::debug!(user_id = %user.user_id, email = ?user.email, "Subscription lookup for token subject");

    Response::OK(state.service.get_subscription_status(user.user_id).await)
}
