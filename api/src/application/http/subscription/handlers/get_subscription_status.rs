use axum::extract::{Path, State};
use foodscanner_core::domain::subscription::{
    entities::SubscriptionSnapshot, ports::SubscriptionService,
};

use crate::application::http::server::{api_entities::response::Response, app_state::AppState};

#[utoipa::path(
    get,
    path = "/status/{user_id}",
    tag = "subscription",
    summary = "Get the subscription status of a user",
    description = "Unknown users and lookup failures report the free tier.",
    params(
        ("user_id" = String, Path, description = "Profile uid"),
    ),
    responses(
        (status = 200, body = SubscriptionSnapshot)
    )
)]
pub async fn get_subscription_status(
    Path(user_id): Path<String>,
    State(state): State<AppState>,
) -> Response<SubscriptionSnapshot> {
    Response::OK(state.service.get_subscription_status(user_id).await)
}
