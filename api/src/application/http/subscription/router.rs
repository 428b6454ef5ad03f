use axum::{
    Router,
    routing::{get, post},
};
use utoipa::OpenApi;

use super::handlers::{
    create_checkout::{__path_create_checkout, create_checkout},
    create_portal::{__path_create_portal, create_portal},
    get_my_subscription::{__path_get_my_subscription, get_my_subscription},
    get_subscription_status::{__path_get_subscription_status, get_subscription_status},
};
use crate::application::http::server::app_state::AppState;

#[derive(OpenApi)]
#[openapi(paths(
    create_checkout,
    create_portal,
    get_subscription_status,
    get_my_subscription
))]
pub struct SubscriptionApiDoc;

pub fn subscription_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            &format!("{}/subscription/create-checkout", state.args.server.root_path),
            post(create_checkout),
        )
        .route(
            &format!("{}/subscription/create-portal", state.args.server.root_path),
            post(create_portal),
        )
        .route(
            &format!(
                "{}/subscription/status/{{user_id}}",
                state.args.server.root_path
            ),
            get(get_subscription_status),
        )
        .route(
            &format!("{}/subscription/me", state.args.server.root_path),
            get(get_my_subscription),
        )
}
