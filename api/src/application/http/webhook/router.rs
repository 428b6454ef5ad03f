use axum::{Router, routing::post};
use utoipa::OpenApi;

use super::handlers::stripe_webhook::{__path_stripe_webhook, stripe_webhook};
use crate::application::http::server::app_state::AppState;

#[derive(OpenApi)]
#[openapi(paths(stripe_webhook))]
pub struct WebhookApiDoc;

pub fn webhook_routes(state: AppState) -> Router<AppState> {
    Router::new().route(
        &format!("{}/stripe/webhook", state.args.server.root_path),
        post(stripe_webhook),
    )
}
