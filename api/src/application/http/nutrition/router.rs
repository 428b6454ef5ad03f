use axum::{Router, middleware, routing::post};
use utoipa::OpenApi;

use super::handlers::{
    analyze_food_audio::{__path_analyze_food_audio, analyze_food_audio},
    analyze_food_image::{__path_analyze_food_image, analyze_food_image},
    analyze_food_text::{__path_analyze_food_text, analyze_food_text},
};
use crate::application::{
    http::server::app_state::AppState, subscription_middleware::require_subscription,
};

#[derive(OpenApi)]
#[openapi(paths(analyze_food_image, analyze_food_text, analyze_food_audio))]
pub struct NutritionApiDoc;

pub fn nutrition_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            &format!("{}/analyze_food", state.args.server.root_path),
            post(analyze_food_image),
        )
        .route(
            &format!("{}/analyze_food/image", state.args.server.root_path),
            post(analyze_food_image),
        )
        .route(
            &format!("{}/analyze_food/text", state.args.server.root_path),
            post(analyze_food_text),
        )
        .route(
            &format!("{}/analyze_food/audio", state.args.server.root_path),
            post(analyze_food_audio),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_subscription,
        ))
}
