use axum::extract::State;
use foodscanner_core::domain::nutrition::{
    entities::NutritionFacts, ports::NutritionService, value_objects::AnalyzeImageInput,
};

use crate::application::http::{
    nutrition::validators::AnalyzeFoodImageRequest,
    server::{
        api_entities::{
            api_error::{ApiError, ApiErrorResponse, ValidateJson},
            response::Response,
        },
        app_state::AppState,
    },
};

#[utoipa::path(
    post,
    path = "/image",
    tag = "nutrition",
    summary = "Estimate nutrition from a photo",
    description = "Estimates calories and macronutrients of the meal in a base64 encoded image. Provider failures yield zeros.",
    request_body = AnalyzeFoodImageRequest,
    responses(
        (status = 200, body = NutritionFacts),
        (status = 400, body = ApiErrorResponse),
    )
)]
pub async fn analyze_food_image(
    State(state): State<AppState>,
    ValidateJson(payload): ValidateJson<AnalyzeFoodImageRequest>,
) -> Result<Response<NutritionFacts>, ApiError> {
    let facts = state
        .service
        .analyze_image(AnalyzeImageInput {
            image_base64: payload.image,
            filename: payload.filename,
        })
        .await
        .map_err(ApiError::from)?;

    Ok(Response::OK(facts))
}
