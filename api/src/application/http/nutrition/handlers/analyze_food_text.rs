use axum::extract::State;
use foodscanner_core::domain::nutrition::{
    entities::NutritionFacts, ports::NutritionService, value_objects::AnalyzeTextInput,
};

use crate::application::http::{
    nutrition::validators::AnalyzeFoodTextRequest,
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
    path = "/text",
    tag = "nutrition",
    summary = "Estimate nutrition from a text description",
    request_body = AnalyzeFoodTextRequest,
    responses(
        (status = 200, body = NutritionFacts),
        (status = 400, body = ApiErrorResponse),
    )
)]
pub async fn analyze_food_text(
    State(state): State<AppState>,
    ValidateJson(payload): ValidateJson<AnalyzeFoodTextRequest>,
) -> Result<Response<NutritionFacts>, ApiError> {
    let facts = state
        .service
        .analyze_text(AnalyzeTextInput { text: payload.text })
        .await
        .map_err(ApiError::from)?;

    Ok(Response::OK(facts))
}
