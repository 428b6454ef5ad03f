use axum::extract::State;
use foodscanner_core::domain::nutrition::{
    entities::{AudioFormat, NutritionFacts},
    ports::NutritionService,
    value_objects::AnalyzeAudioInput,
};

use crate::application::http::{
    nutrition::validators::AnalyzeFoodAudioRequest,
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
    path = "/audio",
    tag = "nutrition",
    summary = "Estimate nutrition from a spoken description",
    description = "Transcribes the recording, then estimates the described meal. Transcription failures yield zeros.",
    request_body = AnalyzeFoodAudioRequest,
    responses(
        (status = 200, body = NutritionFacts),
        (status = 400, body = ApiErrorResponse),
    )
)]
pub async fn analyze_food_audio(
    State(state): State<AppState>,
    ValidateJson(payload): ValidateJson<AnalyzeFoodAudioRequest>,
) -> Result<Response<NutritionFacts>, ApiError> {
    let format = match payload.format.as_deref() {
        Some(format) if !format.trim().is_empty() => {
            format.parse::<AudioFormat>().map_err(ApiError::BadRequest)?
        }
        _ => AudioFormat::default(),
    };

    let facts = state
        .service
        .analyze_audio(AnalyzeAudioInput {
            audio_base64: payload.audio,
            format,
        })
        .await
        .map_err(ApiError::from)?;

    Ok(Response::OK(facts))
}
