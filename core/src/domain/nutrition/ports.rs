use std::future::Future;

use bytes::Bytes;

use crate::domain::{
    common::entities::app_errors::CoreError,
    nutrition::{
        entities::NutritionFacts,
        value_objects::{AnalyzeAudioInput, AnalyzeImageInput, AnalyzeTextInput, ChatRequest},
    },
};

/// LLM Client trait for calling the hosted model provider
#[cfg_attr(test, mockall::automock)]
pub trait LLMClient: Send + Sync {
    /// Returns the text content of the first completion choice.
    fn complete_chat(
        &self,
        request: ChatRequest,
    ) -> impl Future<Output = Result<String, CoreError>> + Send;

    fn transcribe_audio(
        &self,
        audio: Bytes,
        file_name: String,
        mime_type: String,
    ) -> impl Future<Output = Result<String, CoreError>> + Send;
}

/// Service trait for nutrition estimation.
///
/// Provider and parsing failures never surface as errors: they are logged and
/// the estimate degrades to [`NutritionFacts::zero`]. Only malformed input is
/// rejected.
pub trait NutritionService: Send + Sync {
    fn analyze_image(
        &self,
        input: AnalyzeImageInput,
    ) -> impl Future<Output = Result<NutritionFacts, CoreError>> + Send;

    fn analyze_text(
        &self,
        input: AnalyzeTextInput,
    ) -> impl Future<Output = Result<NutritionFacts, CoreError>> + Send;

    fn analyze_audio(
        &self,
        input: AnalyzeAudioInput,
    ) -> impl Future<Output = Result<NutritionFacts, CoreError>> + Send;
}
