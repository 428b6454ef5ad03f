use base64::{Engine as _, engine::general_purpose};
use bytes::Bytes;
use tracing::{info, warn};

use crate::domain::{
    common::{entities::app_errors::CoreError, services::Service},
    nutrition::{
        entities::NutritionFacts,
        parser::parse_nutrition_response,
        ports::{LLMClient, NutritionService},
        prompts::{IMAGE_SYSTEM_PROMPT, TEXT_SYSTEM_PROMPT, image_user_prompt, text_user_prompt},
        value_objects::{AnalyzeAudioInput, AnalyzeImageInput, AnalyzeTextInput, ChatRequest},
    },
    subscription::ports::{PaymentProvider, UserProfileRepository},
};

impl<LLM, UP, PP> NutritionService for Service<LLM, UP, PP>
where
    LLM: LLMClient,
    UP: UserProfileRepository,
    PP: PaymentProvider,
{
    async fn analyze_image(&self, input: AnalyzeImageInput) -> Result<NutritionFacts, CoreError> {
        let image = input.image_base64.trim();
        if image.is_empty() {
            return Err(CoreError::Invalid("No image provided".to_string()));
        }

        let image_url = if image.starts_with("data:") {
            image.to_string()
        } else {
            format!("data:image/jpeg;base64,{image}")
        };

        info!(
            filename = input.filename.as_deref().unwrap_or("image.jpg"),
            size = image.len(),
            "Analyzing food image"
        );

        let request = ChatRequest {
            system_prompt: IMAGE_SYSTEM_PROMPT.to_string(),
            user_prompt: image_user_prompt(),
            image_url: Some(image_url),
            max_tokens: self.config.llm.max_tokens,
        };

        Ok(self.estimate(request).await)
    }

    async fn analyze_text(&self, input: AnalyzeTextInput) -> Result<NutritionFacts, CoreError> {
        if input.text.trim().is_empty() {
            return Err(CoreError::Invalid(
                "No text description provided".to_string(),
            ));
        }

        Ok(self.estimate_from_description(&input.text).await)
    }

    async fn analyze_audio(&self, input: AnalyzeAudioInput) -> Result<NutritionFacts, CoreError> {
        let encoded = input.audio_base64.trim();
        if encoded.is_empty() {
            return Err(CoreError::Invalid("No audio provided".to_string()));
        }

        let audio = match general_purpose::STANDARD.decode(encoded) {
            Ok(audio) => Bytes::from(audio),
            Err(e) => {
                warn!("Audio processing error: invalid base64 payload: {}", e);
                return Ok(NutritionFacts::zero());
            }
        };

        let transcription = match self
            .llm_client
            .transcribe_audio(
                audio,
                input.format.file_name(),
                input.format.mime_type().to_string(),
            )
            .await
        {
            Ok(text) => text,
            Err(e) => {
                warn!("Audio processing error: {}", e);
                return Ok(NutritionFacts::zero());
            }
        };

        info!(transcription = %transcription, "Transcribed audio");

        if transcription.trim().is_empty() {
            warn!("Transcription is empty, nothing to analyze");
            return Ok(NutritionFacts::zero());
        }

        Ok(self.estimate_from_description(&transcription).await)
    }
}

impl<LLM, UP, PP> Service<LLM, UP, PP>
where
    LLM: LLMClient,
{
    async fn estimate_from_description(&self, description: &str) -> NutritionFacts {
        let request = ChatRequest {
            system_prompt: TEXT_SYSTEM_PROMPT.to_string(),
            user_prompt: text_user_prompt(description),
            image_url: None,
            max_tokens: self.config.llm.max_tokens,
        };

        self.estimate(request).await
    }

    async fn estimate(&self, request: ChatRequest) -> NutritionFacts {
        let raw_response = match self.llm_client.complete_chat(request).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("LLM API error: {}", e);
                return NutritionFacts::zero();
            }
        };

        tracing::debug!(raw_response = %raw_response, "Raw LLM response");

        match parse_nutrition_response(&raw_response) {
            Ok(estimate) => {
                info!(
                    meal_name = estimate.meal_name.as_deref().unwrap_or(""),
                    calories = estimate.facts.calories,
                    protein = estimate.facts.protein,
                    carbs = estimate.facts.carbs,
                    fats = estimate.facts.fats,
                    "Nutrition estimated"
                );
                estimate.facts
            }
            Err(e) => {
                warn!(raw_response = %raw_response, "Failed to parse LLM response: {}", e);
                NutritionFacts::zero()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{future::Future, pin::Pin};

    use super::*;
    use crate::domain::{
        common::{BillingConfig, FoodScannerConfig, LLMConfig},
        nutrition::{entities::AudioFormat, ports::MockLLMClient},
        subscription::ports::{MockPaymentProvider, MockUserProfileRepository},
    };

    type Reply<T> = Pin<Box<dyn Future<Output = Result<T, CoreError>> + Send>>;

    fn reply<T: Send + 'static>(result: Result<T, CoreError>) -> Reply<T> {
        Box::pin(async move { result })
    }

    fn answering(answer: &'static str) -> MockLLMClient {
        let mut llm = MockLLMClient::new();
        llm.expect_complete_chat()
            .times(1)
            .returning(move |_| reply(Ok(answer.to_string())));
        llm
    }

    fn config() -> FoodScannerConfig {
        FoodScannerConfig {
            llm: LLMConfig {
                api_key: "sk-test".to_string(),
                base_url: "http://localhost".to_string(),
                chat_model: "gpt-4o-mini".to_string(),
                transcription_model: "whisper-1".to_string(),
                max_tokens: 100,
            },
            billing: BillingConfig {
                secret_key: String::new(),
                base_url: "http://localhost".to_string(),
                webhook_secret: None,
                webhook_tolerance_secs: 300,
                monthly_price_id: None,
                yearly_price_id: None,
                success_url: String::new(),
                cancel_url: String::new(),
                portal_return_url: String::new(),
            },
            profile_store: None,
        }
    }

    fn service(
        llm: MockLLMClient,
    ) -> Service<MockLLMClient, MockUserProfileRepository, MockPaymentProvider> {
        Service::new(
            config(),
            llm,
            MockUserProfileRepository::new(),
            MockPaymentProvider::new(),
        )
    }

    #[tokio::test]
    async fn test_analyze_text_parses_model_answer() {
        let mut llm = MockLLMClient::new();
        llm.expect_complete_chat()
            .withf(|request: &ChatRequest| {
                request.max_tokens == 100
                    && request.image_url.is_none()
                    && request.system_prompt == TEXT_SYSTEM_PROMPT
                    && request.user_prompt.contains("a bowl of oatmeal with banana")
            })
            .times(1)
            .returning(|_| {
                reply(Ok(
                    "```json\n{\"calories\": 320, \"protein\": 12, \"carbs\": 54, \"fats\": 6}\n```"
                        .to_string(),
                ))
            });

        let facts = service(llm)
            .analyze_text(AnalyzeTextInput {
                text: "a bowl of oatmeal with banana".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(facts.calories, 320);
        assert_eq!(facts.fats, 6);
    }

    #[tokio::test]
    async fn test_analyze_text_rejects_blank_input() {
        let mut llm = MockLLMClient::new();
        llm.expect_complete_chat().never();

        let result = service(llm)
            .analyze_text(AnalyzeTextInput {
                text: "   ".to_string(),
            })
            .await;

        assert_eq!(
            result,
            Err(CoreError::Invalid("No text description provided".to_string()))
        );
    }

    #[tokio::test]
    async fn test_analyze_image_builds_data_url() {
        let mut llm = MockLLMClient::new();
        llm.expect_complete_chat()
            .withf(|request: &ChatRequest| {
                request.system_prompt == IMAGE_SYSTEM_PROMPT
                    && request.image_url.as_deref() == Some("data:image/jpeg;base64,aGVsbG8=")
            })
            .times(1)
            .returning(|_| {
                reply(Ok(
                    r#"{"calories": 600, "protein": 30, "carbs": 70, "fats": 20}"#.to_string(),
                ))
            });

        let facts = service(llm)
            .analyze_image(AnalyzeImageInput {
                image_base64: "aGVsbG8=".to_string(),
                filename: None,
            })
            .await
            .unwrap();

        assert_eq!(facts.calories, 600);
    }

    #[tokio::test]
    async fn test_analyze_image_keeps_existing_data_url() {
        let mut llm = MockLLMClient::new();
        llm.expect_complete_chat()
            .withf(|request: &ChatRequest| {
                request.image_url.as_deref() == Some("data:image/png;base64,aGVsbG8=")
            })
            .times(1)
            .returning(|_| reply(Ok(r#"{"calories": 90}"#.to_string())));

        let facts = service(llm)
            .analyze_image(AnalyzeImageInput {
                image_base64: " data:image/png;base64,aGVsbG8= ".to_string(),
                filename: Some("snack.png".to_string()),
            })
            .await
            .unwrap();

        assert_eq!(facts.calories, 90);
    }

    #[tokio::test]
    async fn test_provider_failure_degrades_to_zero() {
        let mut llm = MockLLMClient::new();
        llm.expect_complete_chat()
            .times(1)
            .returning(|_| reply(Err(CoreError::ExternalServiceError("boom".to_string()))));

        let facts = service(llm)
            .analyze_image(AnalyzeImageInput {
                image_base64: "aGVsbG8=".to_string(),
                filename: Some("lunch.jpg".to_string()),
            })
            .await
            .unwrap();

        assert!(facts.is_zero());
    }

    #[tokio::test]
    async fn test_unparseable_answer_degrades_to_zero() {
        let facts = service(answering("I can't tell what this is."))
            .analyze_text(AnalyzeTextInput {
                text: "mystery stew".to_string(),
            })
            .await
            .unwrap();

        assert!(facts.is_zero());
    }

    #[tokio::test]
    async fn test_analyze_audio_runs_text_path_on_transcription() {
        let mut llm = MockLLMClient::new();
        llm.expect_transcribe_audio()
            .withf(|audio: &Bytes, file_name: &String, mime_type: &String| {
                audio[..] == b"fake audio"[..]
                    && file_name == "audio.wav"
                    && mime_type == "audio/wav"
            })
            .times(1)
            .returning(|_, _, _| reply(Ok("a bowl of oatmeal".to_string())));
        llm.expect_complete_chat()
            .withf(|request: &ChatRequest| request.user_prompt.contains("a bowl of oatmeal"))
            .times(1)
            .returning(|_| {
                reply(Ok(
                    r#"{"calories": "one hundred fifty", "protein": 5, "carbs": 27, "fats": 3}"#
                        .to_string(),
                ))
            });

        let facts = service(llm)
            .analyze_audio(AnalyzeAudioInput {
                audio_base64: general_purpose::STANDARD.encode(b"fake audio"),
                format: AudioFormat::Wav,
            })
            .await
            .unwrap();

        assert_eq!(facts.calories, 150);
    }

    #[tokio::test]
    async fn test_analyze_audio_with_empty_transcription_is_zero() {
        let mut llm = MockLLMClient::new();
        llm.expect_transcribe_audio()
            .times(1)
            .returning(|_, _, _| reply(Ok("  ".to_string())));
        llm.expect_complete_chat().never();

        let facts = service(llm)
            .analyze_audio(AnalyzeAudioInput {
                audio_base64: general_purpose::STANDARD.encode(b"silence"),
                format: AudioFormat::Mp3,
            })
            .await
            .unwrap();

        assert!(facts.is_zero());
    }

    #[tokio::test]
    async fn test_analyze_audio_with_bad_base64_is_zero() {
        let mut llm = MockLLMClient::new();
        llm.expect_transcribe_audio().never();
        llm.expect_complete_chat().never();

        let facts = service(llm)
            .analyze_audio(AnalyzeAudioInput {
                audio_base64: "not base64!!".to_string(),
                format: AudioFormat::Mp3,
            })
            .await
            .unwrap();

        assert!(facts.is_zero());
    }
}
