use bytes::Bytes;
use reqwest::{
    Client,
    multipart::{Form, Part},
};
use serde::{Deserialize, Serialize};

use crate::domain::{
    common::{LLMConfig, entities::app_errors::CoreError},
    nutrition::{ports::LLMClient, value_objects::ChatRequest},
};

#[derive(Debug, Clone)]
pub struct OpenAiClient {
    api_key: String,
    base_url: String,
    chat_model: String,
    transcription_model: String,
    client: Client,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<Message>,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: MessageContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

impl OpenAiClient {
    pub fn new(config: &LLMConfig) -> Self {
        Self {
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            chat_model: config.chat_model.clone(),
            transcription_model: config.transcription_model.clone(),
            client: Client::new(),
        }
    }

    fn chat_body(&self, request: ChatRequest) -> ChatCompletionRequest {
        let user_content = match request.image_url {
            Some(url) => MessageContent::Parts(vec![
                ContentPart::Text {
                    text: request.user_prompt,
                },
                ContentPart::ImageUrl {
                    image_url: ImageUrl { url },
                },
            ]),
            None => MessageContent::Text(request.user_prompt),
        };

        ChatCompletionRequest {
            model: self.chat_model.clone(),
            messages: vec![
                Message {
                    role: "system",
                    content: MessageContent::Text(request.system_prompt),
                },
                Message {
                    role: "user",
                    content: user_content,
                },
            ],
            max_tokens: request.max_tokens,
        }
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, CoreError> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let error_text = response.text().await.unwrap_or_default();
        tracing::error!("OpenAI API error: {} - {}", status, error_text);
        Err(CoreError::ExternalServiceError(format!(
            "LLM API returned error: {} - {}",
            status, error_text
        )))
    }
}

impl LLMClient for OpenAiClient {
    async fn complete_chat(&self, request: ChatRequest) -> Result<String, CoreError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = self.chat_body(request);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("OpenAI API request failed: {}", e);
                CoreError::ExternalServiceError(format!("LLM API error: {}", e))
            })?;

        let completion: ChatCompletionResponse = Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| {
                tracing::error!("Failed to parse OpenAI response: {}", e);
                CoreError::ExternalServiceError(format!("Failed to parse LLM response: {}", e))
            })?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| CoreError::ExternalServiceError("No response from LLM".to_string()))
    }

    async fn transcribe_audio(
        &self,
        audio: Bytes,
        file_name: String,
        mime_type: String,
    ) -> Result<String, CoreError> {
        let url = format!("{}/audio/transcriptions", self.base_url);

        let file = Part::bytes(audio.to_vec())
            .file_name(file_name)
            .mime_str(&mime_type)
            .map_err(|e| CoreError::Invalid(format!("Invalid audio mime type: {}", e)))?;

        let form = Form::new()
            .text("model", self.transcription_model.clone())
            .part("file", file);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("OpenAI transcription request failed: {}", e);
                CoreError::ExternalServiceError(format!("Transcription API error: {}", e))
            })?;

        let transcription: TranscriptionResponse = Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| {
                tracing::error!("Failed to parse transcription response: {}", e);
                CoreError::ExternalServiceError(format!(
                    "Failed to parse transcription response: {}",
                    e
                ))
            })?;

        Ok(transcription.text)
    }
}
