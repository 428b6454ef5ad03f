use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, ToSchema, Validate)]
pub struct AnalyzeFoodImageRequest {
    /// Base64 image, optionally as a `data:` URL.
    #[validate(length(min = 1, message = "No image provided"))]
    pub image: String,
    #[serde(default)]
    #[schema(example = "image.jpg")]
    pub filename: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Validate)]
pub struct AnalyzeFoodTextRequest {
    #[validate(length(min = 1, message = "No text description provided"))]
    #[schema(example = "two scrambled eggs and a slice of toast")]
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Validate)]
pub struct AnalyzeFoodAudioRequest {
    /// Base64 audio recording.
    #[validate(length(min = 1, message = "No audio provided"))]
    pub audio: String,
    #[serde(default)]
    #[schema(example = "mp3")]
    pub format: Option<String>,
}
