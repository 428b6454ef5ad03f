use crate::domain::nutrition::entities::AudioFormat;

#[derive(Debug, Clone)]
pub struct AnalyzeImageInput {
    /// Base64 image payload, or a complete `data:` URL.
    pub image_base64: String,
    pub filename: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AnalyzeTextInput {
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct AnalyzeAudioInput {
    pub audio_base64: String,
    pub format: AudioFormat,
}

/// One chat completion call against the configured model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    pub image_url: Option<String>,
    pub max_tokens: u32,
}
