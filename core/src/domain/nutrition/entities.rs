use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Estimated nutrition of a meal. Macronutrients are in grams.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct NutritionFacts {
    pub calories: u32,
    pub protein: u32,
    pub carbs: u32,
    pub fats: u32,
}

impl NutritionFacts {
    pub const fn zero() -> Self {
        Self {
            calories: 0,
            protein: 0,
            carbs: 0,
            fats: 0,
        }
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::zero()
    }

    pub fn saturating_add(self, other: Self) -> Self {
        Self {
            calories: self.calories.saturating_add(other.calories),
            protein: self.protein.saturating_add(other.protein),
            carbs: self.carbs.saturating_add(other.carbs),
            fats: self.fats.saturating_add(other.fats),
        }
    }
}

/// A parsed model answer: the facts plus the meal name when the model gave one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MealEstimate {
    pub meal_name: Option<String>,
    pub facts: NutritionFacts,
}

/// Container formats accepted by the transcription endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    #[default]
    Mp3,
    Mp4,
    Mpeg,
    Mpga,
    M4a,
    Wav,
    Webm,
    Ogg,
    Flac,
}

impl AudioFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Mp4 => "mp4",
            AudioFormat::Mpeg => "mpeg",
            AudioFormat::Mpga => "mpga",
            AudioFormat::M4a => "m4a",
            AudioFormat::Wav => "wav",
            AudioFormat::Webm => "webm",
            AudioFormat::Ogg => "ogg",
            AudioFormat::Flac => "flac",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 | AudioFormat::Mpeg | AudioFormat::Mpga => "audio/mpeg",
            AudioFormat::Mp4 | AudioFormat::M4a => "audio/mp4",
            AudioFormat::Wav => "audio/wav",
            AudioFormat::Webm => "audio/webm",
            AudioFormat::Ogg => "audio/ogg",
            AudioFormat::Flac => "audio/flac",
        }
    }

    /// File name sent with the upload; the provider sniffs the format from it.
    pub fn file_name(&self) -> String {
        format!("audio.{}", self.as_str())
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AudioFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_start_matches('.').to_ascii_lowercase().as_str() {
            "mp3" => Ok(AudioFormat::Mp3),
            "mp4" => Ok(AudioFormat::Mp4),
            "mpeg" => Ok(AudioFormat::Mpeg),
            "mpga" => Ok(AudioFormat::Mpga),
            "m4a" => Ok(AudioFormat::M4a),
            "wav" => Ok(AudioFormat::Wav),
            "webm" => Ok(AudioFormat::Webm),
            "ogg" => Ok(AudioFormat::Ogg),
            "flac" => Ok(AudioFormat::Flac),
            other => Err(format!("Unsupported audio format: {other}")),
        }
    }
}
