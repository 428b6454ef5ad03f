//! Prompt templates sent to the chat model.

const RESPONSE_FORMAT: &str =
    r#"{"calories": number, "protein": grams, "carbs": grams, "fats": grams}"#;

pub const IMAGE_SYSTEM_PROMPT: &str = "You are a nutrition expert. Analyze food images and \
estimate nutritional values. Account for perspective distortion, plate size variations, camera \
angles, lighting conditions, and portion visibility. Consider that food may be partially hidden, \
stacked, or viewed from different angles. Return only a JSON object with calories, protein, \
carbs, and fats as integers (grams for macronutrients).";

pub const TEXT_SYSTEM_PROMPT: &str = "You are a nutrition expert. Analyze text descriptions of \
food and ingredients to estimate nutritional values. Parse quantities, ingredient names, and \
cooking methods. Use standard nutrition databases knowledge to calculate totals. Return only a \
JSON object with calories, protein, carbs, and fats as integers (grams for macronutrients).";

pub fn image_user_prompt() -> String {
    format!(
        "Estimate the nutritional content of this food. Consider perspective, portion size, and \
         any visual distortions. Return JSON format: {RESPONSE_FORMAT}"
    )
}

pub fn text_user_prompt(description: &str) -> String {
    format!(
        "Estimate the total nutritional content of this food description: \"{}\". Return JSON \
         format: {RESPONSE_FORMAT}",
        description.trim()
    )
}
