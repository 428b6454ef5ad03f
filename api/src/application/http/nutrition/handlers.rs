pub mod analyze_food_audio;
pub mod analyze_food_image;
pub mod analyze_food_text;
