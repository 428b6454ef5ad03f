pub mod billing;
pub mod llm;
pub mod user_profile;
