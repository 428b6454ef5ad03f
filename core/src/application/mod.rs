use crate::{
    domain::common::{FoodScannerConfig, entities::app_errors::CoreError, services::Service},
    infrastructure::{
        billing::stripe_client::StripeClient, llm::openai_client::OpenAiClient,
        user_profile::repositories::supabase_user_profile_repository::SupabaseUserProfileRepository,
    },
};

pub type FoodScannerService = Service<OpenAiClient, SupabaseUserProfileRepository, StripeClient>;

pub async fn create_service(config: FoodScannerConfig) -> Result<FoodScannerService, CoreError> {
    if config.llm.api_key.is_empty() {
        tracing::warn!("OpenAI API key is empty, nutrition estimates will fall back to zero");
    }
    if config.billing.secret_key.is_empty() {
        tracing::warn!("Stripe secret key is empty, billing calls will fail");
    }

    let llm_client = OpenAiClient::new(&config.llm);
    let payment_provider = StripeClient::new(&config.billing);
    let user_profile_repository =
        SupabaseUserProfileRepository::new(config.profile_store.as_ref());

    Ok(Service::new(
        config,
        llm_client,
        user_profile_repository,
        payment_provider,
    ))
}
