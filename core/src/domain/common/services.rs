use std::sync::Arc;

use crate::domain::common::FoodScannerConfig;

/// Application service wiring the outbound ports together.
///
/// The business traits (`NutritionService`, `SubscriptionService`) are
/// implemented on this type in their own domain modules.
pub struct Service<LLM, UP, PP> {
    pub(crate) config: Arc<FoodScannerConfig>,
    pub(crate) llm_client: Arc<LLM>,
    pub(crate) user_profile_repository: Arc<UP>,
    pub(crate) payment_provider: Arc<PP>,
}

impl<LLM, UP, PP> Service<LLM, UP, PP> {
    pub fn new(
        config: FoodScannerConfig,
        llm_client: LLM,
        user_profile_repository: UP,
        payment_provider: PP,
    ) -> Self {
        Self {
            config: Arc::new(config),
            llm_client: Arc::new(llm_client),
            user_profile_repository: Arc::new(user_profile_repository),
            payment_provider: Arc::new(payment_provider),
        }
    }

    pub fn config(&self) -> &FoodScannerConfig {
        &self.config
    }
}

impl<LLM, UP, PP> Clone for Service<LLM, UP, PP> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            llm_client: Arc::clone(&self.llm_client),
            user_profile_repository: Arc::clone(&self.user_profile_repository),
            payment_provider: Arc::clone(&self.payment_provider),
        }
    }
}
