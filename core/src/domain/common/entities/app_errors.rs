use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("Not found")]
    NotFound,

    #[error("{0}")]
    Invalid(String),

    #[error("Invalid tier. Must be 'monthly' or 'yearly'")]
    InvalidTier,

    #[error("Price ID not configured for tier: {0}")]
    PriceNotConfigured(String),

    #[error("User profile not found for {0}. User must complete signup before subscribing.")]
    ProfileNotFound(String),

    #[error("No Stripe customer found for this user")]
    CustomerNotFound,

    #[error("Profile store not initialized")]
    ProfileStoreUnavailable,

    #[error("Webhook secret not configured")]
    WebhookSecretMissing,

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Invalid webhook payload: {0}")]
    InvalidWebhookPayload(String),

    #[error("External service error: {0}")]
    ExternalServiceError(String),

    #[error("Internal server error")]
    InternalServerError,
}
