pub mod entities;
pub mod services;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_STRIPE_BASE_URL: &str = "https://api.stripe.com/v1";

#[derive(Clone, Debug)]
pub struct FoodScannerConfig {
    pub llm: LLMConfig,
    pub billing: BillingConfig,
    pub profile_store: Option<ProfileStoreConfig>,
}

#[derive(Clone, Debug)]
pub struct LLMConfig {
    pub api_key: String,
    pub base_url: String,
    pub chat_model: String,
    pub transcription_model: String,
    pub max_tokens: u32,
}

#[derive(Clone, Debug)]
pub struct BillingConfig {
    pub secret_key: String,
    pub base_url: String,
    pub webhook_secret: Option<String>,
    /// Allowed clock skew between the `t=` stamp of a webhook and now.
    pub webhook_tolerance_secs: i64,
    pub monthly_price_id: Option<String>,
    pub yearly_price_id: Option<String>,
    pub success_url: String,
    pub cancel_url: String,
    pub portal_return_url: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProfileStoreKeyKind {
    ServiceRole,
    Anon,
}

#[derive(Clone, Debug)]
pub struct ProfileStoreConfig {
    pub url: String,
    pub key: String,
    pub key_kind: ProfileStoreKeyKind,
}

impl ProfileStoreConfig {
    /// Builds the store config, preferring the service role key so backend
    /// writes are not filtered by row level security.
    pub fn from_parts(
        url: Option<String>,
        service_role_key: Option<String>,
        anon_key: Option<String>,
    ) -> Option<Self> {
        let url = url.filter(|u| !u.trim().is_empty())?;

        let (key, key_kind) = match (
            service_role_key.filter(|k| !k.is_empty()),
            anon_key.filter(|k| !k.is_empty()),
        ) {
            (Some(key), _) => (key, ProfileStoreKeyKind::ServiceRole),
            (None, Some(key)) => (key, ProfileStoreKeyKind::Anon),
            (None, None) => return None,
        };

        Some(Self { url, key, key_kind })
    }
}
