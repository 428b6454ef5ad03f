use clap::{ArgAction, Parser, builder::BoolishValueParser};
use foodscanner_core::domain::{
    common::{
        BillingConfig, DEFAULT_OPENAI_BASE_URL, DEFAULT_STRIPE_BASE_URL, FoodScannerConfig,
        LLMConfig, ProfileStoreConfig,
    },
    subscription::webhook::DEFAULT_TOLERANCE_SECS,
};

#[derive(Debug, Clone, Parser)]
#[command(name = "foodscanner-api", version, about = "Nutrition estimation and subscription API")]
pub struct Args {
    #[command(flatten)]
    pub log: LogArgs,

    #[command(flatten)]
    pub server: ServerArgs,

    #[command(flatten)]
    pub openai: OpenAiArgs,

    #[command(flatten)]
    pub stripe: StripeArgs,

    #[command(flatten)]
    pub supabase: SupabaseArgs,

    #[command(flatten)]
    pub auth: AuthArgs,
}

#[derive(Debug, Clone, clap::Args)]
pub struct LogArgs {
    #[arg(long = "log-filter", env = "LOG_FILTER", default_value = "info")]
    pub filter: String,

    #[arg(
        long = "log-json",
        env = "LOG_JSON",
        action = ArgAction::Set,
        value_parser = BoolishValueParser::new(),
        default_value = "false"
    )]
    pub json: bool,
}

#[derive(Debug, Clone, clap::Args)]
pub struct ServerArgs {
    #[arg(long = "server-host", env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long = "server-port", env = "PORT", default_value_t = 8000)]
    pub port: u16,

    #[arg(long = "server-root-path", env = "SERVER_ROOT_PATH", default_value = "")]
    pub root_path: String,

    /// Origins allowed by CORS; `*` allows any origin.
    #[arg(
        long = "allowed-origins",
        env = "ALLOWED_ORIGINS",
        value_delimiter = ',',
        default_value = "*"
    )]
    pub allowed_origins: Vec<String>,

    /// Gate the analyze routes behind an active subscription.
    #[arg(
        long = "require-subscription",
        env = "REQUIRE_SUBSCRIPTION",
        action = ArgAction::Set,
        value_parser = BoolishValueParser::new(),
        default_value = "false"
    )]
    pub require_subscription: bool,
}

#[derive(Debug, Clone, clap::Args)]
pub struct OpenAiArgs {
    #[arg(long = "openai-api-key", env = "OPENAI_API_KEY", default_value = "", hide_env_values = true)]
    pub api_key: String,

    #[arg(id = "openai_base_url", long = "openai-base-url", env = "OPENAI_BASE_URL", default_value = DEFAULT_OPENAI_BASE_URL)]
    pub base_url: String,

    #[arg(long = "openai-chat-model", env = "OPENAI_CHAT_MODEL", default_value = "gpt-4o-mini")]
    pub chat_model: String,

    #[arg(
        long = "openai-transcription-model",
        env = "OPENAI_TRANSCRIPTION_MODEL",
        default_value = "whisper-1"
    )]
    pub transcription_model: String,

    #[arg(long = "openai-max-tokens", env = "OPENAI_MAX_TOKENS", default_value_t = 100)]
    pub max_tokens: u32,
}

#[derive(Debug, Clone, clap::Args)]
pub struct StripeArgs {
    #[arg(long = "stripe-secret-key", env = "STRIPE_SECRET_KEY", default_value = "", hide_env_values = true)]
    pub secret_key: String,

    #[arg(id = "stripe_base_url", long = "stripe-base-url", env = "STRIPE_API_BASE", default_value = DEFAULT_STRIPE_BASE_URL)]
    pub base_url: String,

    #[arg(long = "stripe-webhook-secret", env = "STRIPE_WEBHOOK_SECRET", hide_env_values = true)]
    pub webhook_secret: Option<String>,

    #[arg(
        long = "stripe-webhook-tolerance",
        env = "STRIPE_WEBHOOK_TOLERANCE",
        default_value_t = DEFAULT_TOLERANCE_SECS
    )]
    pub webhook_tolerance_secs: i64,

    #[arg(long = "stripe-monthly-price-id", env = "STRIPE_MONTHLY_PRICE_ID")]
    pub monthly_price_id: Option<String>,

    #[arg(long = "stripe-yearly-price-id", env = "STRIPE_YEARLY_PRICE_ID")]
    pub yearly_price_id: Option<String>,

    #[arg(
        long = "checkout-success-url",
        env = "CHECKOUT_SUCCESS_URL",
        default_value = "foodscanner://subscription/success?session_id={CHECKOUT_SESSION_ID}"
    )]
    pub success_url: String,

    #[arg(
        long = "checkout-cancel-url",
        env = "CHECKOUT_CANCEL_URL",
        default_value = "foodscanner://subscription/cancel"
    )]
    pub cancel_url: String,

    #[arg(
        long = "portal-return-url",
        env = "PORTAL_RETURN_URL",
        default_value = "foodscanner://subscription/manage"
    )]
    pub portal_return_url: String,
}

#[derive(Debug, Clone, clap::Args)]
pub struct SupabaseArgs {
    #[arg(long = "supabase-url", env = "SUPABASE_URL")]
    pub url: Option<String>,

    #[arg(long = "supabase-service-role-key", env = "SUPABASE_SERVICE_ROLE_KEY", hide_env_values = true)]
    pub service_role_key: Option<String>,

    #[arg(long = "supabase-anon-key", env = "SUPABASE_ANON_KEY", hide_env_values = true)]
    pub anon_key: Option<String>,
}

#[derive(Debug, Clone, clap::Args)]
pub struct AuthArgs {
    #[arg(long = "supabase-jwt-secret", env = "SUPABASE_JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: Option<String>,
}

impl From<Args> for FoodScannerConfig {
    fn from(args: Args) -> Self {
        FoodScannerConfig {
            llm: LLMConfig {
                api_key: args.openai.api_key,
                base_url: args.openai.base_url,
                chat_model: args.openai.chat_model,
                transcription_model: args.openai.transcription_model,
                max_tokens: args.openai.max_tokens,
            },
            billing: BillingConfig {
                secret_key: args.stripe.secret_key,
                base_url: args.stripe.base_url,
                webhook_secret: args.stripe.webhook_secret.filter(|s| !s.is_empty()),
                webhook_tolerance_secs: args.stripe.webhook_tolerance_secs,
                monthly_price_id: args.stripe.monthly_price_id,
                yearly_price_id: args.stripe.yearly_price_id,
                success_url: args.stripe.success_url,
                cancel_url: args.stripe.cancel_url,
                portal_return_url: args.stripe.portal_return_url,
            },
            profile_store: ProfileStoreConfig::from_parts(
                args.supabase.url,
                args.supabase.service_role_key,
                args.supabase.anon_key,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_map_onto_core_config() {
        let args = Args::try_parse_from([
            "foodscanner-api",
            "--openai-api-key",
            "sk-test",
            "--openai-max-tokens",
            "200",
            "--stripe-webhook-secret",
            "",
            "--stripe-monthly-price-id",
            "price_m",
            "--supabase-url",
            "https://project.supabase.co",
            "--supabase-anon-key",
            "anon",
            "--supabase-service-role-key",
            "",
        ])
        .unwrap();

        let config = FoodScannerConfig::from(args);
        assert_eq!(config.llm.api_key, "sk-test");
        assert_eq!(config.llm.max_tokens, 200);
        assert_eq!(config.billing.webhook_secret, None);
        assert_eq!(config.billing.monthly_price_id.as_deref(), Some("price_m"));
        assert_eq!(config.profile_store.unwrap().key, "anon");
    }

    #[test]
    fn test_origins_and_subscription_gate() {
        let args = Args::try_parse_from([
            "foodscanner-api",
            "--allowed-origins",
            "https://a.example,https://b.example",
            "--require-subscription",
            "true",
        ])
        .unwrap();

        assert_eq!(
            args.server.allowed_origins,
            vec!["https://a.example", "https://b.example"]
        );
        assert!(args.server.require_subscription);
    }
}
