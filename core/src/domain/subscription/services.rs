use chrono::Utc;
use tracing::{error, info, warn};

use crate::domain::{
    common::{entities::app_errors::CoreError, services::Service},
    nutrition::ports::LLMClient,
    subscription::{
        entities::{
            CheckoutSession, PortalSession, ProfileUpdate, SubscriptionSnapshot,
            SubscriptionStatus, SubscriptionTier,
        },
        ports::{PaymentProvider, SubscriptionService, UserProfileRepository},
        value_objects::{
            CheckoutSessionRequest, CreateCheckoutInput, CreateCustomerInput, CreatePortalInput,
            HandleWebhookInput, PriceIds,
        },
        webhook::{
            BillingEvent, ProviderInvoice, ProviderSubscription, WebhookEvent,
            verify_webhook_signature,
        },
    },
};

impl<LLM, UP, PP> SubscriptionService for Service<LLM, UP, PP>
where
    LLM: LLMClient,
    UP: UserProfileRepository,
    PP: PaymentProvider,
{
    async fn create_checkout(
        &self,
        input: CreateCheckoutInput,
    ) -> Result<CheckoutSession, CoreError> {
        let tier = SubscriptionTier::purchasable(&input.tier).ok_or(CoreError::InvalidTier)?;

        let price_id = self
            .price_ids()
            .for_tier(tier)
            .map(str::to_string)
            .ok_or_else(|| CoreError::PriceNotConfigured(tier.to_string()))?;

        let customer_id = self.get_or_create_customer(&input.user_id).await?;

        let session = self
            .payment_provider
            .create_checkout_session(CheckoutSessionRequest {
                customer_id,
                price_id,
                user_id: input.user_id.clone(),
                tier,
                success_url: self.config.billing.success_url.clone(),
                cancel_url: self.config.billing.cancel_url.clone(),
            })
            .await
            .map_err(|e| {
                error!("Error creating checkout session: {}", e);
                e
            })?;

        info!(
            user_id = %input.user_id,
            session_id = %session.session_id,
            tier = %tier,
            "Checkout session created"
        );

        Ok(session)
    }

    async fn create_portal(&self, input: CreatePortalInput) -> Result<PortalSession, CoreError> {
        let profile = self
            .user_profile_repository
            .get_by_uid(input.user_id.clone())
            .await?;

        let customer_id = profile
            .and_then(|p| p.stripe_customer_id)
            .filter(|id| !id.is_empty())
            .ok_or(CoreError::CustomerNotFound)?;

        self.payment_provider
            .create_portal_session(
                customer_id,
                self.config.billing.portal_return_url.clone(),
            )
            .await
            .map_err(|e| {
                error!("Error creating portal session: {}", e);
                e
            })
    }

    async fn get_subscription_status(&self, user_id: String) -> SubscriptionSnapshot {
        if !self.user_profile_repository.is_available() {
            warn!("Profile store not initialized, returning free tier");
            return SubscriptionSnapshot::free();
        }

        match self.user_profile_repository.get_by_uid(user_id.clone()).await {
            Ok(Some(profile)) => SubscriptionSnapshot::from_profile(profile, Utc::now()),
            Ok(None) => {
                info!(user_id = %user_id, "User profile not found, returning free tier");
                SubscriptionSnapshot::free()
            }
            Err(e) => {
                error!("Error getting subscription status: {}", e);
                SubscriptionSnapshot::free()
            }
        }
    }

    async fn handle_webhook(&self, input: HandleWebhookInput) -> Result<(), CoreError> {
        let secret = self
            .config
            .billing
            .webhook_secret
            .as_deref()
            .filter(|secret| !secret.is_empty())
            .ok_or(CoreError::WebhookSecretMissing)?;

        let signature = input.signature.as_deref().unwrap_or_default();

        verify_webhook_signature(
            &input.payload,
            signature,
            secret,
            self.config.billing.webhook_tolerance_secs,
            Utc::now().timestamp(),
        )
        .map_err(|e| {
            warn!("Webhook signature verification failed: {}", e);
            CoreError::InvalidSignature
        })?;

        let event: WebhookEvent = serde_json::from_slice(&input.payload)
            .map_err(|e| CoreError::InvalidWebhookPayload(e.to_string()))?;

        info!(event_id = %event.id, event_type = %event.event_type, "Processing webhook event");

        let event = BillingEvent::try_from(event)
            .map_err(|e| CoreError::InvalidWebhookPayload(e.to_string()))?;

        match event {
            BillingEvent::SubscriptionCreated(subscription) => {
                self.on_subscription_created(subscription).await
            }
            BillingEvent::SubscriptionUpdated(subscription) => {
                self.on_subscription_updated(subscription).await
            }
            BillingEvent::SubscriptionDeleted(subscription) => {
                self.on_subscription_deleted(subscription).await
            }
            BillingEvent::PaymentSucceeded(invoice) => {
                self.on_invoice(invoice, SubscriptionStatus::Active).await
            }
            BillingEvent::PaymentFailed(invoice) => {
                self.on_invoice(invoice, SubscriptionStatus::PastDue).await
            }
            BillingEvent::Unhandled(event_type) => {
                info!("Unhandled webhook event type: {}", event_type);
                Ok(())
            }
        }
    }
}

impl<LLM, UP, PP> Service<LLM, UP, PP>
where
    UP: UserProfileRepository,
    PP: PaymentProvider,
{
    fn price_ids(&self) -> PriceIds {
        PriceIds {
            monthly: self.config.billing.monthly_price_id.clone(),
            yearly: self.config.billing.yearly_price_id.clone(),
        }
    }

    async fn get_or_create_customer(&self, user_id: &str) -> Result<String, CoreError> {
        if !self.user_profile_repository.is_available() {
            return Err(CoreError::ProfileStoreUnavailable);
        }

        let profile = self
            .user_profile_repository
            .get_by_uid(user_id.to_string())
            .await?
            .ok_or_else(|| CoreError::ProfileNotFound(user_id.to_string()))?;

        if let Some(customer_id) = profile.stripe_customer_id.filter(|id| !id.is_empty()) {
            return Ok(customer_id);
        }

        let customer_id = self
            .payment_provider
            .create_customer(CreateCustomerInput {
                user_id: user_id.to_string(),
                email: profile.email,
                name: profile.full_name,
            })
            .await?;

        self.user_profile_repository
            .update_by_uid(
                user_id.to_string(),
                ProfileUpdate {
                    stripe_customer_id: Some(customer_id.clone()),
                    ..Default::default()
                },
            )
            .await?;

        info!(user_id = %user_id, customer_id = %customer_id, "Created payment customer");

        Ok(customer_id)
    }

    async fn on_subscription_created(
        &self,
        subscription: ProviderSubscription,
    ) -> Result<(), CoreError> {
        let user_id = match subscription.user_id() {
            Some(user_id) => Some(user_id.to_string()),
            None => match subscription.customer.clone() {
                Some(customer_id) => self.payment_provider.customer_user_id(customer_id).await?,
                None => None,
            },
        };

        let Some(user_id) = user_id else {
            warn!(
                subscription_id = %subscription.id,
                "Could not find user_id for subscription"
            );
            return Ok(());
        };

        let tier = subscription
            .first_price_id()
            .map(|price_id| self.price_ids().tier_of(price_id))
            .unwrap_or(SubscriptionTier::Unknown);

        let status = if subscription.status == "trialing" {
            SubscriptionStatus::Trialing
        } else {
            SubscriptionStatus::Active
        };

        self.user_profile_repository
            .update_by_uid(
                user_id.clone(),
                ProfileUpdate {
                    subscription_status: Some(status),
                    subscription_tier: Some(Some(tier)),
                    stripe_subscription_id: Some(Some(subscription.id.clone())),
                    subscription_start_date: subscription.period_start(),
                    subscription_end_date: subscription.period_end(),
                    trial_ends_at: Some(subscription.trial_end()),
                    ..Default::default()
                },
            )
            .await?;

        info!(
            user_id = %user_id,
            status = %status,
            tier = %tier,
            "Subscription created"
        );
        Ok(())
    }

    async fn on_subscription_updated(
        &self,
        subscription: ProviderSubscription,
    ) -> Result<(), CoreError> {
        let status = SubscriptionStatus::from_provider_status(&subscription.status);

        self.user_profile_repository
            .update_by_subscription_id(
                subscription.id.clone(),
                ProfileUpdate {
                    subscription_status: Some(status),
                    subscription_end_date: subscription.period_end(),
                    trial_ends_at: Some(subscription.trial_end()),
                    ..Default::default()
                },
            )
            .await?;

        info!(subscription_id = %subscription.id, status = %status, "Subscription updated");
        Ok(())
    }

    async fn on_subscription_deleted(
        &self,
        subscription: ProviderSubscription,
    ) -> Result<(), CoreError> {
        self.user_profile_repository
            .update_by_subscription_id(
                subscription.id.clone(),
                ProfileUpdate {
                    subscription_status: Some(SubscriptionStatus::Canceled),
                    subscription_tier: Some(None),
                    stripe_subscription_id: Some(None),
                    ..Default::default()
                },
            )
            .await?;

        info!(subscription_id = %subscription.id, "Subscription canceled");
        Ok(())
    }

    async fn on_invoice(
        &self,
        invoice: ProviderInvoice,
        status: SubscriptionStatus,
    ) -> Result<(), CoreError> {
        let Some(subscription_id) = invoice.subscription_id() else {
            info!("Invoice is not tied to a subscription, ignoring");
            return Ok(());
        };

        self.user_profile_repository
            .update_by_subscription_id(subscription_id.to_string(), ProfileUpdate::status(status))
            .await?;

        info!(
            subscription_id = %subscription_id,
            status = %status,
            "Invoice payment processed"
        );
        Ok(())
    }
}
