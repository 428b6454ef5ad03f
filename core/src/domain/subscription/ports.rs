use std::future::Future;

use crate::domain::{
    common::entities::app_errors::CoreError,
    subscription::{
        entities::{CheckoutSession, PortalSession, ProfileUpdate, SubscriptionSnapshot, UserProfile},
        value_objects::{
            CheckoutSessionRequest, CreateCheckoutInput, CreateCustomerInput, CreatePortalInput,
            HandleWebhookInput,
        },
    },
};

/// Repository trait for the hosted user profile table
#[cfg_attr(test, mockall::automock)]
pub trait UserProfileRepository: Send + Sync {
    /// False when no store credentials were configured.
    fn is_available(&self) -> bool;

    fn get_by_uid(
        &self,
        uid: String,
    ) -> impl Future<Output = Result<Option<UserProfile>, CoreError>> + Send;

    fn update_by_uid(
        &self,
        uid: String,
        update: ProfileUpdate,
    ) -> impl Future<Output = Result<(), CoreError>> + Send;

    fn update_by_subscription_id(
        &self,
        subscription_id: String,
        update: ProfileUpdate,
    ) -> impl Future<Output = Result<(), CoreError>> + Send;
}

/// Port for the payment processor
#[cfg_attr(test, mockall::automock)]
pub trait PaymentProvider: Send + Sync {
    /// Creates a customer and returns its identifier.
    fn create_customer(
        &self,
        input: CreateCustomerInput,
    ) -> impl Future<Output = Result<String, CoreError>> + Send;

    /// Reads the `user_id` metadata stored on a customer.
    fn customer_user_id(
        &self,
        customer_id: String,
    ) -> impl Future<Output = Result<Option<String>, CoreError>> + Send;

    fn create_checkout_session(
        &self,
        input: CheckoutSessionRequest,
    ) -> impl Future<Output = Result<CheckoutSession, CoreError>> + Send;

    fn create_portal_session(
        &self,
        customer_id: String,
        return_url: String,
    ) -> impl Future<Output = Result<PortalSession, CoreError>> + Send;
}

/// Service trait for subscription billing
pub trait SubscriptionService: Send + Sync {
    fn create_checkout(
        &self,
        input: CreateCheckoutInput,
    ) -> impl Future<Output = Result<CheckoutSession, CoreError>> + Send;

    fn create_portal(
        &self,
        input: CreatePortalInput,
    ) -> impl Future<Output = Result<PortalSession, CoreError>> + Send;

    /// Never fails: any lookup problem yields [`SubscriptionSnapshot::free`].
    fn get_subscription_status(
        &self,
        user_id: String,
    ) -> impl Future<Output = SubscriptionSnapshot> + Send;

    fn handle_webhook(
        &self,
        input: HandleWebhookInput,
    ) -> impl Future<Output = Result<(), CoreError>> + Send;
}
