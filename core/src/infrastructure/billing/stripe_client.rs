use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};
use std::collections::HashMap;

use crate::domain::{
    common::{BillingConfig, entities::app_errors::CoreError},
    subscription::{
        entities::{CheckoutSession, PortalSession},
        ports::PaymentProvider,
        value_objects::{CheckoutSessionRequest, CreateCustomerInput},
    },
};

/// Payment provider adapter speaking the form-encoded Stripe REST API.
#[derive(Debug, Clone)]
pub struct StripeClient {
    secret_key: String,
    base_url: String,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct StripeCustomer {
    id: String,
    #[serde(default)]
    deleted: bool,
    #[serde(default)]
    metadata: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct StripeCheckoutSession {
    id: String,
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StripePortalSession {
    url: String,
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeError,
}

#[derive(Debug, Deserialize)]
struct StripeError {
    #[serde(default)]
    message: Option<String>,
    #[serde(default, rename = "type")]
    error_type: Option<String>,
}

type FormParams = Vec<(&'static str, String)>;

impl StripeClient {
    pub fn new(config: &BillingConfig) -> Self {
        Self {
            secret_key: config.secret_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    fn customer_form(input: &CreateCustomerInput) -> FormParams {
        let mut params = vec![("metadata[user_id]", input.user_id.clone())];
        if let Some(email) = input.email.as_ref().filter(|e| !e.is_empty()) {
            params.push(("email", email.clone()));
        }
        if let Some(name) = input.name.as_ref().filter(|n| !n.is_empty()) {
            params.push(("name", name.clone()));
        }
        params
    }

    fn checkout_form(input: &CheckoutSessionRequest) -> FormParams {
        vec![
            ("customer", input.customer_id.clone()),
            ("mode", "subscription".to_string()),
            ("line_items[0][price]", input.price_id.clone()),
            ("line_items[0][quantity]", "1".to_string()),
            ("success_url", input.success_url.clone()),
            ("cancel_url", input.cancel_url.clone()),
            ("metadata[user_id]", input.user_id.clone()),
            ("metadata[tier]", input.tier.to_string()),
        ]
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        operation: &str,
    ) -> Result<T, CoreError> {
        let response = request
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Stripe request failed ({}): {}", operation, e);
                CoreError::ExternalServiceError(format!("Failed to {}: {}", operation, e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<StripeErrorBody>(&error_text)
                .ok()
                .and_then(|body| body.error.message.or(body.error.error_type))
                .unwrap_or(error_text);
            tracing::error!("Stripe error ({}): {} - {}", operation, status, message);
            return Err(CoreError::ExternalServiceError(format!(
                "Failed to {}: {}",
                operation, message
            )));
        }

        response.json::<T>().await.map_err(|e| {
            tracing::error!("Failed to parse Stripe response ({}): {}", operation, e);
            CoreError::ExternalServiceError(format!("Failed to {}: {}", operation, e))
        })
    }
}

impl PaymentProvider for StripeClient {
    async fn create_customer(&self, input: CreateCustomerInput) -> Result<String, CoreError> {
        let request = self
            .client
            .post(format!("{}/customers", self.base_url))
            .form(&Self::customer_form(&input));

        let customer: StripeCustomer = self.send(request, "create customer").await?;
        Ok(customer.id)
    }

    async fn customer_user_id(&self, customer_id: String) -> Result<Option<String>, CoreError> {
        let request = self.client.get(format!(
            "{}/customers/{}",
            self.base_url,
            urlencoding::encode(&customer_id)
        ));

        let customer: StripeCustomer = self.send(request, "retrieve customer").await?;
        if customer.deleted {
            tracing::warn!(customer_id = %customer.id, "Customer has been deleted");
            return Ok(None);
        }

        Ok(customer.metadata.get("user_id").cloned())
    }

    async fn create_checkout_session(
        &self,
        input: CheckoutSessionRequest,
    ) -> Result<CheckoutSession, CoreError> {
        let request = self
            .client
            .post(format!("{}/checkout/sessions", self.base_url))
            .form(&Self::checkout_form(&input));

        let session: StripeCheckoutSession =
            self.send(request, "create checkout session").await?;

        let checkout_url = session.url.ok_or_else(|| {
            CoreError::ExternalServiceError("Checkout session has no URL".to_string())
        })?;

        Ok(CheckoutSession {
            checkout_url,
            session_id: session.id,
        })
    }

    async fn create_portal_session(
        &self,
        customer_id: String,
        return_url: String,
    ) -> Result<PortalSession, CoreError> {
        let request = self
            .client
            .post(format!("{}/billing_portal/sessions", self.base_url))
            .form(&[("customer", customer_id), ("return_url", return_url)]);

        let session: StripePortalSession = self.send(request, "create portal session").await?;

        Ok(PortalSession {
            portal_url: session.url,
        })
    }
}
