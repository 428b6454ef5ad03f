use bytes::Bytes;

use crate::domain::subscription::entities::SubscriptionTier;

#[derive(Debug, Clone)]
pub struct CreateCheckoutInput {
    pub user_id: String,
    pub tier: String,
}

#[derive(Debug, Clone)]
pub struct CreatePortalInput {
    pub user_id: String,
}

#[derive(Debug, Clone)]
pub struct HandleWebhookInput {
    pub payload: Bytes,
    pub signature: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateCustomerInput {
    pub user_id: String,
    pub email: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSessionRequest {
    pub customer_id: String,
    pub price_id: String,
    pub user_id: String,
    pub tier: SubscriptionTier,
    pub success_url: String,
    pub cancel_url: String,
}

/// Configured price identifiers, one per purchasable tier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PriceIds {
    pub monthly: Option<String>,
    pub yearly: Option<String>,
}

impl PriceIds {
    pub fn for_tier(&self, tier: SubscriptionTier) -> Option<&str> {
        let price_id = match tier {
            SubscriptionTier::Monthly => self.monthly.as_deref(),
            SubscriptionTier::Yearly => self.yearly.as_deref(),
            SubscriptionTier::Unknown => None,
        };
        price_id.filter(|id| !id.is_empty())
    }

    pub fn tier_of(&self, price_id: &str) -> SubscriptionTier {
        if self.monthly.as_deref() == Some(price_id) {
            SubscriptionTier::Monthly
        } else if self.yearly.as_deref() == Some(price_id) {
            SubscriptionTier::Yearly
        } else {
            SubscriptionTier::Unknown
        }
    }
}
