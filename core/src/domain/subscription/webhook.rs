//! Payment provider webhook events: signature check and typed payloads.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("malformed signature header")]
    MalformedHeader,

    #[error("missing timestamp in signature header")]
    MissingTimestamp,

    #[error("missing v1 signature in signature header")]
    MissingSignature,

    #[error("timestamp outside the tolerance window")]
    TimestampOutOfTolerance,

    #[error("no signature matches the payload")]
    Mismatch,
}

/// Verifies a `t=<unix>,v1=<hex>` signature header against the raw payload.
///
/// The signed content is `"{t}.{payload}"`, keyed with the endpoint secret.
/// Any of several `v1` entries may match (secret rotation).
pub fn verify_webhook_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    tolerance_secs: i64,
    now: i64,
) -> Result<(), SignatureError> {
    let mut timestamp: Option<i64> = None;
    let mut signatures: Vec<Vec<u8>> = Vec::new();

    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            return Err(SignatureError::MalformedHeader);
        };

        match key {
            "t" => {
                timestamp = Some(
                    value
                        .parse::<i64>()
                        .map_err(|_| SignatureError::MalformedHeader)?,
                )
            }
            // Undecodable entries cannot match, skip them like unknown schemes.
            "v1" => {
                if let Ok(signature) = hex::decode(value) {
                    signatures.push(signature);
                }
            }
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(SignatureError::MissingTimestamp)?;
    if signatures.is_empty() {
        return Err(SignatureError::MissingSignature);
    }

    if now.abs_diff(timestamp) > tolerance_secs.unsigned_abs() {
        return Err(SignatureError::TimestampOutOfTolerance);
    }

    let mac = signed_content_mac(payload, secret, timestamp)?;

    let matched = signatures
        .iter()
        .any(|signature| mac.clone().verify_slice(signature).is_ok());

    if matched {
        Ok(())
    } else {
        Err(SignatureError::Mismatch)
    }
}

/// Builds the header value a sender attaches to `payload`. Used to sign
/// fixtures and replayed events.
pub fn sign_webhook_payload(
    payload: &[u8],
    secret: &str,
    timestamp: i64,
) -> Result<String, SignatureError> {
    let mac = signed_content_mac(payload, secret, timestamp)?;

    Ok(format!(
        "t={},v1={}",
        timestamp,
        hex::encode(mac.finalize().into_bytes())
    ))
}

fn signed_content_mac(
    payload: &[u8],
    secret: &str,
    timestamp: i64,
) -> Result<HmacSha256, SignatureError> {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| SignatureError::Mismatch)?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(mac)
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: WebhookEventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEventData {
    pub object: serde_json::Value,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProviderSubscription {
    pub id: String,
    #[serde(default)]
    pub customer: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    #[serde(default)]
    pub items: SubscriptionItems,
    #[serde(default)]
    pub current_period_start: Option<i64>,
    #[serde(default)]
    pub current_period_end: Option<i64>,
    #[serde(default)]
    pub trial_end: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SubscriptionItems {
    #[serde(default)]
    pub data: Vec<SubscriptionItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SubscriptionItem {
    pub price: Price,
    #[serde(default)]
    pub current_period_start: Option<i64>,
    #[serde(default)]
    pub current_period_end: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Price {
    pub id: String,
}

impl ProviderSubscription {
    pub fn user_id(&self) -> Option<&str> {
        self.metadata
            .get("user_id")
            .map(String::as_str)
            .filter(|id| !id.is_empty())
    }

    pub fn first_price_id(&self) -> Option<&str> {
        self.items.data.first().map(|item| item.price.id.as_str())
    }

    // Newer API versions report billing periods on the items only.
    pub fn period_start(&self) -> Option<DateTime<Utc>> {
        self.current_period_start
            .or_else(|| self.items.data.first()?.current_period_start)
            .and_then(from_unix)
    }

    pub fn period_end(&self) -> Option<DateTime<Utc>> {
        self.current_period_end
            .or_else(|| self.items.data.first()?.current_period_end)
            .and_then(from_unix)
    }

    pub fn trial_end(&self) -> Option<DateTime<Utc>> {
        self.trial_end.and_then(from_unix)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProviderInvoice {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub subscription: Option<String>,
    #[serde(default)]
    pub parent: Option<InvoiceParent>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct InvoiceParent {
    #[serde(default)]
    pub subscription_details: Option<SubscriptionDetails>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SubscriptionDetails {
    #[serde(default)]
    pub subscription: Option<String>,
}

impl ProviderInvoice {
    pub fn subscription_id(&self) -> Option<&str> {
        self.subscription
            .as_deref()
            .or_else(|| {
                self.parent
                    .as_ref()?
                    .subscription_details
                    .as_ref()?
                    .subscription
                    .as_deref()
            })
            .filter(|id| !id.is_empty())
    }
}

/// Webhook events this service reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BillingEvent {
    SubscriptionCreated(ProviderSubscription),
    SubscriptionUpdated(ProviderSubscription),
    SubscriptionDeleted(ProviderSubscription),
    PaymentSucceeded(ProviderInvoice),
    PaymentFailed(ProviderInvoice),
    Unhandled(String),
}

impl TryFrom<WebhookEvent> for BillingEvent {
    type Error = serde_json::Error;

    fn try_from(event: WebhookEvent) -> Result<Self, Self::Error> {
        let object = event.data.object;

        let billing_event = match event.event_type.as_str() {
            "customer.subscription.created" => {
                BillingEvent::SubscriptionCreated(serde_json::from_value(object)?)
            }
            "customer.subscription.updated" => {
                BillingEvent::SubscriptionUpdated(serde_json::from_value(object)?)
            }
            "customer.subscription.deleted" => {
                BillingEvent::SubscriptionDeleted(serde_json::from_value(object)?)
            }
            "invoice.payment_succeeded" => {
                BillingEvent::PaymentSucceeded(serde_json::from_value(object)?)
            }
            "invoice.payment_failed" => BillingEvent::PaymentFailed(serde_json::from_value(object)?),
            _ => BillingEvent::Unhandled(event.event_type),
        };

        Ok(billing_event)
    }
}

fn from_unix(seconds: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(seconds, 0)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    const SECRET: &str = "whsec_test123secret456";
    const NOW: i64 = 1_700_000_000;

    #[test]
    fn test_valid_signature_is_accepted() {
        let payload = br#"{"type":"invoice.payment_succeeded"}"#;
        let header = sign_webhook_payload(payload, SECRET, NOW).unwrap();

        assert_eq!(
            verify_webhook_signature(payload, &header, SECRET, DEFAULT_TOLERANCE_SECS, NOW),
            Ok(())
        );
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let payload = br#"{"type":"invoice.payment_succeeded"}"#;
        let header = sign_webhook_payload(payload, "wrong_secret", NOW).unwrap();

        assert_eq!(
            verify_webhook_signature(payload, &header, SECRET, DEFAULT_TOLERANCE_SECS, NOW),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn test_modified_payload_is_rejected() {
        let header = sign_webhook_payload(br#"{"a":1}"#, SECRET, NOW).unwrap();

        assert_eq!(
            verify_webhook_signature(br#"{"a":2}"#, &header, SECRET, DEFAULT_TOLERANCE_SECS, NOW),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn test_stale_timestamp_is_rejected() {
        let payload = b"{}";
        let header = sign_webhook_payload(payload, SECRET, NOW - 600).unwrap();

        assert_eq!(
            verify_webhook_signature(payload, &header, SECRET, DEFAULT_TOLERANCE_SECS, NOW),
            Err(SignatureError::TimestampOutOfTolerance)
        );
    }

    #[test]
    fn test_future_timestamp_is_rejected() {
        let payload = b"{}";
        let header = sign_webhook_payload(payload, SECRET, NOW + 600).unwrap();

        assert_eq!(
            verify_webhook_signature(payload, &header, SECRET, DEFAULT_TOLERANCE_SECS, NOW),
            Err(SignatureError::TimestampOutOfTolerance)
        );
    }

    #[test]
    fn test_extreme_timestamps_are_rejected() {
        let payload = b"{}";

        for timestamp in [i64::MIN, i64::MAX] {
            let header = format!("t={timestamp},v1=00");
            assert_eq!(
                verify_webhook_signature(payload, &header, SECRET, DEFAULT_TOLERANCE_SECS, NOW),
                Err(SignatureError::TimestampOutOfTolerance)
            );
        }

        assert_eq!(
            verify_webhook_signature(payload, "t=0,v1=00", SECRET, DEFAULT_TOLERANCE_SECS, i64::MAX),
            Err(SignatureError::TimestampOutOfTolerance)
        );
    }

    #[test]
    fn test_any_v1_entry_may_match() {
        let payload = b"{}";
        let valid = sign_webhook_payload(payload, SECRET, NOW).unwrap();
        let valid_sig = valid.split("v1=").nth(1).unwrap();
        let header = format!("t={NOW},v1=deadbeef,v0=abc,v1={valid_sig}");

        assert_eq!(
            verify_webhook_signature(payload, &header, SECRET, DEFAULT_TOLERANCE_SECS, NOW),
            Ok(())
        );
    }

    #[test]
    fn test_malformed_headers() {
        let payload = b"{}";
        assert_eq!(
            verify_webhook_signature(payload, "garbage", SECRET, 300, NOW),
            Err(SignatureError::MalformedHeader)
        );
        assert_eq!(
            verify_webhook_signature(payload, "v1=abcdef", SECRET, 300, NOW),
            Err(SignatureError::MissingTimestamp)
        );
        assert_eq!(
            verify_webhook_signature(payload, "t=1700000000", SECRET, 300, NOW),
            Err(SignatureError::MissingSignature)
        );
    }

    #[test]
    fn test_subscription_event_parsing() {
        let event: WebhookEvent = serde_json::from_value(json!({
            "id": "evt_1",
            "type": "customer.subscription.created",
            "data": { "object": {
                "id": "sub_1",
                "customer": "cus_1",
                "status": "trialing",
                "metadata": { "user_id": "user-1" },
                "items": { "data": [{
                    "price": { "id": "price_monthly" },
                    "current_period_start": 1700000000,
                    "current_period_end": 1702592000
                }]},
                "trial_end": 1700604800
            }}
        }))
        .unwrap();

        let BillingEvent::SubscriptionCreated(subscription) = BillingEvent::try_from(event).unwrap()
        else {
            panic!("expected a subscription created event");
        };

        assert_eq!(subscription.user_id(), Some("user-1"));
        assert_eq!(subscription.first_price_id(), Some("price_monthly"));
        assert_eq!(
            subscription.period_start(),
            DateTime::from_timestamp(1_700_000_000, 0)
        );
        assert_eq!(
            subscription.period_end(),
            DateTime::from_timestamp(1_702_592_000, 0)
        );
        assert!(subscription.trial_end().is_some());
    }

    #[test]
    fn test_invoice_subscription_from_parent_details() {
        let invoice: ProviderInvoice = serde_json::from_value(json!({
            "id": "in_1",
            "parent": { "subscription_details": { "subscription": "sub_9" } }
        }))
        .unwrap();

        assert_eq!(invoice.subscription_id(), Some("sub_9"));
    }

    #[test]
    fn test_unknown_event_type_is_unhandled() {
        let event: WebhookEvent = serde_json::from_value(json!({
            "id": "evt_2",
            "type": "checkout.session.completed",
            "data": { "object": { "id": "cs_test" } }
        }))
        .unwrap();

        assert_eq!(
            BillingEvent::try_from(event).unwrap(),
            BillingEvent::Unhandled("checkout.session.completed".to_string())
        );
    }
}
