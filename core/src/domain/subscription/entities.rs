use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    #[default]
    Free,
    Active,
    Trialing,
    PastDue,
    Canceled,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Free => "free",
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Trialing => "trialing",
            SubscriptionStatus::PastDue => "past_due",
            SubscriptionStatus::Canceled => "canceled",
        }
    }

    /// Maps a payment provider subscription status onto the stored status.
    pub fn from_provider_status(status: &str) -> Self {
        match status {
            "active" => SubscriptionStatus::Active,
            "trialing" => SubscriptionStatus::Trialing,
            "past_due" => SubscriptionStatus::PastDue,
            "canceled" | "unpaid" => SubscriptionStatus::Canceled,
            _ => SubscriptionStatus::Free,
        }
    }

    /// Reads a stored status. Values this service never writes (`incomplete`,
    /// hand-edited rows) are reported as `free` rather than echoed back.
    pub fn from_stored(status: &str) -> Self {
        match status {
            "active" => SubscriptionStatus::Active,
            "trialing" => SubscriptionStatus::Trialing,
            "past_due" => SubscriptionStatus::PastDue,
            "canceled" => SubscriptionStatus::Canceled,
            _ => SubscriptionStatus::Free,
        }
    }

    pub fn grants_access(&self) -> bool {
        matches!(
            self,
            SubscriptionStatus::Active | SubscriptionStatus::Trialing
        )
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionTier {
    Monthly,
    Yearly,
    Unknown,
}

impl SubscriptionTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionTier::Monthly => "monthly",
            SubscriptionTier::Yearly => "yearly",
            SubscriptionTier::Unknown => "unknown",
        }
    }

    /// Tiers a customer can ask to purchase.
    pub fn purchasable(tier: &str) -> Option<Self> {
        match tier {
            "monthly" => Some(SubscriptionTier::Monthly),
            "yearly" => Some(SubscriptionTier::Yearly),
            _ => None,
        }
    }
}

impl fmt::Display for SubscriptionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A row of the hosted `user_profiles` table. Only the columns this service
/// reads are mapped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub uid: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub stripe_customer_id: Option<String>,
    #[serde(default)]
    pub stripe_subscription_id: Option<String>,
    #[serde(default)]
    pub subscription_status: Option<String>,
    #[serde(default)]
    pub subscription_tier: Option<String>,
    #[serde(default)]
    pub subscription_start_date: Option<String>,
    #[serde(default)]
    pub subscription_end_date: Option<String>,
    #[serde(default)]
    pub trial_ends_at: Option<String>,
}

/// Partial update of a profile row.
///
/// `None` leaves the column untouched; for nullable columns `Some(None)`
/// writes `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stripe_customer_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stripe_subscription_id: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_status: Option<SubscriptionStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_tier: Option<Option<SubscriptionTier>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_start_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_end_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trial_ends_at: Option<Option<DateTime<Utc>>>,
}

impl ProfileUpdate {
    pub fn status(status: SubscriptionStatus) -> Self {
        Self {
            subscription_status: Some(status),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SubscriptionSnapshot {
    pub status: SubscriptionStatus,
    pub tier: Option<String>,
    pub trial_ends_at: Option<String>,
    pub subscription_end_date: Option<String>,
    pub has_access: bool,
}

impl SubscriptionSnapshot {
    pub fn free() -> Self {
        Self {
            status: SubscriptionStatus::Free,
            tier: None,
            trial_ends_at: None,
            subscription_end_date: None,
            has_access: false,
        }
    }

    /// Derives the access view of a profile at `now`.
    ///
    /// Access is granted for active and trialing subscriptions, and for any
    /// status while the recorded trial end lies in the future.
    pub fn from_profile(profile: UserProfile, now: DateTime<Utc>) -> Self {
        let status = profile
            .subscription_status
            .as_deref()
            .map(SubscriptionStatus::from_stored)
            .unwrap_or_default();

        let trial_active = profile
            .trial_ends_at
            .as_deref()
            .and_then(parse_timestamp)
            .is_some_and(|trial_end| now < trial_end);

        Self {
            status,
            tier: profile.subscription_tier,
            trial_ends_at: profile.trial_ends_at,
            subscription_end_date: profile.subscription_end_date,
            has_access: status.grants_access() || trial_active,
        }
    }
}

/// Parses the timestamp formats the profile store hands back. Timestamps
/// without an offset are taken as UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }

    if let Ok(parsed) = DateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f%#z") {
        return Some(parsed.with_timezone(&Utc));
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| naive.and_utc())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CheckoutSession {
    pub checkout_url: String,
    pub session_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PortalSession {
    pub portal_url: String,
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_provider_status_mapping() {
        assert_eq!(
            SubscriptionStatus::from_provider_status("active"),
            SubscriptionStatus::Active
        );
        assert_eq!(
            SubscriptionStatus::from_provider_status("unpaid"),
            SubscriptionStatus::Canceled
        );
        assert_eq!(
            SubscriptionStatus::from_provider_status("past_due"),
            SubscriptionStatus::PastDue
        );
        assert_eq!(
            SubscriptionStatus::from_provider_status("incomplete_expired"),
            SubscriptionStatus::Free
        );
    }

    #[test]
    fn test_snapshot_grants_access_for_active_status() {
        let snapshot = SubscriptionSnapshot::from_profile(
            UserProfile {
                uid: "u1".to_string(),
                subscription_status: Some("active".to_string()),
                subscription_tier: Some("yearly".to_string()),
                ..Default::default()
            },
            now(),
        );

        assert!(snapshot.has_access);
        assert_eq!(snapshot.tier.as_deref(), Some("yearly"));
    }

    #[test]
    fn test_snapshot_trial_in_future_grants_access() {
        let trial_end = (now() + Duration::days(2)).to_rfc3339();
        let snapshot = SubscriptionSnapshot::from_profile(
            UserProfile {
                uid: "u1".to_string(),
                subscription_status: Some("canceled".to_string()),
                trial_ends_at: Some(trial_end.clone()),
                ..Default::default()
            },
            now(),
        );

        assert_eq!(snapshot.status, SubscriptionStatus::Canceled);
        assert!(snapshot.has_access);
        assert_eq!(snapshot.trial_ends_at, Some(trial_end));
    }

    #[test]
    fn test_snapshot_expired_trial_denies_access() {
        let snapshot = SubscriptionSnapshot::from_profile(
            UserProfile {
                uid: "u1".to_string(),
                subscription_status: Some("past_due".to_string()),
                trial_ends_at: Some("2025-02-01T00:00:00Z".to_string()),
                ..Default::default()
            },
            now(),
        );

        assert!(!snapshot.has_access);
    }

    #[test]
    fn test_snapshot_missing_status_is_free() {
        let snapshot = SubscriptionSnapshot::from_profile(
            UserProfile {
                uid: "u1".to_string(),
                ..Default::default()
            },
            now(),
        );

        assert_eq!(snapshot, SubscriptionSnapshot::free());
    }

    #[test]
    fn test_snapshot_unknown_stored_status_is_free() {
        let snapshot = SubscriptionSnapshot::from_profile(
            UserProfile {
                uid: "u1".to_string(),
                subscription_status: Some("incomplete".to_string()),
                subscription_tier: Some("monthly".to_string()),
                ..Default::default()
            },
            now(),
        );

        assert_eq!(snapshot.status, SubscriptionStatus::Free);
        assert_eq!(snapshot.tier.as_deref(), Some("monthly"));
        assert!(!snapshot.has_access);
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2025, 3, 8, 10, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2025-03-08T10:30:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2025-03-08T10:30:00+00:00"), Some(expected));
        assert_eq!(parse_timestamp("2025-03-08T10:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2025-03-08 10:30:00+00"), Some(expected));
        assert_eq!(parse_timestamp("next tuesday"), None);
    }

    #[test]
    fn test_profile_update_serializes_nulls_only_when_cleared() {
        let update = ProfileUpdate {
            subscription_status: Some(SubscriptionStatus::Canceled),
            subscription_tier: Some(None),
            stripe_subscription_id: Some(None),
            ..Default::default()
        };

        let value = serde_json::to_value(&update).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "subscription_status": "canceled",
                "subscription_tier": null,
                "stripe_subscription_id": null,
            })
        );
    }
}
