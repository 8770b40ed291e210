use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::{SubscriptionStatus, payment_entity as payments};
use crate::external::{GatewayPaymentMethod, RemoteSubscription};
use crate::models::UserRole;

/// How the subscriber intends to pay. Card tokens come from the checkout
/// front-end; PIX has no token because the gateway confirms it asynchronously.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PaymentMethodDescriptor {
    CreditCard { token: String },
    Pix,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateSubscriptionRequest {
    pub user_id: String,
    pub user_email: String,
    pub user_role: UserRole,
    pub payment_method: PaymentMethodDescriptor,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateSubscriptionResponse {
    pub subscription: RemoteSubscription,
    pub payment_method: GatewayPaymentMethod,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BillingStatusResponse {
    pub user_id: String,
    pub trial_ends_at: Option<DateTime<Utc>>,
    pub subscription_ends_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub last_payment_at: Option<DateTime<Utc>>,
    pub next_payment_at: Option<DateTime<Utc>>,
    pub amount_cents: i64,
    pub status: SubscriptionStatus,
    /// Which window grants access right now; an open paid window outranks an
    /// open trial.
    pub expires_at: Option<DateTime<Utc>>,
    /// Whole days until `expires_at`, rounded up; 0 when inactive.
    pub days_left: i64,
}

impl BillingStatusResponse {
    pub fn from_record(record: payments::Model, now: DateTime<Utc>) -> Self {
        let trial_open = record.trial_ends_at.filter(|t| now < *t);
        let subscription_open = record.subscription_ends_at.filter(|t| now < *t);
        let expires_at = subscription_open.or(trial_open);
        let days_left = expires_at
            .map(|t| ((t - now).num_seconds() + 86_399) / 86_400)
            .unwrap_or(0);

        Self {
            user_id: record.user_id,
            trial_ends_at: record.trial_ends_at,
            subscription_ends_at: record.subscription_ends_at,
            is_active: record.is_active,
            last_payment_at: record.last_payment_at,
            next_payment_at: record.next_payment_at,
            amount_cents: record.amount_cents,
            status: record.status,
            expires_at,
            days_left,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn record() -> payments::Model {
        payments::Model {
            user_id: "uid-1".to_string(),
            trial_ends_at: None,
            subscription_ends_at: None,
            is_active: false,
            last_payment_at: None,
            next_payment_at: None,
            amount_cents: 1500,
            subscription_id: None,
            payment_method_id: None,
            status: SubscriptionStatus::None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_days_left_rounds_up() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let mut rec = record();
        rec.trial_ends_at = Some(now + Duration::days(2) + Duration::hours(1));

        let status = BillingStatusResponse::from_record(rec, now);
        assert_eq!(status.days_left, 3);
        assert_eq!(status.expires_at, status.trial_ends_at);
    }

    #[test]
    fn test_open_subscription_outranks_open_trial() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut rec = record();
        rec.trial_ends_at = Some(now + Duration::days(3));
        rec.subscription_ends_at = Some(now + Duration::days(20));

        let status = BillingStatusResponse::from_record(rec, now);
        assert_eq!(status.expires_at, status.subscription_ends_at);
        assert_eq!(status.days_left, 20);
    }

    #[test]
    fn test_no_open_window_means_zero_days() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut rec = record();
        rec.trial_ends_at = Some(now - Duration::days(1));

        let status = BillingStatusResponse::from_record(rec, now);
        assert_eq!(status.expires_at, None);
        assert_eq!(status.days_left, 0);
    }
}
