//! In-memory fakes for the seams the billing core depends on.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::entities::payment_entity as payments;
use crate::error::{AppError, AppResult};
use crate::external::{
    GatewayPaymentMethod, GatewayStatus, PaymentGateway, PaymentMethodType, RemoteSubscription,
};
use crate::models::{Plan, UserRole};
use crate::services::{SubscriberDirectory, SubscriberProfile, SubscriptionRecordStore};

pub(crate) fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
}

pub(crate) fn profile(user_id: &str, role: UserRole, created_at: DateTime<Utc>) -> SubscriberProfile {
    SubscriberProfile {
        user_id: user_id.to_string(),
        email: format!("{user_id}@example.com"),
        role,
        created_at,
    }
}

#[derive(Default)]
pub(crate) struct InMemoryStore {
    pub records: Mutex<HashMap<String, payments::Model>>,
}

#[async_trait]
impl SubscriptionRecordStore for InMemoryStore {
    async fn get(&self, user_id: &str) -> AppResult<Option<payments::Model>> {
        Ok(self.records.lock().unwrap().get(user_id).cloned())
    }

    async fn put(&self, record: payments::Model) -> AppResult<()> {
        self.records
            .lock()
            .unwrap()
            .insert(record.user_id.clone(), record);
        Ok(())
    }

    async fn find_by_subscription_id(
        &self,
        subscription_id: &str,
    ) -> AppResult<payments::Model> {
        self.records
            .lock()
            .unwrap()
            .values()
            .find(|r| r.subscription_id.as_deref() == Some(subscription_id))
            .cloned()
            .ok_or_else(|| AppError::SubscriptionNotFoundError(subscription_id.to_string()))
    }
}

#[derive(Default)]
pub(crate) struct FakeDirectory {
    pub profiles: HashMap<String, SubscriberProfile>,
}

impl FakeDirectory {
    pub fn single(profile: SubscriberProfile) -> Self {
        let mut profiles = HashMap::new();
        profiles.insert(profile.user_id.clone(), profile);
        Self { profiles }
    }
}

#[async_trait]
impl SubscriberDirectory for FakeDirectory {
    async fn profile(&self, user_id: &str) -> AppResult<SubscriberProfile> {
        self.profiles
            .get(user_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("user {user_id} not found")))
    }
}

/// Scripted gateway double. Subscriptions come back as `sub_<n>` in creation
/// order; `reported_status` drives what status lookups return.
pub(crate) struct FakeGateway {
    pub plan_calls: AtomicUsize,
    pub card_calls: AtomicUsize,
    pub subscription_calls: AtomicUsize,
    pub status_calls: AtomicUsize,
    pub fail_create_subscription: bool,
    pub reported_status: Mutex<GatewayStatus>,
}

impl Default for FakeGateway {
    fn default() -> Self {
        Self {
            plan_calls: AtomicUsize::new(0),
            card_calls: AtomicUsize::new(0),
            subscription_calls: AtomicUsize::new(0),
            status_calls: AtomicUsize::new(0),
            fail_create_subscription: false,
            reported_status: Mutex::new(GatewayStatus::Authorized),
        }
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_plan(&self, _plan: &Plan) -> AppResult<String> {
        let n = self.plan_calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("plan_{n}"))
    }

    async fn register_card_method(
        &self,
        _card_token: &str,
        _payer_email: &str,
    ) -> AppResult<GatewayPaymentMethod> {
        let n = self.card_calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(GatewayPaymentMethod {
            id: format!("card_{n}"),
            name: "Cartão de crédito".to_string(),
            method_type: PaymentMethodType::CreditCard,
            status: "active".to_string(),
        })
    }

    async fn create_subscription(
        &self,
        _plan_id: &str,
        payer_email: &str,
        _payment_method_id: &str,
    ) -> AppResult<RemoteSubscription> {
        if self.fail_create_subscription {
            return Err(AppError::GatewayUnavailableError(
                "connection reset".to_string(),
            ));
        }
        let n = self.subscription_calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(RemoteSubscription {
            id: format!("sub_{n}"),
            status: GatewayStatus::Authorized,
            payer_email: Some(payer_email.to_string()),
            next_payment_date: None,
        })
    }

    async fn get_subscription_status(
        &self,
        subscription_id: &str,
    ) -> AppResult<RemoteSubscription> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        Ok(RemoteSubscription {
            id: subscription_id.to_string(),
            status: self.reported_status.lock().unwrap().clone(),
            payer_email: None,
            next_payment_date: None,
        })
    }
}
