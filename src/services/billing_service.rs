use chrono::{DateTime, Duration, Utc};
use log::info;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::entities::{SubscriptionStatus, payment_entity as payments};
use crate::error::{AppError, AppResult};
use crate::external::{GatewayPaymentMethod, GatewayStatus, PaymentGateway, PaymentMethodType};
use crate::models::{
    BillingStatusResponse, CreateSubscriptionRequest, CreateSubscriptionResponse,
    PaymentMethodDescriptor, Plan, UserRole,
};
use crate::services::{SubscriberDirectory, SubscriptionRecordStore};
use crate::utils::trial_end;

/// A paid period opened by a charge lasts this many days.
const SUBSCRIPTION_PERIOD_DAYS: i64 = 30;

/// Whether either stored window covers `now`. Absent dates never grant
/// access; the stored `is_active` flag is a cache and is not consulted.
pub fn active_at(record: &payments::Model, now: DateTime<Utc>) -> bool {
    record.trial_ends_at.is_some_and(|t| now < t)
        || record.subscription_ends_at.is_some_and(|t| now < t)
}

fn stored_status(status: &GatewayStatus) -> SubscriptionStatus {
    match status {
        GatewayStatus::Authorized => SubscriptionStatus::Authorized,
        GatewayStatus::Pending => SubscriptionStatus::Pending,
        GatewayStatus::Cancelled => SubscriptionStatus::Cancelled,
        GatewayStatus::Expired => SubscriptionStatus::Expired,
        GatewayStatus::Paused => SubscriptionStatus::Paused,
        GatewayStatus::Unknown => SubscriptionStatus::None,
    }
}

/// Subscription lifecycle: trial initialization on first status query, the
/// subscribe flow against the gateway, and the status transitions driven by
/// gateway notifications.
///
/// Records are written only after every gateway call in a transition has
/// succeeded; a failed transition leaves the store untouched.
#[derive(Clone)]
pub struct BillingService {
    store: Arc<dyn SubscriptionRecordStore>,
    directory: Arc<dyn SubscriberDirectory>,
    gateway: Arc<dyn PaymentGateway>,
    /// Remote plan ids already created, one per role. The gateway does not
    /// deduplicate plan creation itself.
    plan_ids: Arc<Mutex<HashMap<UserRole, String>>>,
}

impl BillingService {
    pub fn new(
        store: Arc<dyn SubscriptionRecordStore>,
        directory: Arc<dyn SubscriberDirectory>,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        Self {
            store,
            directory,
            gateway,
            plan_ids: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Current billing state for a subscriber. The first query for an account
    /// with no record grants the role's trial window.
    pub async fn billing_status(&self, user_id: &str) -> AppResult<BillingStatusResponse> {
        self.billing_status_at(user_id, Utc::now()).await
    }

    pub(crate) async fn billing_status_at(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> AppResult<BillingStatusResponse> {
        let record = match self.store.get(user_id).await? {
            Some(existing) => self.refresh_active_flag(existing, now).await?,
            None => self.initialize_trial(user_id, now).await?,
        };
        Ok(BillingStatusResponse::from_record(record, now))
    }

    async fn initialize_trial(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> AppResult<payments::Model> {
        let profile = self.directory.profile(user_id).await?;
        let plan = Plan::for_role(profile.role)?;
        let trial_ends_at = trial_end(profile.created_at, plan.trial_period_days);

        let record = payments::Model {
            user_id: user_id.to_string(),
            trial_ends_at: Some(trial_ends_at),
            subscription_ends_at: None,
            is_active: now < trial_ends_at,
            last_payment_at: None,
            next_payment_at: None,
            amount_cents: plan.amount_cents,
            subscription_id: None,
            payment_method_id: None,
            status: SubscriptionStatus::None,
            created_at: None,
            updated_at: None,
        };
        self.store.put(record.clone()).await?;

        info!("Granted trial until {trial_ends_at} for user {user_id}");
        Ok(record)
    }

    /// The stored flag is a cache; recompute it on every read and persist
    /// when the windows have since closed (or reopened).
    async fn refresh_active_flag(
        &self,
        mut record: payments::Model,
        now: DateTime<Utc>,
    ) -> AppResult<payments::Model> {
        let active = active_at(&record, now);
        if record.is_active != active {
            record.is_active = active;
            self.store.put(record.clone()).await?;
        }
        Ok(record)
    }

    /// Create a paid subscription for a subscriber whose trial or previous
    /// subscription has lapsed.
    pub async fn subscribe(
        &self,
        request: CreateSubscriptionRequest,
    ) -> AppResult<CreateSubscriptionResponse> {
        self.subscribe_at(request, Utc::now()).await
    }

    pub(crate) async fn subscribe_at(
        &self,
        request: CreateSubscriptionRequest,
        now: DateTime<Utc>,
    ) -> AppResult<CreateSubscriptionResponse> {
        if let Some(existing) = self.store.get(&request.user_id).await?
            && active_at(&existing, now)
        {
            return Err(AppError::AlreadySubscribedError(
                "user already has an active trial or subscription".to_string(),
            ));
        }

        let plan = Plan::for_role(request.user_role)?;
        let plan_id = self.remote_plan_id(request.user_role, &plan).await?;

        let payment_method = match &request.payment_method {
            PaymentMethodDescriptor::CreditCard { token } => {
                self.gateway
                    .register_card_method(token, &request.user_email)
                    .await?
            }
            // The PIX method only materializes on the gateway once the payer
            // transfers; a pending pseudo-method stands in until then.
            PaymentMethodDescriptor::Pix => GatewayPaymentMethod {
                id: format!("pix_{}", Uuid::new_v4().simple()),
                name: "PIX".to_string(),
                method_type: PaymentMethodType::Pix,
                status: "pending".to_string(),
            },
        };

        let subscription = self
            .gateway
            .create_subscription(&plan_id, &request.user_email, &payment_method.id)
            .await?;

        let subscription_ends_at = now + Duration::days(SUBSCRIPTION_PERIOD_DAYS);
        let record = payments::Model {
            user_id: request.user_id.clone(),
            trial_ends_at: None,
            subscription_ends_at: Some(subscription_ends_at),
            is_active: true,
            last_payment_at: Some(now),
            next_payment_at: Some(subscription_ends_at),
            amount_cents: plan.amount_cents,
            subscription_id: Some(subscription.id.clone()),
            payment_method_id: Some(payment_method.id.clone()),
            status: stored_status(&subscription.status),
            created_at: None,
            updated_at: None,
        };
        self.store.put(record).await?;

        info!(
            "Created subscription {} for user {}",
            subscription.id, request.user_id
        );
        Ok(CreateSubscriptionResponse {
            subscription,
            payment_method,
        })
    }

    async fn remote_plan_id(&self, role: UserRole, plan: &Plan) -> AppResult<String> {
        let mut ids = self.plan_ids.lock().await;
        if let Some(id) = ids.get(&role) {
            return Ok(id.clone());
        }
        let id = self.gateway.create_plan(plan).await?;
        info!("Created remote plan {id} for role {role}");
        ids.insert(role, id.clone());
        Ok(id)
    }

    /// Apply a gateway-confirmed status to the record correlated by
    /// `subscription_id`. Unknown ids fail with `SubscriptionNotFoundError`
    /// and leave the store untouched.
    pub async fn apply_gateway_status(
        &self,
        subscription_id: &str,
        status: &GatewayStatus,
    ) -> AppResult<()> {
        self.apply_gateway_status_at(subscription_id, status, Utc::now())
            .await
    }

    pub(crate) async fn apply_gateway_status_at(
        &self,
        subscription_id: &str,
        status: &GatewayStatus,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        let mut record = self.store.find_by_subscription_id(subscription_id).await?;

        match status {
            GatewayStatus::Authorized => {
                // At-least-once delivery: the gateway may notify the same
                // charge more than once. Billing is monthly, so a second
                // authorized notification on the day of the last payment is
                // a duplicate, not a new charge.
                if record.status == SubscriptionStatus::Authorized
                    && record
                        .last_payment_at
                        .is_some_and(|t| t.date_naive() == now.date_naive())
                {
                    info!(
                        "Skipping duplicate authorized notification for subscription {subscription_id}"
                    );
                    return Ok(());
                }
                let subscription_ends_at = now + Duration::days(SUBSCRIPTION_PERIOD_DAYS);
                record.subscription_ends_at = Some(subscription_ends_at);
                record.is_active = true;
                record.last_payment_at = Some(now);
                record.next_payment_at = Some(subscription_ends_at);
                record.status = SubscriptionStatus::Authorized;
            }
            GatewayStatus::Cancelled | GatewayStatus::Expired => {
                // Immediate cutoff; the remainder of an already-paid period
                // is not honored.
                record.is_active = false;
                record.status = stored_status(status);
                record.subscription_ends_at = Some(now);
            }
            GatewayStatus::Pending => {
                record.status = SubscriptionStatus::Pending;
            }
            GatewayStatus::Paused => {
                record.is_active = false;
                record.status = SubscriptionStatus::Paused;
            }
            GatewayStatus::Unknown => {
                // Tolerate gateway vocabulary additions.
                info!("Ignoring unknown gateway status for subscription {subscription_id}");
                return Ok(());
            }
        }

        self.store.put(record).await?;
        info!("Subscription {subscription_id} moved to status {status:?}");
        Ok(())
    }
}
