use log::info;
use std::sync::Arc;

use crate::error::{AppError, AppResult};
use crate::external::{GatewayStatus, PaymentGateway};
use crate::models::WebhookNotification;
use crate::services::BillingService;

/// What the handler reports back to the gateway for one notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    Processed,
    Ignored,
}

/// Gateway notification ingestion. The notification body is only a signal
/// that something changed: the current status is re-fetched from the gateway
/// by id before any transition runs, so replayed or tampered payloads cannot
/// move a record.
#[derive(Clone)]
pub struct WebhookService {
    billing_service: BillingService,
    gateway: Arc<dyn PaymentGateway>,
}

impl WebhookService {
    pub fn new(billing_service: BillingService, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self {
            billing_service,
            gateway,
        }
    }

    pub async fn handle(&self, notification: WebhookNotification) -> AppResult<WebhookOutcome> {
        if notification.notification_type != "subscription" {
            info!(
                "Ignoring {} notification {}",
                notification.notification_type, notification.data.id
            );
            return Ok(WebhookOutcome::Ignored);
        }

        if notification.data.id.is_empty() {
            return Err(AppError::ValidationError(
                "notification carries no subscription id".to_string(),
            ));
        }

        let subscription = self
            .gateway
            .get_subscription_status(&notification.data.id)
            .await?;

        if subscription.status == GatewayStatus::Unknown {
            info!(
                "Ignoring unrecognized status for subscription {}",
                subscription.id
            );
            return Ok(WebhookOutcome::Ignored);
        }

        self.billing_service
            .apply_gateway_status(&subscription.id, &subscription.status)
            .await?;

        Ok(WebhookOutcome::Processed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::SubscriptionStatus;
    use crate::error::AppError;
    use crate::models::{
        CreateSubscriptionRequest, PaymentMethodDescriptor, UserRole, WebhookNotificationData,
    };
    use crate::services::test_support::{FakeDirectory, FakeGateway, InMemoryStore, utc};
    use std::sync::atomic::Ordering;

    fn notification(notification_type: &str, id: &str) -> WebhookNotification {
        WebhookNotification {
            notification_type: notification_type.to_string(),
            data: WebhookNotificationData { id: id.to_string() },
        }
    }

    async fn subscribed_setup() -> (Arc<InMemoryStore>, Arc<FakeGateway>, WebhookService) {
        let store = Arc::new(InMemoryStore::default());
        let directory = Arc::new(FakeDirectory::default());
        let gateway = Arc::new(FakeGateway::default());
        let billing = BillingService::new(store.clone(), directory, gateway.clone());
        billing
            .subscribe_at(
                CreateSubscriptionRequest {
                    user_id: "uid-1".to_string(),
                    user_email: "uid-1@example.com".to_string(),
                    user_role: UserRole::SalesExecutive,
                    payment_method: PaymentMethodDescriptor::CreditCard {
                        token: "tok_123".to_string(),
                    },
                },
                utc(2024, 2, 1, 0, 0, 0),
            )
            .await
            .unwrap();
        let webhook = WebhookService::new(billing, gateway.clone());
        (store, gateway, webhook)
    }

    #[tokio::test]
    async fn test_non_subscription_notifications_are_ignored() {
        let (store, gateway, webhook) = subscribed_setup().await;
        let before = store.records.lock().unwrap().clone();

        let outcome = webhook
            .handle(notification("payment", "sub_1"))
            .await
            .unwrap();

        assert_eq!(outcome, WebhookOutcome::Ignored);
        assert_eq!(gateway.status_calls.load(Ordering::SeqCst), 0);
        assert_eq!(*store.records.lock().unwrap(), before);
    }

    #[tokio::test]
    async fn test_subscription_notification_refetches_and_dispatches() {
        let (store, gateway, webhook) = subscribed_setup().await;
        *gateway.reported_status.lock().unwrap() = GatewayStatus::Cancelled;

        let outcome = webhook
            .handle(notification("subscription", "sub_1"))
            .await
            .unwrap();

        assert_eq!(outcome, WebhookOutcome::Processed);
        assert_eq!(gateway.status_calls.load(Ordering::SeqCst), 1);

        let record = store.records.lock().unwrap().get("uid-1").cloned().unwrap();
        assert_eq!(record.status, SubscriptionStatus::Cancelled);
        assert!(!record.is_active);
    }

    #[tokio::test]
    async fn test_unrecognized_status_is_acknowledged_without_changes() {
        let (store, gateway, webhook) = subscribed_setup().await;
        *gateway.reported_status.lock().unwrap() = GatewayStatus::Unknown;
        let before = store.records.lock().unwrap().clone();

        let outcome = webhook
            .handle(notification("subscription", "sub_1"))
            .await
            .unwrap();

        assert_eq!(outcome, WebhookOutcome::Ignored);
        assert_eq!(*store.records.lock().unwrap(), before);
    }

    #[tokio::test]
    async fn test_empty_subscription_id_is_rejected() {
        let (_store, gateway, webhook) = subscribed_setup().await;

        let err = webhook
            .handle(notification("subscription", ""))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::ValidationError(_)));
        assert_eq!(gateway.status_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unknown_subscription_is_a_terminal_error() {
        let (store, _gateway, webhook) = subscribed_setup().await;
        let before = store.records.lock().unwrap().clone();

        let err = webhook
            .handle(notification("subscription", "sub_missing"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::SubscriptionNotFoundError(_)));
        assert_eq!(*store.records.lock().unwrap(), before);
    }
}
