use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppResult;
use crate::models::Plan;

/// Subscription status as the gateway reports it. Values outside the known
/// vocabulary deserialize to `Unknown` so new gateway statuses do not break
/// notification handling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum GatewayStatus {
    Authorized,
    Pending,
    Cancelled,
    Expired,
    Paused,
    #[serde(other)]
    Unknown,
}

/// A subscription as the gateway sees it.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RemoteSubscription {
    pub id: String,
    pub status: GatewayStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payer_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_payment_date: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethodType {
    CreditCard,
    Pix,
}

/// A payment method attached to a payer: registered with the gateway for
/// cards, or synthesized locally while the gateway confirms it for PIX.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GatewayPaymentMethod {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub method_type: PaymentMethodType,
    pub status: String,
}

/// Remote payment-processor operations the billing core depends on. Every
/// call crosses the network and can fail transiently (`GatewayUnavailable`)
/// or be explicitly refused (`GatewayRejected`).
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a remote subscription plan, returning the gateway plan id.
    /// Not idempotent on the gateway side; callers reuse ids per role.
    async fn create_plan(&self, plan: &Plan) -> AppResult<String>;

    /// Register a tokenized card for the payer.
    async fn register_card_method(
        &self,
        card_token: &str,
        payer_email: &str,
    ) -> AppResult<GatewayPaymentMethod>;

    async fn create_subscription(
        &self,
        plan_id: &str,
        payer_email: &str,
        payment_method_id: &str,
    ) -> AppResult<RemoteSubscription>;

    async fn get_subscription_status(&self, subscription_id: &str)
    -> AppResult<RemoteSubscription>;
}
