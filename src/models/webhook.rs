use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Push notification from the gateway. The body only names the subscription
/// that changed; the current status is always re-fetched from the gateway.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WebhookNotification {
    #[serde(rename = "type")]
    pub notification_type: String,
    pub data: WebhookNotificationData,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WebhookNotificationData {
    pub id: String,
}
