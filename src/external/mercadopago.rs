use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use crate::config::MercadoPagoConfig;
use crate::error::{AppError, AppResult};
use crate::external::gateway::{
    GatewayPaymentMethod, PaymentGateway, PaymentMethodType, RemoteSubscription,
};
use crate::models::Plan;

#[derive(Debug, Deserialize)]
struct CreatedPlan {
    id: String,
}

#[derive(Debug, Deserialize)]
struct CreatedCard {
    id: String,
}

/// Mercado Pago REST client. All requests are bearer-token authenticated and
/// carry a bounded timeout so a stalled gateway surfaces as
/// `GatewayUnavailableError` instead of hanging the caller.
#[derive(Clone)]
pub struct MercadoPagoService {
    client: Client,
    config: MercadoPagoConfig,
    timeout: Duration,
}

impl MercadoPagoService {
    pub fn new(config: MercadoPagoConfig) -> Self {
        let timeout = Duration::from_secs(config.request_timeout_secs);
        Self {
            client: Client::new(),
            config,
            timeout,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Timeouts and connection failures are transient; the processor may be
    /// retried.
    fn transport_error(e: reqwest::Error) -> AppError {
        AppError::GatewayUnavailableError(e.to_string())
    }

    async fn checked(response: Response) -> AppResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(rejection_for(status, body))
    }
}

/// 5xx and throttling are retryable; any other refusal is permanent for the
/// given input.
fn rejection_for(status: StatusCode, body: String) -> AppError {
    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        AppError::GatewayUnavailableError(format!("{status}: {body}"))
    } else {
        AppError::GatewayRejectedError(format!("{status}: {body}"))
    }
}

#[async_trait]
impl PaymentGateway for MercadoPagoService {
    async fn create_plan(&self, plan: &Plan) -> AppResult<String> {
        let body = json!({
            "back_url": self.config.back_url,
            "reason": plan.name,
            "auto_recurring": {
                "frequency": 1,
                "frequency_type": "months",
                "transaction_amount": plan.amount_brl(),
                "currency_id": "BRL"
            },
            "payment_methods_allowed": {
                "payment_types": [
                    { "id": "credit_card" },
                    { "id": "pix" }
                ]
            },
            "status": "active"
        });

        let response = self
            .client
            .post(self.url("/preapproval_plan"))
            .bearer_auth(&self.config.access_token)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(Self::transport_error)?;

        let created: CreatedPlan = Self::checked(response)
            .await?
            .json()
            .await
            .map_err(Self::transport_error)?;

        Ok(created.id)
    }

    async fn register_card_method(
        &self,
        card_token: &str,
        payer_email: &str,
    ) -> AppResult<GatewayPaymentMethod> {
        let body = json!({
            "token": card_token,
            "email": payer_email
        });

        let response = self
            .client
            .post(self.url("/v1/customers/cards"))
            .bearer_auth(&self.config.access_token)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(Self::transport_error)?;

        let card: CreatedCard = Self::checked(response)
            .await?
            .json()
            .await
            .map_err(Self::transport_error)?;

        Ok(GatewayPaymentMethod {
            id: card.id,
            name: "Cartão de crédito".to_string(),
            method_type: PaymentMethodType::CreditCard,
            status: "active".to_string(),
        })
    }

    async fn create_subscription(
        &self,
        plan_id: &str,
        payer_email: &str,
        payment_method_id: &str,
    ) -> AppResult<RemoteSubscription> {
        let body = json!({
            "preapproval_plan_id": plan_id,
            "payer_email": payer_email,
            "payment_method_id": payment_method_id,
            "status": "authorized",
            "auto_recurring": {
                "frequency": 1,
                "frequency_type": "months",
                "start_date": Utc::now().to_rfc3339(),
                "end_date": null
            }
        });

        let response = self
            .client
            .post(self.url("/preapproval"))
            .bearer_auth(&self.config.access_token)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(Self::transport_error)?;

        Self::checked(response)
            .await?
            .json()
            .await
            .map_err(Self::transport_error)
    }

    async fn get_subscription_status(
        &self,
        subscription_id: &str,
    ) -> AppResult<RemoteSubscription> {
        let response = self
            .client
            .get(self.url(&format!("/preapproval/{subscription_id}")))
            .bearer_auth(&self.config.access_token)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(Self::transport_error)?;

        Self::checked(response)
            .await?
            .json()
            .await
            .map_err(Self::transport_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::gateway::GatewayStatus;

    #[test]
    fn test_status_vocabulary_parses() {
        for (raw, expected) in [
            ("\"authorized\"", GatewayStatus::Authorized),
            ("\"pending\"", GatewayStatus::Pending),
            ("\"cancelled\"", GatewayStatus::Cancelled),
            ("\"expired\"", GatewayStatus::Expired),
            ("\"paused\"", GatewayStatus::Paused),
        ] {
            let parsed: GatewayStatus = serde_json::from_str(raw).unwrap();
            assert_eq!(parsed, expected);
        }
    }

    #[test]
    fn test_unknown_status_is_tolerated() {
        let parsed: GatewayStatus = serde_json::from_str("\"charged_back\"").unwrap();
        assert_eq!(parsed, GatewayStatus::Unknown);
    }

    #[test]
    fn test_remote_subscription_parses_gateway_payload() {
        let payload = r#"{
            "id": "2c938084726fca480172750000000000",
            "status": "authorized",
            "payer_email": "payer@example.com",
            "preapproval_plan_id": "p-1",
            "next_payment_date": "2024-03-02T00:00:00.000-04:00"
        }"#;
        let sub: RemoteSubscription = serde_json::from_str(payload).unwrap();
        assert_eq!(sub.id, "2c938084726fca480172750000000000");
        assert_eq!(sub.status, GatewayStatus::Authorized);
        assert_eq!(sub.payer_email.as_deref(), Some("payer@example.com"));
    }

    #[test]
    fn test_rejection_mapping() {
        assert!(matches!(
            rejection_for(StatusCode::BAD_REQUEST, "invalid card".into()),
            AppError::GatewayRejectedError(_)
        ));
        assert!(matches!(
            rejection_for(StatusCode::TOO_MANY_REQUESTS, "slow down".into()),
            AppError::GatewayUnavailableError(_)
        ));
        assert!(matches!(
            rejection_for(StatusCode::BAD_GATEWAY, "".into()),
            AppError::GatewayUnavailableError(_)
        ));
    }
}
