use actix_web::{HttpResponse, ResponseError, Result, web};
use log::{error, info};
use serde_json::json;

use crate::models::WebhookNotification;
use crate::services::{WebhookOutcome, WebhookService};

/// Mercado Pago pushes a notification whenever a subscription changes; the
/// service re-fetches the authoritative status before touching any record.
#[utoipa::path(
    post,
    path = "/webhook/mercadopago",
    tag = "webhook",
    request_body = WebhookNotification,
    responses(
        (status = 200, description = "Notification processed or ignored"),
        (status = 404, description = "No record matches the subscription"),
        (status = 503, description = "Status fetch from the gateway failed")
    )
)]
pub async fn mercadopago_webhook(
    webhook_service: web::Data<WebhookService>,
    notification: web::Json<WebhookNotification>,
) -> Result<HttpResponse> {
    let notification = notification.into_inner();
    info!(
        "Received gateway notification: type={} id={}",
        notification.notification_type, notification.data.id
    );

    match webhook_service.handle(notification).await {
        Ok(WebhookOutcome::Processed) => {
            Ok(HttpResponse::Ok().json(json!({"received": true})))
        }
        Ok(WebhookOutcome::Ignored) => {
            Ok(HttpResponse::Ok().json(json!({"received": true, "ignored": true})))
        }
        Err(e) => {
            error!("Failed to process gateway notification: {e}");
            Ok(e.error_response())
        }
    }
}

pub fn webhook_config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/webhook").route("/mercadopago", web::post().to(mercadopago_webhook)));
}
